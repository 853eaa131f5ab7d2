pub mod connection;
pub mod enumerator;
pub mod error;
pub mod models;
pub mod printer;
pub mod transport;

#[cfg(test)]
mod mock;
