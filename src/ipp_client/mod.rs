pub mod parse;
pub mod request;
pub mod transport;
