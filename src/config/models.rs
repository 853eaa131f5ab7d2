use std::time::Duration;

use serde_derive::Deserialize;

use crate::cups_client::transport::HttpEncryption;

use super::schedule::TimeSchedule;

// When changing anything here, make sure to add
// #[serde(alias = "ihavenounderscores")]
// where needed, so it can be read from the ENV vars.

#[derive(Debug, Deserialize)]
pub struct Cups {
    /// Print server URL, empty to use the system default server.
    pub uri: String,
    pub encryption: HttpEncryption,
    pub blocking: bool,
    #[serde(alias = "ignoretlserrors")]
    pub ignore_tls_errors: bool,
    pub username: String,
    pub password: String,
    #[serde(alias = "printqueues")]
    pub print_queues: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Poll {
    pub schedule: TimeSchedule,
    #[serde(alias = "failurewait", with = "humantime_serde")]
    pub failure_wait: Duration,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub cups: Cups,
    pub poll: Poll,
}
