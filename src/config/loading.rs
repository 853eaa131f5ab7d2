use anyhow::{Context, Result};
use config::{Config, Environment};
use log::info;

use super::models::Settings;

pub fn load_config() -> Result<Settings> {
    // As Rust has no native support for .env files,
    // we use the dotenv_flow crate to import to actual ENV vars.
    if let Ok(dotenv_path) = dotenv_flow::dotenv_flow() {
        info!("Loaded dotenv file: {:?}", dotenv_path);
    }

    build_config(Environment::default())
}

fn build_config(environment: Environment) -> Result<Settings> {
    let config = Config::builder()
        .add_source(environment
            .prefix("CUPSPOLL")
            .separator("_")
            .prefix_separator("_")
            .try_parsing(true)
            .with_list_parse_key("cups.printqueues")
            .list_separator(","))
        .set_default("cups.uri", "")?
        .set_default("cups.encryption", "ifrequested")?
        .set_default("cups.blocking", false)?
        .set_default("cups.ignoretlserrors", false)?
        .set_default("cups.username", "")?
        .set_default("cups.password", "")?
        .set_default("cups.printqueues", Vec::<String>::new())?
        .set_default("poll.schedule", "10s")?
        .set_default("poll.failurewait", "30s")?
        .build()
        .context("Could not read configuration")?;

    config.try_deserialize().context("Invalid configuration")
}
