pub mod app;
pub mod current;
pub mod fetch;
pub mod session;
pub mod validate;

use std::time::Duration;

use anyhow::{Context, Result};
use modelsight_fetch::ReqwestClient;

use crate::config::Config;
use app::Commands;

pub async fn run(cmd: Commands, config: &Config) -> Result<()> {
    match cmd {
        Commands::Validate(arg) => validate::validate(arg, config),
        Commands::Fetch(arg) => fetch::fetch(arg, config).await,
        Commands::Session(arg) => session::session(arg, config).await,
        Commands::Current(arg) => current::current(arg, config),
        Commands::Config => {
            let rendered = toml::to_string_pretty(config).context("failed to render configuration")?;
            print!("{rendered}");
            Ok(())
        }
    }
}

fn http_client(config: &Config) -> Result<ReqwestClient> {
    ReqwestClient::with_timeouts(
        Duration::from_secs(config.connect_timeout_secs),
        Duration::from_secs(config.read_timeout_secs),
    )
    .context("failed to build HTTP client")
}
