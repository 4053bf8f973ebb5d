use anyhow::{Context, Result};
use clap::Args;
use modelsight_session::{JsonFileStore, SessionPersistence};

use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct CurrentArg {
    /// Forget the current model
    #[arg(long)]
    clear: bool,

    /// Store the marker image URI used in marker mode
    #[arg(long, value_name = "URI", conflicts_with = "clear")]
    marker: Option<String>,
}

pub fn current(arg: CurrentArg, config: &Config) -> Result<()> {
    let persistence = SessionPersistence::new(JsonFileStore::new(&config.store_path));
    if arg.clear {
        persistence
            .clear()
            .with_context(|| format!("failed to clear {}", config.store_path.display()))?;
        println!("cleared");
        return Ok(());
    }
    if let Some(uri) = arg.marker {
        persistence
            .save_marker_image(&uri)
            .with_context(|| format!("failed to update {}", config.store_path.display()))?;
        println!("marker\t{uri}");
        return Ok(());
    }

    let metadata = persistence
        .current_metadata()
        .with_context(|| format!("failed to read {}", config.store_path.display()))?;
    match metadata {
        Some(metadata) => println!("{}", serde_json::to_string_pretty(&metadata)?),
        None => println!("no current model"),
    }
    if let Some(uri) = persistence.marker_image()? {
        println!("marker\t{uri}");
    }
    Ok(())
}
