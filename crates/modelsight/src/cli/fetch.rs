use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use modelsight_fetch::{AssetCache, FetchOptions, Progress};

use super::http_client;
use crate::config::Config;
use crate::ui::tracker::ProgressTrackerBuilder;

#[derive(Args, Clone, Debug)]
pub struct FetchArg {
    /// Decoded code text naming the model
    text: String,

    /// Always start from the first byte
    #[arg(long)]
    no_resume: bool,

    /// Extra request header, `Name: value`
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    headers: Vec<(String, String)>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected `Name: value`, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("header name is empty".into());
    }
    Ok((name.to_string(), value.trim().to_string()))
}

pub async fn fetch(arg: FetchArg, config: &Config) -> Result<()> {
    let reference = config
        .validator()
        .validate(&arg.text)
        .with_context(|| format!("`{}` does not name a model", arg.text))?;
    let cache = AssetCache::new(http_client(config)?, &config.cache_dir);

    let tracker = Arc::new(
        ProgressTrackerBuilder::default()
            .with_prefix(reference.format.extension())
            .with_finish("cached")
            .build(),
    );
    let on_progress = {
        let tracker = Arc::clone(&tracker);
        Arc::new(move |progress: &Progress| tracker.update(progress))
    };
    let options = FetchOptions::default()
        .resume(config.resume && !arg.no_resume)
        .headers(arg.headers)
        .on_progress(on_progress);

    match cache.resolve(&reference.uri, &options).await {
        Ok(path) => {
            tracker.finish();
            println!("{}", path.display());
            Ok(())
        }
        Err(e) => {
            tracker.abandon("failed");
            Err(e).with_context(|| format!("failed to fetch {}", reference.uri))
        }
    }
}
