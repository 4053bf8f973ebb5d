use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use super::current::CurrentArg;
use super::fetch::FetchArg;
use super::session::SessionArg;
use super::validate::ValidateArg;

#[derive(Clone, Debug, Parser)]
#[command(name = "modelsight", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Configuration file [default: ./modelsight.toml]
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output; repeat for more. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "v", name = "validate", about = "Check whether scanned text names a 3D model")]
    Validate(ValidateArg),
    #[command(alias = "f", name = "fetch", about = "Resolve a model into the local cache")]
    Fetch(FetchArg),
    #[command(alias = "s", name = "session", about = "Run scans through a full headless session")]
    Session(SessionArg),
    #[command(name = "current", about = "Show or clear the persisted current model")]
    Current(CurrentArg),
    #[command(alias = "cfg", name = "config", about = "Print the effective configuration")]
    Config,
}
