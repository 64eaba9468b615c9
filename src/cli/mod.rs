//! CLI commands and argument parsing

use crate::config::Overrides;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// gitpin - Pin a working directory to an exact git revision
#[derive(Parser, Debug)]
#[command(name = "gitpin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Sync definition file (YAML, or JSON by extension)
    #[arg(short, long, global = true, env = "GITPIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clone a branch and reconcile it to an exact revision
    Sync(SyncArgs),

    /// Load the trusted CA bundle and report what was found
    Trust {
        /// PEM bundle of trusted CA certificates
        #[arg(long, env = "GITPIN_CA_BUNDLE")]
        ca_bundle: Option<PathBuf>,
    },
}

/// Arguments for `gitpin sync`
#[derive(Args, Debug, Default)]
pub struct SyncArgs {
    /// Repository URL (https, http, file or local path)
    #[arg(env = "GITPIN_URL")]
    pub url: Option<String>,

    /// Branch to clone
    #[arg(env = "GITPIN_BRANCH")]
    pub branch: Option<String>,

    /// Full revision hash to pin the working directory to
    #[arg(env = "GITPIN_REVISION")]
    pub revision: Option<String>,

    /// Working directory
    #[arg(short = 'd', long = "dir", env = "GITPIN_DIR")]
    pub working_dir: Option<PathBuf>,

    /// Transfer timeout in seconds
    #[arg(long, env = "GITPIN_TIMEOUT")]
    pub timeout: Option<u64>,

    /// PEM bundle of trusted CA certificates
    #[arg(long, env = "GITPIN_CA_BUNDLE")]
    pub ca_bundle: Option<PathBuf>,

    /// Replace unrelated content in the working directory
    #[arg(long)]
    pub force: bool,

    /// Print the sync report as JSON
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    /// Values that take precedence over the config file
    pub fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            branch: self.branch.clone(),
            revision: self.revision.clone(),
            working_dir: self.working_dir.clone(),
            timeout_secs: self.timeout,
            ca_bundle: self.ca_bundle.clone(),
            replace_existing: self.force,
        }
    }
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
