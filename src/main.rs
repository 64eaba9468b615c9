//! gitpin - Pin a working directory to an exact git revision
//!
//! CLI front end: resolves the sync definition, builds the transfer client
//! and runs one synchronization.

use gitpin::{
    Error, Git2Transport, Result, SyncError, Synchronizer,
    cli::{Cli, Commands, SyncArgs},
    config::{self, SyncFile},
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Exit status after Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Set up logging
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    let result = match cli.command {
        Commands::Sync(args) => cmd_sync(cli.config, args).await,
        Commands::Trust { ca_bundle } => cmd_trust(ca_bundle),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            report_failure(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn cmd_sync(config_path: Option<PathBuf>, args: SyncArgs) -> Result<ExitCode> {
    let file = match config_path {
        Some(path) => SyncFile::load(&path)?,
        None => SyncFile::load_default()?,
    };
    let resolved = file.resolve(args.overrides())?;

    let client = resolved.transfer_client()?;
    info!(
        "Using {} trusted certificates from {:?}",
        client.trust().len(),
        client.trust().bundle_path()
    );

    let synchronizer = Synchronizer::new(Git2Transport::new(client));
    let request = resolved.request;
    let task = tokio::task::spawn_blocking(move || synchronizer.sync(&request));

    let report = tokio::select! {
        joined = task => joined.map_err(std::io::Error::other)??,
        _ = tokio::signal::ctrl_c() => {
            // Runtime shutdown waits on blocking tasks; the clone cannot be cancelled.
            warn!("Interrupted; working directory may hold a partial clone");
            std::process::exit(i32::from(EXIT_INTERRUPTED));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Synced {}", report.summarize());
        println!("  Working directory: {:?}", report.working_dir);
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_trust(ca_bundle: Option<PathBuf>) -> Result<ExitCode> {
    let store = config::load_trust_store(ca_bundle.as_deref())?;

    println!("CA bundle: {:?}", store.bundle_path());
    println!("  {} certificate(s)", store.len());

    Ok(ExitCode::SUCCESS)
}

/// Print the diagnostic for a fatal error
fn report_failure(err: &Error) {
    match err {
        Error::Sync(SyncError::ServerTimeout { source, .. }) => {
            eprintln!("Failed to clone because of a timeout from Git server: {}!", source);
        }
        Error::Sync(SyncError::Transfer { source, .. }) => {
            eprintln!("Failed to clone: {}!", source);
        }
        other => eprintln!("{}!", other),
    }
}
