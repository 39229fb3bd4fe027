//! activation: operator console for the single-active question rule
//!
//! Talks to the content API through the HTTP store client and reports every
//! partial failure instead of claiming success. Exit codes:
//! - 0: everything applied
//! - 1: the command could not run (bad config, unknown id, store offline)
//! - 2: the command ran but some calls failed or a violation remains

mod cli;
mod config;

use std::path::PathBuf;

use activation_client::StoreClient;
use activation_core::{Coordinator, RetryingStore};
use clap::Parser;
use tracing::{debug, error, info};

use cli::{execute_command, Commands};
use config::Config;

#[derive(Parser)]
#[command(name = "activation")]
#[command(about = "Keep at most one question active across the content API")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "activation.toml")]
    config: PathBuf,

    /// Base URL of the content API (overrides config file)
    #[arg(long, env = "ACTIVATION_BASE_URL")]
    base_url: Option<String>,

    /// Bearer token (overrides config file)
    #[arg(long, env = "ACTIVATION_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Collection path (overrides config file)
    #[arg(long, env = "ACTIVATION_COLLECTION")]
    collection: Option<String>,

    /// Fan-out deadline in milliseconds, 0 to wait for every call
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Payload field shown as the entity label
    #[arg(long, default_value = "question")]
    label_field: String,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "activation=debug" } else { "activation=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.parse()?)
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::load(&cli.config)?;

    // Apply CLI overrides
    if let Some(base_url) = cli.base_url {
        config.store.base_url = base_url;
    }
    if let Some(api_key) = cli.api_key {
        config.store.api_key = Some(api_key);
    }
    if let Some(collection) = cli.collection {
        config.store.collection = collection;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.coordinator.fan_out_timeout_ms = timeout_ms;
    }

    info!(
        base_url = %config.store.base_url,
        collection = %config.store.collection,
        "Using content API"
    );
    debug!(?config.coordinator, ?config.retry, "Coordinator settings");

    let client = StoreClient::new(config.store.clone())?;
    let store = RetryingStore::new(client, config.retry.clone());
    let coordinator = Coordinator::with_config(store, config.coordinator.clone());

    match execute_command(&coordinator, cli.command, &cli.label_field).await {
        Ok(output) => {
            print!("{}", output.text);
            if !output.clean {
                std::process::exit(2);
            }
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
