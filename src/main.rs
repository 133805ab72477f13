use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use compliance_results::client::HttpComplianceClient;
use compliance_results::commands;
use compliance_results::config::{Config, LoggingConfig};

#[derive(Parser)]
#[command(
    name = "compliance",
    about = "Inspect the status and results of remote compliance test runs",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the compliance service
    #[arg(long, global = true, env = "COMPLIANCE_ENDPOINT")]
    endpoint: Option<String>,

    /// Namespace the compliance run was started in
    #[arg(long, global = true)]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shows the results of compliance tests
    #[command(after_help = "Example:\n  # Show the compliance results\n  compliance results")]
    Results,

    /// Shows the status of the compliance run
    #[command(after_help = "Example:\n  # Show the compliance status\n  compliance status")]
    Status,
}

fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

/// Resolve the config with a stderr subscriber in scope, so fallback
/// warnings are visible before the configured logger exists.
fn resolve_config(explicit: Option<&std::path::Path>) -> Result<Config> {
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&LoggingConfig::default().level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::with_default(bootstrap, || Config::resolve(explicit))
}

fn init_tracing(logging: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&logging.level))
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config =
        resolve_config(cli.config.as_deref())?.with_overrides(cli.endpoint, cli.namespace);
    init_tracing(&config.logging);

    let client = HttpComplianceClient::new(&config.server)
        .context("could not create the compliance client")?;
    let namespace = config.server.namespace.as_str();
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Results => {
            tracing::info!(
                %namespace,
                endpoint = %config.server.endpoint,
                "Fetching compliance results"
            );
            commands::results::run(&client, namespace, &mut out).await?;
        }
        Commands::Status => {
            tracing::info!(
                %namespace,
                endpoint = %config.server.endpoint,
                "Fetching compliance status"
            );
            commands::status::run(&client, namespace, &mut out).await?;
        }
    }

    Ok(())
}
