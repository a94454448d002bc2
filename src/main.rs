//! Worktrack CLI - standalone session tracking server

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worktrack::{config::expand_path, Config, Core};

#[derive(Parser, Debug)]
#[command(name = "worktrack")]
#[command(author = "Worktrack Team")]
#[command(version)]
#[command(about = "Worktrack - work session tracker with categorized summaries", long_about = None)]
struct Args {
    /// Path to configuration file (default: ~/.worktrack/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override server host
    #[arg(long)]
    host: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initialize a new config file with defaults
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("worktrack={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = args
        .config
        .as_deref()
        .map(expand_path)
        .unwrap_or_else(Config::default_path);

    // Handle --init flag
    if args.init {
        if config_path.exists() {
            tracing::warn!("Config file already exists: {}", config_path.display());
            return Ok(());
        }
        Config::create_default(&config_path)?;
        tracing::info!("Created default config at: {}", config_path.display());
        return Ok(());
    }

    // Load configuration
    let mut config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        tracing::warn!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
        Config::default()
    };

    config.apply_env_overrides();
    for name in Config::active_env_overrides() {
        tracing::debug!("Environment override active: {}", name);
    }

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    let core = Core::new(config)?;
    core.start_api_server().await?;

    Ok(())
}
