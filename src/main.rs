use anyhow::{Context, Result};
use clap::Parser;
use secrecy::SecretString;
use tracing::{error, info, warn};
use unraid_exporter::{config::Config, server};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Unraid host (overrides config)
    #[arg(long, env = "UNRAID_HOST")]
    unraid_host: Option<String>,

    /// Unraid root password (overrides config)
    #[arg(long, env = "UNRAID_PASSWORD", hide_env_values = true)]
    unraid_password: Option<String>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "EXPORTER_PORT", default_value = "9100")]
    port: u16,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR", default_value = "0.0.0.0")]
    addr: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;

    // Override with CLI arguments if provided
    if let Some(host) = args.unraid_host {
        config.unraid.host = host;
    }
    if let Some(password) = args.unraid_password {
        config.unraid.password = SecretString::from(password);
    }
    config.server.port = args.port;
    config.server.addr = args.addr;

    // Initialize tracing
    let logging = config
        .logging
        .setup()
        .context("Failed to initialize logging")?;

    info!(
        "Starting Unraid Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    config.validate().context("Invalid configuration")?;

    info!("Configuration loaded successfully");
    info!("Unraid host: {}@{}:{}", config.unraid.username, config.unraid.host, config.unraid.port);
    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    // Start the metrics server
    let result = server::start(config).await;

    if let Err(e) = logging.restore() {
        warn!("Failed to restore logging configuration: {}", e);
    }

    if let Err(e) = result {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
