//! docparse server binary
//!
//! Run with: cargo run -p docparse --bin docparse-server -- --port 8000

use clap::Parser;
use docparse::{config::DocParseConfig, server::ParseServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "docparse-server", version, about = "Document parsing HTTP service")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides config and DOCPARSE_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config and DOCPARSE_PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory for scratch files (overrides config and DOCPARSE_SCRATCH_DIR)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docparse=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DocParseConfig::from_file(path)?,
        None => DocParseConfig::default(),
    };
    config.apply_env_overrides();

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = args.scratch_dir {
        config.scratch.dir = Some(dir);
    }
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Max upload size: {} bytes", config.server.max_upload_size);
    tracing::info!("  - CORS: {}", if config.server.enable_cors { "any origin" } else { "off" });
    tracing::info!(
        "  - Scratch: {}",
        config.scratch.resolved_dir().display()
    );

    let server = ParseServer::new(config)?;
    tracing::info!("Health: http://{}/health", server.address());

    server.start().await?;

    Ok(())
}
