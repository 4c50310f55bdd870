use clap::Parser;
use login_gateway::{config::Config, start_server_with_config, telemetry};
use std::path::PathBuf;
use tracing::{error, info};

/// OAuth2 login gateway
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration (e.g. ":8080")
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    telemetry::init_tracing(&config.logging);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    // Ctrl-C starts a graceful shutdown; the server future drains and returns
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested, stopping server...");
            let _ = shutdown_tx.send(());
        }
    });

    let result = start_server_with_config(config, shutdown_rx).await;
    if let Err(e) = &result {
        error!("server error: {}", e);
    }
    result
}
