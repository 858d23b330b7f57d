//! `parcelmon`: polls the CarLo WebAPI for parcel deliveries and serves
//! them over a small JSON API plus an embedded dashboard.
//!
//! Entry point: CLI argument parsing, tracing setup, configuration, then the
//! HTTP server. The monitor's first refresh runs in the background, so the
//! server answers (with 500s) before it completes.

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use parcelmon::{AppState, serve, start_and_install};
use parcelmon_core::DeliveryMonitor;

/// Parcel-tracking dashboard for a CarLo installation.
#[derive(Debug, Parser)]
#[command(name = "parcelmon", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, short = 'c', env = "PARCELMON_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, e.g. 127.0.0.1:8123 (overrides config)
    #[arg(long, short = 'l')]
    listen: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Print the effective configuration (secrets masked) and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let mut config = parcelmon_config::load_config(cli.config.as_deref())
        .wrap_err("failed to load configuration")?;
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }

    if cli.print_config {
        print!("{}", config.to_toml_redacted()?);
        return Ok(());
    }

    let monitor_config = config.to_monitor_config()?;
    let addr = config.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;

    // Client construction fails fast; only the initial fetch runs in the
    // background.
    let monitor = DeliveryMonitor::new(monitor_config)?;
    let state = AppState::new();
    let init = tokio::spawn(start_and_install(monitor.clone(), state.clone()));

    serve(listener, state).await.wrap_err("server error")?;

    init.abort();
    monitor.shutdown().await;
    info!("stopped");
    Ok(())
}

fn init_tracing(verbosity: u8, json: bool) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
