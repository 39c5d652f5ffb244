use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use relayer_config::{config_path, Environment, RelayerConfig};
use relayer_robin::{RobinOptions, RoundRobin};
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod dispatcher;
mod executor;
include!(concat!(env!("OUT_DIR"), "/version.rs"));

#[derive(Parser, Debug)]
#[command(term_width = 0)]
#[command(name = "Relayer")]
#[command(version = APP_VERSION)]
#[command(about = "Rotates relays across signers by priority round-robin", long_about = None)]
struct AppArgs {
    /// Config file, defaults to $RELAYER_CONFIG_FILE or ./relayer.yml
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    log_level: Option<String>,

    #[arg(long)]
    environment: Option<String>,

    /// Stop after this many rounds
    #[arg(long)]
    rounds: Option<u64>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = AppArgs::parse();

    let mut config = RelayerConfig::load(&config_path(args.config))?;
    if let Some(level) = args.log_level {
        config.log_level = level;
    }
    if let Some(environment) = args.environment {
        config.environment = environment.parse::<Environment>()?;
    }

    init_tracing(&config.log_level);
    info!(
        version = APP_VERSION,
        environment = %config.environment,
        "starting relayer"
    );

    if let Some(addr) = args.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .map_err(|e| eyre::eyre!("Unable to start metrics exporter on {addr}: {e}"))?;
        info!(%addr, "serving metrics");
    }

    let (ack, advance) = mpsc::channel(config.robin.advance_buffer);
    let robin = Arc::new(RoundRobin::with_options(
        advance,
        config.participants(),
        RobinOptions {
            seed: config.robin.seed,
        },
    )?);
    robin.start();

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received shutdown signal");
                signal.cancel();
            }
            Err(err) => error!("Unable to listen for shutdown signal: {err}"),
        }
    });

    let mut dispatcher =
        dispatcher::Dispatcher::new(robin.clone(), ack, executor::LogExecutor, config.runner);
    let result = dispatcher.run(shutdown, args.rounds).await;

    robin.stop();

    let dispatched = result?;
    info!(dispatched, round = robin.round(), "relayer stopped");

    Ok(())
}
