use std::path::PathBuf;

use cellmon::config::{Config, Mode};
use cellmon::estimator::{KalmanFilter, RuntimeEstimator};
use cellmon::http;
use cellmon::mqtt::{PublishSession, RumqttcTransport};
use cellmon::pipeline::Orchestrator;
use cellmon::sim::{self, SyntheticSource};
use color_eyre::Result;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path)?;
    info!(mode = ?config.mode, broker = %config.broker.host, "starting cellmon");

    let transport = RumqttcTransport::new(config.broker.clone());
    let session = PublishSession::new(transport, config.broker.clone());

    match config.mode {
        Mode::Simulate => {
            sim::run_simulation(session, config.pipeline.publish_interval()).await;
        }
        Mode::Serve => {
            let (trigger_tx, trigger_rx) = mpsc::channel(100);

            // failing to bind is fatal; everything past this point retries
            let listener = TcpListener::bind(&config.http.bind_addr).await?;
            tokio::spawn(async move {
                if let Err(err) = http::serve(listener, trigger_tx).await {
                    error!("http server stopped: {err}");
                }
            });

            let mut orchestrator = Orchestrator::new(
                session,
                KalmanFilter::new(config.filter),
                RuntimeEstimator::new(config.runtime),
                SyntheticSource::new(),
                config.pipeline.clone(),
                trigger_rx,
            );
            orchestrator.run().await;
        }
    }

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
