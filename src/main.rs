pub mod alert;
pub mod config;
pub mod controller;
pub mod emitter;
pub mod mapper;
pub mod mapping;

use crate::config::MapperConfig;
use crate::mapper::{open_platform, ControllerMapper, Initializing, MapperError};
use color_eyre::{eyre::eyre, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup()?;

    let shutdown = CancellationToken::new();
    spawn_signal_handler(shutdown.clone());

    let mapper = match initialize(shutdown) {
        Ok(mapper) => mapper,
        Err(e) => {
            alert::show_alert(&e.user_message());
            error!("Failed to initialize controller mapper: {}", e);
            return Err(eyre!("Failed to initialize controller mapper: {}", e));
        }
    };

    let stopping = mapper.start().run_until_quit().await;
    stopping.shutdown();

    info!("Controller mapper stopped");
    Ok(())
}

fn initialize(shutdown: CancellationToken) -> Result<ControllerMapper<Initializing>, MapperError> {
    let config = MapperConfig::load()?;
    info!("Using configuration: {:?}", config);

    let (sampler, emitter) = open_platform(&config, shutdown)?;
    ControllerMapper::create(sampler, emitter, &config)
}

fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown signal received, stopping after the current tick");
        shutdown.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    if let Err(e) = res {
                        error!("Unable to listen for Ctrl-C: {}", e);
                    }
                }
                _ = terminate.recv() => {}
            }
        }
        Err(e) => {
            error!("Unable to listen for SIGTERM: {}", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Unable to listen for Ctrl-C: {}", e);
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for Ctrl-C: {}", e);
    }
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
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
