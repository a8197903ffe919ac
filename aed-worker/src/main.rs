//! Audio event worker (aed-worker) - Main entry point
//!
//! Speaks newline-delimited JSON on stdin/stdout. Diagnostics go to stderr.

use std::path::PathBuf;

use aed_common::config::{resolve_model_dir, TomlConfig, CONFIG_PATH_ENV, MODEL_DIR_ENV};
use aed_worker::model::DirectoryModelProvider;
use aed_worker::worker;
use aed_worker::LoudnessGate;
use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for aed-worker
#[derive(Parser, Debug)]
#[command(name = "aed-worker")]
#[command(about = "Audio event classification worker")]
#[command(version)]
struct Args {
    /// Directory holding the classifier artifact
    #[arg(env = MODEL_DIR_ENV)]
    model_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Analysis sample rate in Hz (overrides the config file)
    #[arg(long)]
    sample_rate: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing before anything logs; stdout is reserved for records
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut stdout = tokio::io::stdout();

    let config = match TomlConfig::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            worker::report_startup_failure(
                &mut stdout,
                format!("Failed to load configuration: {}", e),
            )
            .await
            .context("Failed to write startup error")?;
            return Ok(());
        }
    };

    // RUST_LOG wins over the config file
    if !from_env {
        match EnvFilter::try_new(&config.logging.level) {
            Ok(level) => {
                if let Err(e) = filter_handle.reload(level) {
                    warn!("Could not apply log level from config: {}", e);
                }
            }
            Err(e) => warn!(
                "Ignoring invalid log level {:?}: {}",
                config.logging.level, e
            ),
        }
    }

    let sample_rate = args.sample_rate.unwrap_or(config.audio.sample_rate);
    if sample_rate == 0 {
        worker::report_startup_failure(
            &mut stdout,
            "Failed to load configuration: --sample-rate must be positive".to_string(),
        )
        .await
        .context("Failed to write startup error")?;
        return Ok(());
    }

    let model_dir = match resolve_model_dir(args.model_dir.as_deref(), &config) {
        Ok(dir) => dir,
        Err(e) => {
            worker::report_startup_failure(
                &mut stdout,
                format!("Failed to resolve model directory: {}", e),
            )
            .await
            .context("Failed to write startup error")?;
            return Ok(());
        }
    };
    info!("Model directory: {}", model_dir.display());

    let provider = DirectoryModelProvider::new(&model_dir);
    let gate = LoudnessGate::from_settings(&config.gate);
    let pipeline = match worker::start(&provider, gate, sample_rate, &mut stdout)
        .await
        .context("Failed to write startup record")?
    {
        Some(pipeline) => pipeline,
        None => return Ok(()),
    };

    let stdin = BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = worker::run(pipeline, stdin, stdout) => {
            match result {
                Ok(stats) => info!(requests = stats.requests, "Worker shutdown complete"),
                Err(e) => warn!("Request loop ended: {}", e),
            }
        }
        _ = shutdown_signal() => {
            info!("Worker shutdown complete");
        }
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
