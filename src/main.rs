//! # Secret Generator Controller
//!
//! Hosts the process-wide generator runtime: the GC scheduler, the generator
//! registry, and the metrics/probe server that reconcilers run alongside.
//!
//! ## Configuration
//!
//! - `--generator-gc-grace-period` / `GENERATOR_GC_GRACE_PERIOD` - how long a
//!   superseded artifact waits before cleanup is attempted (default `2m`)
//! - `METRICS_PORT` - metrics and probe port (default 5000)
//! - `LOG_FORMAT` - `json` or `text`; `RUST_LOG` overrides `LOG_LEVEL`

use anyhow::{Context, Result};
use clap::Parser;
use secret_generator_controller::config::ControllerConfig;
use secret_generator_controller::constants::ENV_GENERATOR_GC_GRACE_PERIOD;
use secret_generator_controller::runtime::initialization::initialize;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "secret-generator-controller", version, about)]
struct Cli {
    /// Grace period before a flagged generator artifact is cleaned up (e.g. "2m", "90s")
    #[arg(long, env = ENV_GENERATOR_GC_GRACE_PERIOD)]
    generator_gc_grace_period: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ControllerConfig::from_env().context("Failed to load configuration")?;
    if let Some(raw) = cli.generator_gc_grace_period.as_deref() {
        config = config.with_grace_period(raw)?;
    }

    init_tracing(&config);

    info!(
        "Starting Secret Generator Controller (build {}, {})",
        env!("BUILD_GIT_HASH"),
        env!("BUILD_DATETIME")
    );
    info!(
        "Generator GC grace period: {}s",
        config.generator_gc_grace_period.as_secs()
    );

    let initialized = initialize(&config).await?;
    info!("{:?}", initialized);

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Controller stopped");
    Ok(())
}

fn init_tracing(config: &ControllerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "secret_generator_controller={}",
            config.log_level.to_lowercase()
        )
        .into()
    });

    if config.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
