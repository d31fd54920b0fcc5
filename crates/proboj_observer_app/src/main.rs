// SPDX-License-Identifier: MIT OR Apache-2.0
//! Proboj Observer - headless replay viewer for the Proboj space game
//!
//! Loads a recorded game and drives the replay engine from the terminal:
//! - Playback at a configurable speed
//! - Frame stepping and jumping
//! - Camera and selection commands
//! - Hot reload of the replay file
//!
//! ## Architecture
//!
//! A single-threaded tokio runtime runs the playback and render ticks side
//! by side. Commands arrive as text lines on stdin and the current frame is
//! summarized as a status line on stdout.

mod cli;
mod driver;
mod error;
mod status;
mod ticker;
mod watcher;

use clap::Parser;
use cli::Cli;
use driver::Observer;
use error::AppError;
use proboj_observer_replay::{ConfigError, ReplayConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Log filter used when neither `RUST_LOG` nor the config sets one
const DEFAULT_LOG_FILTER: &str = "proboj_observer=info";

fn main() {
    let cli = Cli::parse();
    let config = cli.resolve_config();

    let directive = config
        .as_ref()
        .ok()
        .and_then(|config| config.log_filter.as_deref())
        .unwrap_or(DEFAULT_LOG_FILTER);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Proboj observer v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli, config) {
        tracing::error!("Observer failed: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli, config: Result<ReplayConfig, ConfigError>) -> Result<(), AppError> {
    let config = config?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let observer = Observer::open(cli, &config)?;
    runtime.block_on(observer.run())
}
