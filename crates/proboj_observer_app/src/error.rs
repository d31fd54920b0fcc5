// SPDX-License-Identifier: MIT OR Apache-2.0
//! Observer application errors.

use proboj_observer_replay::{ConfigError, ReplayError};
use thiserror::Error;

/// Errors that stop the observer
#[derive(Debug, Error)]
pub enum AppError {
    /// The replay file could not be loaded
    #[error(transparent)]
    Replay(#[from] ReplayError),

    /// The config file could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The replay file could not be watched
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Runtime or terminal I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
