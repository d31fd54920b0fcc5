// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the replay engine.

use crate::loader::LoadError;
use thiserror::Error;

/// Replay engine errors
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Playback could not find a valid frame within its skip budget
    #[error(
        "Timeline corrupted: no valid frame within {attempts} skips after frame {from}. Please reload the game data."
    )]
    DataCorruption {
        /// Frame index playback was advancing from
        from: usize,
        /// Skip budget exhausted past the first corrupted frame
        attempts: usize,
    },

    /// Replay data could not be parsed
    #[error("Load error: {0}")]
    Load(#[from] LoadError),
}

/// Result type for replay operations
pub type Result<T> = std::result::Result<T, ReplayError>;
