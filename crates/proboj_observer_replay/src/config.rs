// SPDX-License-Identifier: MIT OR Apache-2.0
//! Observer configuration stored as RON.

use crate::camera::Camera;
use crate::playback::PlaybackScheduler;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors while reading or writing a config file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON for this config
    #[error("Invalid config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Config could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] ron::Error),
}

/// Playback timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Milliseconds each frame stays on screen
    pub speed_ms: u64,
    /// Scheduler tick period in milliseconds
    pub tick_interval_ms: u64,
    /// Frames skipped while recovering during playback
    pub max_skip_attempts: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed_ms: 1000,
            tick_interval_ms: 16,
            max_skip_attempts: 10,
        }
    }
}

impl PlaybackConfig {
    /// Frame duration
    pub fn speed(&self) -> Duration {
        Duration::from_millis(self.speed_ms)
    }

    /// Tick period, at least one millisecond
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// View settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Viewport width and height in pixels
    pub viewport: [u32; 2],
    /// Render tick period in milliseconds
    pub render_interval_ms: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            viewport: [1280, 720],
            render_interval_ms: 16,
        }
    }
}

impl ViewConfig {
    /// Render tick period, at least one millisecond
    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms.max(1))
    }
}

/// Observer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Playback timing
    pub playback: PlaybackConfig,
    /// View settings
    pub view: ViewConfig,
    /// How long an error banner stays up, in milliseconds
    pub error_display_ms: u64,
    /// Log filter directive, e.g. `proboj_observer=debug`
    pub log_filter: Option<String>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            view: ViewConfig::default(),
            error_display_ms: 5000,
            log_filter: None,
        }
    }
}

impl ReplayConfig {
    /// Load a config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = ron::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save the config file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// How long an error banner stays up
    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }

    /// Build a camera for the configured viewport
    pub fn camera(&self) -> Camera {
        let [width, height] = self.view.viewport;
        Camera::new(f64::from(width), f64::from(height))
    }

    /// Apply the playback section to a scheduler
    pub fn configure_scheduler(&self, scheduler: &mut PlaybackScheduler) {
        scheduler.set_tick_interval(self.playback.tick_interval());
        scheduler.set_max_skip_attempts(self.playback.max_skip_attempts);
        scheduler.set_initial_speed(self.playback.speed());
    }
}
