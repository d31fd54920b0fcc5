// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command line interface.

use clap::Parser;
use proboj_observer_replay::{ConfigError, ReplayConfig};
use std::path::PathBuf;

/// Proboj space game replay observer
#[derive(Debug, Parser)]
#[command(version, about = "Replays a recorded Proboj game from the terminal")]
pub struct Cli {
    /// Replay file: a JSON array of frames, an object with a `frames` array,
    /// or one frame per line
    pub replay: PathBuf,

    /// Observer config file (RON)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Milliseconds each frame stays on screen
    #[arg(long, value_name = "MS")]
    pub speed: Option<u64>,

    /// Start playing as soon as the replay is loaded
    #[arg(long)]
    pub autoplay: bool,

    /// Reload the replay whenever the file changes
    #[arg(long)]
    pub watch: bool,

    /// Viewport size used for screen coordinates
    #[arg(long, value_name = "WxH", value_parser = parse_viewport)]
    pub viewport: Option<[u32; 2]>,
}

impl Cli {
    /// Load the config file, if any, and apply command line overrides
    pub fn resolve_config(&self) -> Result<ReplayConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ReplayConfig::load(path)?,
            None => ReplayConfig::default(),
        };

        if let Some(speed) = self.speed {
            config.playback.speed_ms = speed;
        }
        if let Some(viewport) = self.viewport {
            config.view.viewport = viewport;
        }
        Ok(config)
    }
}

fn parse_viewport(text: &str) -> Result<[u32; 2], String> {
    let (width, height) = text
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected <W>x<H>, got `{text}`"))?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| format!("invalid viewport dimension `{value}`"))
    };
    Ok([parse(width)?, parse(height)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "proboj_observer",
            "game.json",
            "--speed",
            "250",
            "--autoplay",
            "--viewport",
            "800x600",
        ])
        .unwrap();

        assert_eq!(cli.replay, PathBuf::from("game.json"));
        assert!(cli.autoplay);
        assert!(!cli.watch);

        let config = cli.resolve_config().unwrap();
        assert_eq!(config.playback.speed_ms, 250);
        assert_eq!(config.view.viewport, [800, 600]);
        assert_eq!(config.playback.tick_interval_ms, 16);
    }

    #[test]
    fn test_replay_path_is_required() {
        assert!(Cli::try_parse_from(["proboj_observer"]).is_err());
    }

    #[test]
    fn test_viewport_parsing() {
        assert_eq!(parse_viewport("1920x1080"), Ok([1920, 1080]));
        assert_eq!(parse_viewport("640X480"), Ok([640, 480]));
        assert!(parse_viewport("1920").is_err());
        assert!(parse_viewport("0x10").is_err());
        assert!(parse_viewport("wide x tall").is_err());
    }
}
