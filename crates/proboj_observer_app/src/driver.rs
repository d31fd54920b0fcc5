// SPDX-License-Identifier: MIT OR Apache-2.0
//! Observer event loop.
//!
//! A current-thread tokio runtime interleaves the playback interval (alive
//! only while the scheduler holds the tick gate open), the render interval,
//! command lines from stdin and replay file changes.

use crate::cli::Cli;
use crate::error::AppError;
use crate::status::format_status;
use crate::ticker::TickGate;
use crate::watcher::{ReplayFileEvent, ReplayWatcher};
use proboj_observer_replay::{ReplayCommand, ReplayConfig, ReplayEngine, ReplayEvent, ReplayError};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{Instant, Interval, MissedTickBehavior};

const HELP: &str = "commands: play, pause, toggle, next, prev, first, last, frame <i>, \
speed <ms>, pan <dx> <dy>, zoom in|out, wheel <dy>, select <x> <y>, deselect, reset, \
focus <player>, resize <w> <h>, status, reload, help, quit";

/// What to do after a command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineAction {
    Continue,
    Quit,
}

/// Headless observer: owns the engine and everything feeding it
#[derive(Debug)]
pub struct Observer {
    engine: ReplayEngine,
    gate: TickGate,
    replay_path: PathBuf,
    watcher: Option<ReplayWatcher>,
    render_interval: Duration,
    last_status: Option<String>,
}

impl Observer {
    /// Load the replay named on the command line and prepare the engine
    pub fn open(cli: &Cli, config: &ReplayConfig) -> Result<Self, AppError> {
        let gate = TickGate::new();
        let engine = ReplayEngine::with_tick_source(config, Box::new(gate.clone()));
        let watcher = if cli.watch {
            Some(ReplayWatcher::new(&cli.replay)?)
        } else {
            None
        };

        let mut observer = Self {
            engine,
            gate,
            replay_path: cli.replay.clone(),
            watcher,
            render_interval: config.view.render_interval(),
            last_status: None,
        };
        observer.reload()?;

        if cli.autoplay {
            observer.engine.apply(ReplayCommand::Play);
        }
        Ok(observer)
    }

    /// Replace the frame sequence with the file's current contents
    fn reload(&mut self) -> Result<(), ReplayError> {
        self.engine.load_file(&self.replay_path)?;
        Ok(())
    }

    /// Run until `quit`, or until stdin closes with nothing left to do
    pub async fn run(mut self) -> Result<(), AppError> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        let mut render = tokio::time::interval(self.render_interval);
        render.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_render = Instant::now();
        let mut playback: Option<Interval> = None;

        self.report_events();
        loop {
            sync_playback_interval(&mut playback, self.gate.period());

            tokio::select! {
                Some(now) = next_tick(&mut playback) => {
                    self.engine.playback_tick(now.into_std());
                }
                now = render.tick() => {
                    let elapsed = now.saturating_duration_since(last_render);
                    last_render = now;
                    self.poll_watcher();
                    self.render(elapsed, false);
                }
                line = lines.next_line(), if stdin_open => match line? {
                    Some(line) => {
                        if self.handle_line(&line) == LineAction::Quit {
                            break;
                        }
                    }
                    None => {
                        tracing::debug!("stdin closed");
                        stdin_open = false;
                    }
                },
            }

            self.report_events();
            if !stdin_open && !self.engine.scheduler().is_playing() && self.watcher.is_none() {
                break;
            }
        }

        self.render(Duration::ZERO, true);
        tracing::info!("Observer stopped");
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> LineAction {
        match line.trim() {
            "" => {}
            "quit" | "exit" | "q" => return LineAction::Quit,
            "help" | "?" => println!("{HELP}"),
            "status" => self.render(Duration::ZERO, true),
            "reload" => {
                if let Err(e) = self.reload() {
                    tracing::error!("Reload failed: {e}");
                }
            }
            text => match ReplayCommand::parse(text) {
                Ok(command) => self.engine.apply(command),
                Err(e) => tracing::warn!("{e} (type `help` for commands)"),
            },
        }
        LineAction::Continue
    }

    fn poll_watcher(&mut self) {
        let Some(watcher) = &self.watcher else {
            return;
        };

        let mut changed = false;
        for event in watcher.poll_events() {
            match event {
                ReplayFileEvent::Changed => changed = true,
                ReplayFileEvent::Removed => {
                    tracing::warn!("{} was removed, keeping the loaded replay", watcher.path().display());
                }
                ReplayFileEvent::Error(e) => tracing::warn!("Watcher error: {e}"),
            }
        }

        if changed {
            tracing::info!("{} changed, reloading", self.replay_path.display());
            // A half-written file fails to parse; the next write triggers another reload
            if let Err(e) = self.reload() {
                tracing::warn!("Reload failed, keeping the previous replay: {e}");
            }
        }
    }

    /// Print the status line when it changed, or always when `force` is set
    fn render(&mut self, elapsed: Duration, force: bool) {
        let state = self.engine.render_tick(elapsed);
        let status = format_status(&state);
        if force || self.last_status.as_deref() != Some(status.as_str()) {
            println!("{status}");
            self.last_status = Some(status);
        }
    }

    fn report_events(&mut self) {
        for event in self.engine.drain_events() {
            match event {
                ReplayEvent::DataLoaded { frames } => tracing::info!("Replay loaded: {frames} frames"),
                ReplayEvent::FrameChanged(index) => tracing::trace!("Frame {index}"),
                ReplayEvent::PlayStateChanged(playing) => tracing::debug!(playing, "Play state changed"),
                ReplayEvent::SelectionChanged(selection) => {
                    tracing::debug!(?selection, "Selection changed");
                }
                ReplayEvent::Error(message) => eprintln!("error: {message}"),
            }
        }
    }
}

/// Keep the playback interval in step with the tick gate
fn sync_playback_interval(playback: &mut Option<Interval>, period: Option<Duration>) {
    if playback.as_ref().map(Interval::period) == period {
        return;
    }
    *playback = period.map(|period| {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });
}

/// Next playback tick, or never while playback is stopped
async fn next_tick(playback: &mut Option<Interval>) -> Option<Instant> {
    match playback {
        Some(interval) => Some(interval.tick().await),
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use proboj_observer_replay::LoadError;
    use std::path::Path;

    fn replay_file(name: &str, frames: usize) -> PathBuf {
        let frame = r#"{"ships": [{"player": 0, "health": 1, "position": {"x": 0, "y": 0}}]}"#;
        let text = vec![frame; frames].join("\n");
        let path = std::env::temp_dir().join(format!("{name}_{}.ndjson", std::process::id()));
        std::fs::write(&path, text).unwrap();
        path
    }

    fn observer(path: &Path, extra: &[&str]) -> Observer {
        let mut args = vec!["proboj_observer", path.to_str().unwrap()];
        args.extend_from_slice(extra);
        let cli = Cli::try_parse_from(args).unwrap();
        let config = cli.resolve_config().unwrap();
        Observer::open(&cli, &config).unwrap()
    }

    #[test]
    fn test_open_with_autoplay_opens_gate() {
        let path = replay_file("observer_autoplay", 3);
        let observer = observer(&path, &["--autoplay", "--speed", "50"]);
        std::fs::remove_file(&path).ok();

        assert_eq!(observer.engine.store().len(), 3);
        assert!(observer.engine.scheduler().is_playing());
        assert_eq!(observer.engine.scheduler().speed(), Duration::from_millis(50));
        assert_eq!(observer.gate.period(), Some(Duration::from_millis(16)));
    }

    #[test]
    fn test_missing_replay_fails_to_open() {
        let cli = Cli::try_parse_from(["proboj_observer", "/nonexistent/game.json"]).unwrap();
        let result = Observer::open(&cli, &ReplayConfig::default());
        assert!(matches!(result, Err(AppError::Replay(ReplayError::Load(LoadError::Io { .. })))));
    }

    #[test]
    fn test_command_lines() {
        let path = replay_file("observer_commands", 4);
        let mut observer = observer(&path, &[]);

        assert_eq!(observer.handle_line("frame 2"), LineAction::Continue);
        assert_eq!(observer.engine.store().current_index(), 2);

        assert_eq!(observer.handle_line("not a command"), LineAction::Continue);
        assert_eq!(observer.handle_line("  "), LineAction::Continue);
        assert_eq!(observer.engine.store().current_index(), 2);

        std::fs::write(&path, "[]").unwrap();
        observer.handle_line("reload");
        assert_eq!(observer.engine.store().len(), 0);
        std::fs::remove_file(&path).ok();

        assert_eq!(observer.handle_line("quit"), LineAction::Quit);
    }

    #[test]
    fn test_playback_interval_follows_gate() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        runtime.block_on(async {
            let mut playback = None;
            sync_playback_interval(&mut playback, None);
            assert!(playback.is_none());

            sync_playback_interval(&mut playback, Some(Duration::from_millis(16)));
            assert_eq!(playback.as_ref().map(Interval::period), Some(Duration::from_millis(16)));

            sync_playback_interval(&mut playback, None);
            assert!(playback.is_none());
        });
    }

    #[test]
    fn test_zero_periods_from_config_do_not_stall() {
        let mut config = ReplayConfig::default();
        config.playback.tick_interval_ms = 0;
        config.view.render_interval_ms = 0;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        runtime.block_on(async {
            let mut render = tokio::time::interval(config.view.render_interval());
            render.tick().await;

            let mut playback = None;
            sync_playback_interval(&mut playback, Some(config.playback.tick_interval()));
            assert_eq!(playback.as_ref().map(Interval::period), Some(Duration::from_millis(1)));
            assert!(next_tick(&mut playback).await.is_some());
        });
    }
}
