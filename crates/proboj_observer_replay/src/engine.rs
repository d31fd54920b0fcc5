// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replay engine - ties the frame store, playback scheduler, camera and
//! selection together behind a command interface.
//!
//! The host drives two independent ticks on one thread:
//! [`ReplayEngine::playback_tick`] at the scheduler's tick interval while
//! playing, and [`ReplayEngine::render_tick`] once per drawn frame.

use crate::camera::{Camera, ViewTransform};
use crate::commands::{ReplayCommand, StepDirection};
use crate::config::ReplayConfig;
use crate::details::{player_summaries, DetailsView, EntityDetails, PlayerSummary};
use crate::error::Result;
use crate::events::ReplayEvent;
use crate::frame::{EntityId, Frame, Vec2};
use crate::loader::load_frames;
use crate::playback::{PlaybackScheduler, TickOutcome, TickSource};
use crate::selection::{ResolvedEntity, SelectionTracker};
use crate::store::FrameStore;
use indexmap::IndexMap;
use std::path::Path;
use std::time::{Duration, Instant};

/// Transient user-facing error message
#[derive(Debug, Clone)]
struct ErrorBanner {
    message: String,
    remaining: Duration,
}

/// Everything a renderer needs for one drawn frame
#[derive(Debug)]
pub struct RenderState<'a> {
    /// Frame to draw; `None` when nothing is loaded
    pub frame: Option<&'a Frame>,
    /// Eased camera transform
    pub camera: ViewTransform,
    /// Viewport size in pixels
    pub viewport: Vec2,
    /// Selected entity as found in `frame`
    pub selection: Option<ResolvedEntity<'a>>,
    /// Details panel content
    pub details: DetailsView,
    /// Player panels
    pub players: IndexMap<EntityId, PlayerSummary>,
    /// Current frame index
    pub frame_index: usize,
    /// Number of loaded frames
    pub frame_count: usize,
    /// Whether playback is running
    pub playing: bool,
    /// Error banner, if one is showing
    pub error: Option<&'a str>,
}

/// The replay engine
#[derive(Debug)]
pub struct ReplayEngine {
    store: FrameStore,
    scheduler: PlaybackScheduler,
    camera: Camera,
    selection: SelectionTracker,
    error_display: Duration,
    error_banner: Option<ErrorBanner>,
    pending_events: Vec<ReplayEvent>,
}

impl ReplayEngine {
    /// Create an engine with a manually ticked scheduler
    pub fn new(config: &ReplayConfig) -> Self {
        Self::with_scheduler(config, PlaybackScheduler::new())
    }

    /// Create an engine whose scheduler drives the given tick source
    pub fn with_tick_source(config: &ReplayConfig, ticker: Box<dyn TickSource>) -> Self {
        Self::with_scheduler(config, PlaybackScheduler::with_tick_source(ticker))
    }

    fn with_scheduler(config: &ReplayConfig, mut scheduler: PlaybackScheduler) -> Self {
        config.configure_scheduler(&mut scheduler);
        Self {
            store: FrameStore::new(),
            scheduler,
            camera: config.camera(),
            selection: SelectionTracker::new(),
            error_display: config.error_display(),
            error_banner: None,
            pending_events: Vec::new(),
        }
    }

    /// Replace the frame sequence: stops playback, clears the selection and
    /// frames the whole play-field
    pub fn load(&mut self, frames: Vec<Frame>) {
        self.scheduler.pause();
        self.store.load(frames);
        self.selection.clear();
        self.camera.reset();
        self.error_banner = None;
        self.collect_events();
    }

    /// Read a replay file and [`load`](Self::load) it, returning the frame count.
    /// On error the current frames stay loaded.
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let frames = load_frames(path)?;
        let count = frames.len();
        self.load(frames);
        Ok(count)
    }

    /// Apply a user command
    pub fn apply(&mut self, command: ReplayCommand) {
        tracing::trace!(?command, "Applying command");
        match command {
            ReplayCommand::Play => {
                self.scheduler.play(&self.store);
            }
            ReplayCommand::Pause => self.scheduler.pause(),
            ReplayCommand::TogglePlay => self.scheduler.toggle(&self.store),
            ReplayCommand::Step(StepDirection::Forward) => {
                self.store.next_frame();
            }
            ReplayCommand::Step(StepDirection::Backward) => {
                self.store.previous_frame();
            }
            ReplayCommand::JumpToFirst => self.store.first_frame(),
            ReplayCommand::JumpToLast => self.store.last_frame(),
            ReplayCommand::SetFrame(index) => match usize::try_from(index) {
                Ok(index) => self.store.set_current_frame(index),
                Err(_) => tracing::trace!("Ignoring negative frame {index}"),
            },
            ReplayCommand::SetSpeed(millis) => self
                .scheduler
                .set_speed(Duration::from_millis(millis), &self.store),
            ReplayCommand::Pan { dx, dy } => self.camera.pan(dx, dy),
            ReplayCommand::ZoomIn => self.camera.zoom_in(),
            ReplayCommand::ZoomOut => self.camera.zoom_out(),
            ReplayCommand::Wheel { delta_y } => self.camera.handle_wheel(delta_y),
            ReplayCommand::SelectAt { x, y } => self.select_at(Vec2::new(x, y)),
            ReplayCommand::Deselect => {
                self.selection.clear();
            }
            ReplayCommand::ResetView => self.camera.reset(),
            ReplayCommand::FocusPlayer(player) => self.focus_player(player),
            ReplayCommand::Resize { width, height } => self.camera.resize(width, height),
        }
        self.collect_events();
    }

    /// Pick at a screen position; a miss clears the selection
    fn select_at(&mut self, screen: Vec2) {
        let world = self.camera.screen_to_world(screen);
        let hit = self.store.select_entity_at(world.x, world.y);
        tracing::debug!(?world, ?hit, "Selection pick");
        self.selection.select(hit);
    }

    fn focus_player(&mut self, player: EntityId) {
        let position = self
            .store
            .current_frame()
            .and_then(|frame| frame.mothership_position(player));
        match position {
            Some(position) => self.camera.focus(position),
            None => tracing::debug!("No mothership for player {player} in the current frame"),
        }
    }

    /// Scheduler tick sampled at `now`
    pub fn playback_tick(&mut self, now: Instant) -> TickOutcome {
        let outcome = self.scheduler.tick(now, &mut self.store);
        self.collect_events();
        outcome
    }

    /// Render tick: eases the camera, ages the error banner and returns what
    /// to draw. `elapsed` is the time since the previous render tick.
    pub fn render_tick(&mut self, elapsed: Duration) -> RenderState<'_> {
        self.camera.update();
        self.age_error_banner(elapsed);

        // Recovery may move the index; settle it before borrowing the frame
        self.store.current_frame();
        self.collect_events();

        let frame = self.store.displayed_frame();
        let selection = frame.and_then(|frame| self.selection.resolve(frame));
        let details = match (frame, selection) {
            (Some(frame), Some(entity)) => {
                DetailsView::Entity(EntityDetails::describe(entity, frame))
            }
            _ if self.selection.is_selected() => DetailsView::NotInFrame,
            _ => DetailsView::NothingSelected,
        };

        RenderState {
            frame,
            camera: self.camera.actual(),
            viewport: self.camera.viewport(),
            selection,
            details,
            players: frame.map(player_summaries).unwrap_or_default(),
            frame_index: self.store.current_index(),
            frame_count: self.store.len(),
            playing: self.scheduler.is_playing(),
            error: self.error_banner.as_ref().map(|banner| banner.message.as_str()),
        }
    }

    fn age_error_banner(&mut self, elapsed: Duration) {
        if let Some(banner) = &mut self.error_banner {
            banner.remaining = banner.remaining.saturating_sub(elapsed);
            if banner.remaining.is_zero() {
                tracing::debug!("Error banner expired");
                self.error_banner = None;
            }
        }
    }

    /// Move component events into the engine queue, in causal order per component
    fn collect_events(&mut self) {
        let events = self
            .scheduler
            .take_events()
            .into_iter()
            .chain(self.store.take_events())
            .chain(self.selection.take_events());

        for event in events {
            if let ReplayEvent::Error(message) = &event {
                self.error_banner = Some(ErrorBanner {
                    message: message.clone(),
                    remaining: self.error_display,
                });
            }
            self.pending_events.push(event);
        }
    }

    /// Get pending events and clear them
    pub fn drain_events(&mut self) -> Vec<ReplayEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// The frame store
    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    /// The playback scheduler
    pub fn scheduler(&self) -> &PlaybackScheduler {
        &self.scheduler
    }

    /// The camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The selection tracker
    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    /// Error banner text, if one is showing
    pub fn error_message(&self) -> Option<&str> {
        self.error_banner.as_ref().map(|banner| banner.message.as_str())
    }
}

impl Default for ReplayEngine {
    fn default() -> Self {
        Self::new(&ReplayConfig::default())
    }
}
