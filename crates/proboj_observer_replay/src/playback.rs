// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback scheduler - advances the frame store at a configurable rate.
//!
//! A fixed-rate tick (about 60 per second) samples wall-clock time into an
//! accumulator. Once the accumulator reaches the playback speed the store
//! moves forward by exactly one frame, however large the elapsed time was.

use crate::error::ReplayError;
use crate::events::ReplayEvent;
use crate::store::FrameStore;
use std::time::{Duration, Instant};

/// Default time each frame stays on screen
pub const DEFAULT_SPEED: Duration = Duration::from_millis(1000);
/// Period of the scheduler tick
pub const TICK_INTERVAL: Duration = Duration::from_millis(16);
/// Shortest accepted tick period; a zero period would never yield
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);
/// Frames skipped while looking for a valid one during playback
pub const MAX_SKIP_ATTEMPTS: usize = 10;

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Not advancing
    #[default]
    Paused,
    /// Advancing on every due tick
    Playing,
}

/// A periodic tick source owned by the scheduler
///
/// The scheduler starts it on play and cancels it on pause and on drop, so
/// no tick outlives the scheduler that asked for it.
pub trait TickSource {
    /// Start ticking at `period`, replacing any previous schedule
    fn start(&mut self, period: Duration);

    /// Stop ticking; must be safe to call when already stopped
    fn cancel(&mut self);

    /// Whether ticks are currently scheduled
    fn is_running(&self) -> bool;
}

/// Tick source for hosts that call [`PlaybackScheduler::tick`] themselves
#[derive(Debug, Clone, Default)]
pub struct ManualTicks {
    period: Option<Duration>,
}

impl ManualTicks {
    /// Requested period while running
    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}

impl TickSource for ManualTicks {
    fn start(&mut self, period: Duration) {
        self.period = Some(period);
    }

    fn cancel(&mut self) {
        self.period = None;
    }

    fn is_running(&self) -> bool {
        self.period.is_some()
    }
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing
    Idle,
    /// Accumulating time towards the next frame
    Waiting,
    /// Moved to the given frame
    Advanced(usize),
    /// Skipped corrupted frames and landed on a valid one
    Recovered {
        /// Frame playback advanced from
        from: usize,
        /// Valid frame playback landed on
        to: usize,
    },
    /// Hit the end of the sequence and paused
    Finished,
    /// Gave up looking for a valid frame and paused
    RecoveryExhausted {
        /// Frame playback advanced from
        from: usize,
    },
}

/// Time-accumulator driven play/pause state machine
pub struct PlaybackScheduler {
    /// Playback state
    state: PlaybackState,
    /// Time each frame stays on screen
    speed: Duration,
    /// Scheduler tick period
    tick_interval: Duration,
    /// Skip budget during playback recovery
    max_skip_attempts: usize,
    /// Time gathered towards the next frame
    accumulator: Duration,
    /// Wall-clock time of the previous tick
    last_tick: Option<Instant>,
    /// Tick source driving this scheduler
    ticker: Box<dyn TickSource>,
    /// Events emitted since the last drain
    pending_events: Vec<ReplayEvent>,
}

impl PlaybackScheduler {
    /// Create a paused scheduler with a manual tick source
    pub fn new() -> Self {
        Self::with_tick_source(Box::new(ManualTicks::default()))
    }

    /// Create a paused scheduler driven by the given tick source
    pub fn with_tick_source(ticker: Box<dyn TickSource>) -> Self {
        Self {
            state: PlaybackState::Paused,
            speed: DEFAULT_SPEED,
            tick_interval: TICK_INTERVAL,
            max_skip_attempts: MAX_SKIP_ATTEMPTS,
            accumulator: Duration::ZERO,
            last_tick: None,
            ticker,
            pending_events: Vec::new(),
        }
    }

    /// Set the scheduler tick period (applies on the next play)
    pub fn set_tick_interval(&mut self, interval: Duration) {
        self.tick_interval = interval.max(MIN_TICK_INTERVAL);
    }

    /// Set the skip budget used during playback recovery
    pub fn set_max_skip_attempts(&mut self, attempts: usize) {
        self.max_skip_attempts = attempts;
    }

    /// Set the frame duration before playback starts.
    /// Use [`PlaybackScheduler::set_speed`] while playing.
    pub fn set_initial_speed(&mut self, speed: Duration) {
        self.speed = speed;
    }

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Time each frame stays on screen
    pub fn speed(&self) -> Duration {
        self.speed
    }

    /// Scheduler tick period
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Whether the tick source is running
    pub fn is_ticking(&self) -> bool {
        self.ticker.is_running()
    }

    /// Start playback. Does nothing when there is at most one frame.
    pub fn play(&mut self, store: &FrameStore) -> bool {
        if store.len() <= 1 {
            tracing::debug!("Not enough frames to play ({})", store.len());
            return false;
        }

        let was_playing = self.is_playing();
        self.ticker.cancel();
        self.state = PlaybackState::Playing;
        self.accumulator = Duration::ZERO;
        self.last_tick = None;
        self.ticker.start(self.tick_interval);

        if !was_playing {
            tracing::info!("Playback started at frame {}", store.current_index());
            self.pending_events.push(ReplayEvent::PlayStateChanged(true));
        }
        true
    }

    /// Pause playback. Safe to call in any state.
    pub fn pause(&mut self) {
        self.ticker.cancel();
        self.last_tick = None;
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            tracing::info!("Playback paused");
            self.pending_events.push(ReplayEvent::PlayStateChanged(false));
        }
    }

    /// Toggle play/pause
    pub fn toggle(&mut self, store: &FrameStore) {
        match self.state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => {
                self.play(store);
            }
        }
    }

    /// Change the time each frame stays on screen. While playing this
    /// restarts playback so the accumulator starts over at the new rate.
    pub fn set_speed(&mut self, speed: Duration, store: &FrameStore) {
        self.speed = speed;
        if self.is_playing() {
            self.pause();
            self.play(store);
        }
    }

    /// Handle one scheduler tick sampled at wall-clock time `now`
    pub fn tick(&mut self, now: Instant, store: &mut FrameStore) -> TickOutcome {
        if !self.is_playing() {
            return TickOutcome::Idle;
        }

        let delta = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or_default();
        self.last_tick = Some(now);
        self.advance(delta, store)
    }

    /// Add elapsed time and move forward one frame if a frame is due
    pub fn advance(&mut self, delta: Duration, store: &mut FrameStore) -> TickOutcome {
        if !self.is_playing() {
            return TickOutcome::Idle;
        }

        self.accumulator += delta;
        if self.accumulator < self.speed {
            return TickOutcome::Waiting;
        }

        // No catch-up: one frame per due tick, whatever the backlog
        self.accumulator = Duration::ZERO;
        self.step(store)
    }

    fn step(&mut self, store: &mut FrameStore) -> TickOutcome {
        let from = store.current_index();
        if !store.next_frame() {
            self.pause();
            return TickOutcome::Finished;
        }

        let landed = store.current_index();
        if store.is_valid_at(landed) {
            self.pause_at_end(store);
            return TickOutcome::Advanced(landed);
        }

        tracing::warn!("Corrupted frame {landed} during playback, skipping forward");
        self.recover(from, store)
    }

    /// Bounded forward skip after landing on a corrupted frame
    fn recover(&mut self, from: usize, store: &mut FrameStore) -> TickOutcome {
        for _ in 0..self.max_skip_attempts {
            if !store.next_frame() {
                self.pause();
                return TickOutcome::Finished;
            }

            let index = store.current_index();
            if store.is_valid_at(index) {
                tracing::info!("Skipped corrupted frames after {from}, now at frame {index}");
                self.pause_at_end(store);
                return TickOutcome::Recovered { from, to: index };
            }
        }

        let error = ReplayError::DataCorruption {
            from,
            attempts: self.max_skip_attempts,
        };
        tracing::error!("{error}");
        self.pause();
        self.pending_events.push(ReplayEvent::Error(error.to_string()));
        TickOutcome::RecoveryExhausted { from }
    }

    fn pause_at_end(&mut self, store: &FrameStore) {
        if store.is_at_end() {
            tracing::info!("Reached the last frame");
            self.pause();
        }
    }

    /// Get pending events and clear them
    pub fn take_events(&mut self) -> Vec<ReplayEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.ticker.cancel();
    }
}

impl std::fmt::Debug for PlaybackScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackScheduler")
            .field("state", &self.state)
            .field("speed", &self.speed)
            .field("accumulator", &self.accumulator)
            .field("ticking", &self.ticker.is_running())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;

    fn valid() -> Frame {
        Frame::from_value(json!({"ships": [{"player": 0, "health": 1, "position": {"x": 0, "y": 0}}]}))
    }

    fn invalid() -> Frame {
        Frame::from_value(json!({"ships": [{"player": 0}]}))
    }

    fn loaded(frames: Vec<Frame>) -> FrameStore {
        let mut store = FrameStore::new();
        store.load(frames);
        store.take_events();
        store
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_single_frame_never_plays() {
        let store = loaded(vec![valid()]);
        let mut scheduler = PlaybackScheduler::new();
        assert!(!scheduler.play(&store));
        assert_eq!(scheduler.state(), PlaybackState::Paused);
        assert!(!scheduler.is_ticking());
        assert!(scheduler.take_events().is_empty());
    }

    #[test]
    fn test_advances_exactly_one_frame_when_due() {
        let mut store = loaded(vec![valid(), valid(), valid(), valid()]);
        let mut scheduler = PlaybackScheduler::new();
        assert!(scheduler.play(&store));

        assert_eq!(scheduler.advance(ms(999), &mut store), TickOutcome::Waiting);
        assert_eq!(store.current_index(), 0);

        assert_eq!(scheduler.advance(ms(1), &mut store), TickOutcome::Advanced(1));
        assert_eq!(store.current_index(), 1);

        // A huge delta still moves a single frame
        assert_eq!(scheduler.advance(ms(5000), &mut store), TickOutcome::Advanced(2));
        assert_eq!(store.current_index(), 2);
    }

    #[test]
    fn test_small_ticks_accumulate() {
        let mut store = loaded(vec![valid(), valid(), valid()]);
        let mut scheduler = PlaybackScheduler::new();
        scheduler.play(&store);

        for _ in 0..62 {
            scheduler.advance(TICK_INTERVAL, &mut store);
        }
        assert_eq!(store.current_index(), 0); // 992ms
        scheduler.advance(TICK_INTERVAL, &mut store);
        assert_eq!(store.current_index(), 1);
    }

    #[test]
    fn test_tick_measures_wall_clock() {
        let mut store = loaded(vec![valid(), valid(), valid()]);
        let mut scheduler = PlaybackScheduler::new();
        scheduler.play(&store);

        let start = Instant::now();
        assert_eq!(scheduler.tick(start, &mut store), TickOutcome::Waiting);
        assert_eq!(scheduler.tick(start + ms(600), &mut store), TickOutcome::Waiting);
        assert_eq!(
            scheduler.tick(start + ms(1000), &mut store),
            TickOutcome::Advanced(1)
        );
    }

    #[test]
    fn test_pauses_on_last_frame() {
        let mut store = loaded(vec![valid(), valid()]);
        let mut scheduler = PlaybackScheduler::new();
        scheduler.play(&store);

        assert_eq!(scheduler.advance(ms(1000), &mut store), TickOutcome::Advanced(1));
        assert_eq!(scheduler.state(), PlaybackState::Paused);
        assert!(!scheduler.is_ticking());
        assert_eq!(
            scheduler.take_events(),
            vec![
                ReplayEvent::PlayStateChanged(true),
                ReplayEvent::PlayStateChanged(false)
            ]
        );
    }

    #[test]
    fn test_play_from_last_frame_finishes_on_next_due_tick() {
        let mut store = loaded(vec![valid(), valid(), valid()]);
        store.last_frame();
        let mut scheduler = PlaybackScheduler::new();
        assert!(scheduler.play(&store));
        assert_eq!(scheduler.advance(ms(1000), &mut store), TickOutcome::Finished);
        assert!(!scheduler.is_playing());
    }

    #[test]
    fn test_recovers_over_corrupted_frames() {
        let mut store = loaded(vec![valid(), invalid(), invalid(), valid(), valid()]);
        let mut scheduler = PlaybackScheduler::new();
        scheduler.play(&store);

        assert_eq!(
            scheduler.advance(ms(1000), &mut store),
            TickOutcome::Recovered { from: 0, to: 3 }
        );
        assert_eq!(store.current_index(), 3);
        assert!(scheduler.is_playing());
    }

    #[test]
    fn test_exhausted_recovery_pauses_with_error() {
        let mut frames = vec![valid()];
        frames.extend((0..12).map(|_| invalid()));
        frames.push(valid());
        let mut store = loaded(frames);
        let mut scheduler = PlaybackScheduler::new();
        scheduler.play(&store);
        scheduler.take_events();

        assert_eq!(
            scheduler.advance(ms(1000), &mut store),
            TickOutcome::RecoveryExhausted { from: 0 }
        );
        assert_eq!(store.current_index(), 11);
        assert!(!scheduler.is_playing());

        let events = scheduler.take_events();
        assert_eq!(events[0], ReplayEvent::PlayStateChanged(false));
        assert!(matches!(
            &events[1],
            ReplayEvent::Error(message) if message.contains("no valid frame within 10 skips after frame 0")
        ));
    }

    #[test]
    fn test_corruption_running_into_end_just_finishes() {
        let mut store = loaded(vec![valid(), invalid(), invalid()]);
        let mut scheduler = PlaybackScheduler::new();
        scheduler.play(&store);
        scheduler.take_events();

        assert_eq!(scheduler.advance(ms(1000), &mut store), TickOutcome::Finished);
        assert!(!scheduler.is_playing());
        assert!(!scheduler
            .take_events()
            .iter()
            .any(|event| matches!(event, ReplayEvent::Error(_))));
    }

    #[test]
    fn test_pause_is_idempotent() {
        let store = loaded(vec![valid(), valid()]);
        let mut scheduler = PlaybackScheduler::new();
        scheduler.pause();
        scheduler.play(&store);
        scheduler.pause();
        scheduler.pause();
        assert_eq!(scheduler.state(), PlaybackState::Paused);
        assert_eq!(
            scheduler.take_events(),
            vec![
                ReplayEvent::PlayStateChanged(true),
                ReplayEvent::PlayStateChanged(false)
            ]
        );
    }

    #[test]
    fn test_speed_change_restarts_accumulator() {
        let mut store = loaded(vec![valid(), valid(), valid()]);
        let mut scheduler = PlaybackScheduler::new();
        scheduler.play(&store);
        scheduler.advance(ms(900), &mut store);

        scheduler.set_speed(ms(500), &store);
        assert!(scheduler.is_playing());
        assert_eq!(scheduler.advance(ms(499), &mut store), TickOutcome::Waiting);
        assert_eq!(scheduler.advance(ms(1), &mut store), TickOutcome::Advanced(1));
    }

    #[test]
    fn test_paused_ticks_are_idle() {
        let mut store = loaded(vec![valid(), valid()]);
        let mut scheduler = PlaybackScheduler::new();
        assert_eq!(scheduler.advance(ms(5000), &mut store), TickOutcome::Idle);
        assert_eq!(store.current_index(), 0);
    }

    /// Records the tick source state where the test can still see it
    struct SharedTicks(Rc<Cell<bool>>);

    impl TickSource for SharedTicks {
        fn start(&mut self, _period: Duration) {
            self.0.set(true);
        }

        fn cancel(&mut self) {
            self.0.set(false);
        }

        fn is_running(&self) -> bool {
            self.0.get()
        }
    }

    #[test]
    fn test_drop_cancels_tick_source() {
        let running = Rc::new(Cell::new(false));
        let store = loaded(vec![valid(), valid()]);

        let mut scheduler = PlaybackScheduler::with_tick_source(Box::new(SharedTicks(running.clone())));
        scheduler.play(&store);
        assert!(running.get());

        drop(scheduler);
        assert!(!running.get());
    }

    #[test]
    fn test_zero_tick_interval_is_clamped() {
        let store = loaded(vec![valid(), valid()]);
        let mut scheduler = PlaybackScheduler::new();
        scheduler.set_tick_interval(Duration::ZERO);
        assert_eq!(scheduler.tick_interval(), MIN_TICK_INTERVAL);

        scheduler.play(&store);
        assert!(scheduler.is_playing());
    }
}
