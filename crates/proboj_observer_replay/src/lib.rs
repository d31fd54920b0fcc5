// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replay engine for the Proboj space game observer.
//!
//! This crate turns a recorded sequence of game-state frames into something
//! a viewer can step through:
//! - Frame storage with validation and forward recovery
//! - Accumulator-driven playback
//! - Eased camera with world/screen conversion
//! - Selection tracking across frames
//!
//! ## Architecture
//!
//! The engine is built on:
//! - Lenient frame parsing, so malformed data never aborts a load
//! - Event queues drained by the host once per tick
//! - A pluggable tick source owned by the playback scheduler
//! - A command enum shared by every input adapter

pub mod camera;
pub mod commands;
pub mod config;
pub mod details;
pub mod engine;
pub mod error;
pub mod events;
pub mod frame;
pub mod loader;
pub mod playback;
pub mod selection;
pub mod store;

pub use camera::{Camera, ViewTransform};
pub use commands::{Key, ParseCommandError, ReplayCommand, StepDirection};
pub use config::{ConfigError, PlaybackConfig, ReplayConfig, ViewConfig};
pub use details::{player_summaries, DetailsView, EntityDetails, PlayerSummary};
pub use engine::{RenderState, ReplayEngine};
pub use error::{ReplayError, Result};
pub use events::ReplayEvent;
pub use frame::{Asteroid, AsteroidType, EntityId, Frame, Player, Ship, ShipType, Vec2, Wormhole};
pub use loader::{load_frames, parse_frames, LoadError};
pub use playback::{ManualTicks, PlaybackScheduler, PlaybackState, TickOutcome, TickSource};
pub use selection::{EntityKind, ResolvedEntity, SelectionRef, SelectionTracker};
pub use store::FrameStore;
