// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame store - the loaded frame sequence, current index, validation and
//! forward recovery from corrupted frames.

use crate::events::ReplayEvent;
use crate::frame::{Frame, Vec2};
use crate::selection::{EntityKind, SelectionRef};

/// Pick radius around a ship
pub const SHIP_PICK_RADIUS: f64 = 50.0;
/// Pick margin added to an asteroid's size
pub const ASTEROID_PICK_MARGIN: f64 = 10.0;
/// Pick radius around a wormhole
pub const WORMHOLE_PICK_RADIUS: f64 = 30.0;

/// Owner of the frame sequence
///
/// Frames are immutable once loaded; [`FrameStore::load`] replaces the whole
/// sequence. Whenever frames are loaded, `current_index() < len()`.
#[derive(Debug)]
pub struct FrameStore {
    /// Loaded frames
    frames: Vec<Frame>,
    /// Index of the current frame
    current: usize,
    /// Returned when no usable frame exists
    empty: Frame,
    /// Events emitted since the last drain
    pending_events: Vec<ReplayEvent>,
}

impl FrameStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            current: 0,
            empty: Frame::empty(),
            pending_events: Vec::new(),
        }
    }

    /// Replace the entire sequence and rewind to the first frame
    pub fn load(&mut self, frames: Vec<Frame>) {
        let invalid = frames.iter().filter(|frame| !Self::validate(frame)).count();
        if invalid > 0 {
            tracing::warn!("Loaded replay contains {invalid} invalid frames");
        }
        tracing::info!("Loaded {} frames", frames.len());

        self.frames = frames;
        self.current = 0;
        self.pending_events.push(ReplayEvent::DataLoaded {
            frames: self.frames.len(),
        });
    }

    /// Number of loaded frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if no frames are loaded
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the current frame
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Whether the current frame is the last one
    pub fn is_at_end(&self) -> bool {
        self.current + 1 >= self.frames.len()
    }

    /// Get a frame without validation
    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    /// Check whether the frame at `index` exists and validates
    pub fn is_valid_at(&self, index: usize) -> bool {
        self.frames.get(index).is_some_and(Self::validate)
    }

    /// A frame is valid iff its ship list is a sequence and every present
    /// ship defines health, position and player. Other collections are not
    /// checked.
    pub fn validate(frame: &Frame) -> bool {
        let Some(ships) = &frame.ships else {
            return false;
        };

        match ships.iter().flatten().find(|ship| !ship.is_complete()) {
            Some(ship) => {
                tracing::debug!(?ship, "Invalid ship data detected");
                false
            }
            None => true,
        }
    }

    /// The current frame, recovering forward if it fails validation.
    /// `None` only when nothing is loaded.
    pub fn current_frame(&mut self) -> Option<&Frame> {
        let valid = Self::validate(self.frames.get(self.current)?);
        if valid {
            return self.frames.get(self.current);
        }

        tracing::warn!(
            "Invalid game state detected at frame {}, attempting to skip to next valid frame",
            self.current
        );
        Some(self.recover_forward(self.current))
    }

    /// The frame to draw without running recovery: the current frame when it
    /// validates, otherwise the canonical empty frame
    pub fn displayed_frame(&self) -> Option<&Frame> {
        let frame = self.frames.get(self.current)?;
        if Self::validate(frame) {
            Some(frame)
        } else {
            Some(&self.empty)
        }
    }

    /// Scan forward from `from + 1` for the first valid frame and move
    /// there. When none is left, park on the last frame and hand out the
    /// canonical empty frame.
    pub fn recover_forward(&mut self, from: usize) -> &Frame {
        let found = self
            .frames
            .iter()
            .enumerate()
            .skip(from.saturating_add(1))
            .find(|(_, frame)| Self::validate(frame))
            .map(|(index, _)| index);

        match found {
            Some(index) => {
                tracing::info!("Found valid frame at index {index}, skipping corrupted frames");
                self.move_to(index);
                &self.frames[index]
            }
            None => {
                tracing::error!("No valid frames found after frame {from}, returning empty state");
                self.move_to(self.frames.len().saturating_sub(1));
                &self.empty
            }
        }
    }

    /// Jump to a frame. Out-of-range indices are ignored.
    pub fn set_current_frame(&mut self, index: usize) {
        if index >= self.frames.len() {
            tracing::trace!("Ignoring out-of-range frame {index}");
            return;
        }
        self.current = index;
        self.pending_events.push(ReplayEvent::FrameChanged(index));
    }

    /// Step forward one frame; false at the end of the sequence
    pub fn next_frame(&mut self) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.set_current_frame(self.current + 1);
        true
    }

    /// Step back one frame; false at the start of the sequence
    pub fn previous_frame(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.set_current_frame(self.current - 1);
        true
    }

    /// Jump to the first frame
    pub fn first_frame(&mut self) {
        self.set_current_frame(0);
    }

    /// Jump to the last frame
    pub fn last_frame(&mut self) {
        if let Some(last) = self.frames.len().checked_sub(1) {
            self.set_current_frame(last);
        }
    }

    /// Hit-test the current frame at a world position.
    ///
    /// Kinds are tested in priority order ship, asteroid, wormhole and the
    /// first entity within its pick radius wins; this is not a nearest
    /// match.
    pub fn select_entity_at(&mut self, x: f64, y: f64) -> Option<SelectionRef> {
        let frame = self.current_frame()?;
        pick(frame, Vec2::new(x, y))
    }

    /// Move the index without re-announcing an unchanged position
    fn move_to(&mut self, index: usize) {
        if index != self.current {
            self.current = index;
            self.pending_events.push(ReplayEvent::FrameChanged(index));
        }
    }

    /// Get pending events and clear them
    pub fn take_events(&mut self) -> Vec<ReplayEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

impl Default for FrameStore {
    fn default() -> Self {
        Self::new()
    }
}

fn pick(frame: &Frame, point: Vec2) -> Option<SelectionRef> {
    let within = |position: Option<Vec2>, radius: f64| {
        position.is_some_and(|position| position.distance(point) < radius)
    };

    let ship = frame
        .ships()
        .find(|ship| ship.id.is_some() && within(ship.position, SHIP_PICK_RADIUS))
        .and_then(|ship| ship.id)
        .map(|id| SelectionRef::new(EntityKind::Ship, id));
    if ship.is_some() {
        return ship;
    }

    let asteroid = frame
        .asteroids()
        .find(|asteroid| {
            asteroid.id.is_some()
                && within(
                    asteroid.position,
                    asteroid.size.unwrap_or_default() + ASTEROID_PICK_MARGIN,
                )
        })
        .and_then(|asteroid| asteroid.id)
        .map(|id| SelectionRef::new(EntityKind::Asteroid, id));
    if asteroid.is_some() {
        return asteroid;
    }

    frame
        .wormholes()
        .find(|wormhole| wormhole.id.is_some() && within(wormhole.position, WORMHOLE_PICK_RADIUS))
        .and_then(|wormhole| wormhole.id)
        .map(|id| SelectionRef::new(EntityKind::Wormhole, id))
}
