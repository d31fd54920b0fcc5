// SPDX-License-Identifier: MIT OR Apache-2.0
//! Notifications emitted to collaborators (panels, renderer, status line).
//!
//! Components queue events as they change state; the host drains them once
//! per tick and decides what to redraw.

use crate::selection::SelectionRef;

/// A change the host should react to
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayEvent {
    /// A new frame sequence replaced the previous one
    DataLoaded {
        /// Number of frames in the new sequence
        frames: usize,
    },
    /// The current frame index changed (or was re-set)
    FrameChanged(usize),
    /// Playback started (`true`) or stopped (`false`)
    PlayStateChanged(bool),
    /// The tracked entity changed
    SelectionChanged(Option<SelectionRef>),
    /// A user-facing error, e.g. exhausted corruption recovery
    Error(String),
}
