// SPDX-License-Identifier: MIT OR Apache-2.0
//! Textual stand-in for the renderer and info panels.

use proboj_observer_replay::{DetailsView, RenderState};
use std::fmt::Write;

/// One status line describing what would be drawn
pub fn format_status(state: &RenderState<'_>) -> String {
    let Some(frame) = state.frame else {
        return "no frames loaded".to_string();
    };

    let mut line = format!("frame {}/{}", state.frame_index + 1, state.frame_count);
    if let Some(round) = frame.round {
        let _ = write!(line, " round {round}");
    }
    line.push_str(if state.playing { " | playing" } else { " | paused" });

    let alive = frame.ships().filter(|ship| !ship.is_destroyed()).count();
    let _ = write!(
        line,
        " | ships {alive}/{} asteroids {} wormholes {}",
        frame.ships().count(),
        frame.asteroids().count(),
        frame.wormholes().count()
    );

    if !state.players.is_empty() {
        let players: Vec<String> = state.players.values().map(ToString::to_string).collect();
        let _ = write!(line, " | {}", players.join(", "));
    }

    if !matches!(state.details, DetailsView::NothingSelected) {
        let _ = write!(line, " | {}", state.details);
    }

    if let Some(error) = state.error {
        let _ = write!(line, " | ERROR: {error}");
    }
    line
}
