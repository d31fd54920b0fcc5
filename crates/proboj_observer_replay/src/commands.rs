// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replay commands issued by an input adapter.
//!
//! Keys and text lines map onto commands; commands carry no state of their
//! own and are applied by [`ReplayEngine::apply`](crate::engine::ReplayEngine::apply).

use crate::frame::EntityId;
use thiserror::Error;

/// Direction of a single-frame step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    /// Previous frame
    Backward,
    /// Next frame
    Forward,
}

/// Keys with a default binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Space bar
    Space,
    /// Left arrow
    ArrowLeft,
    /// Right arrow
    ArrowRight,
    /// Home
    Home,
    /// End
    End,
    /// Escape
    Escape,
}

/// A user command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReplayCommand {
    /// Start playback
    Play,
    /// Pause playback
    Pause,
    /// Toggle play/pause
    TogglePlay,
    /// Step one frame
    Step(StepDirection),
    /// Jump to the first frame
    JumpToFirst,
    /// Jump to the last frame
    JumpToLast,
    /// Jump to a frame; out-of-range values are ignored
    SetFrame(i64),
    /// Set milliseconds per frame
    SetSpeed(u64),
    /// Pan by a screen-space delta
    Pan {
        /// Horizontal pixels
        dx: f64,
        /// Vertical pixels
        dy: f64,
    },
    /// Zoom in one step
    ZoomIn,
    /// Zoom out one step
    ZoomOut,
    /// Mouse wheel zoom
    Wheel {
        /// Wheel delta, negative scrolls up
        delta_y: f64,
    },
    /// Pick the entity under a screen position
    SelectAt {
        /// Screen X in pixels
        x: f64,
        /// Screen Y in pixels
        y: f64,
    },
    /// Clear the selection
    Deselect,
    /// Reset the camera to the whole play-field
    ResetView,
    /// Center the camera on a player's mothership
    FocusPlayer(EntityId),
    /// Viewport size changed
    Resize {
        /// Width in pixels
        width: f64,
        /// Height in pixels
        height: f64,
    },
}

/// Errors while parsing a command line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseCommandError {
    /// Empty input
    #[error("Empty command")]
    Empty,

    /// Unknown command word
    #[error("Unknown command: {0}")]
    Unknown(String),

    /// A required argument is missing
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// An argument is not a number
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

impl ReplayCommand {
    /// Default key binding
    pub fn from_key(key: Key) -> Self {
        match key {
            Key::Space => Self::TogglePlay,
            Key::ArrowLeft => Self::Step(StepDirection::Backward),
            Key::ArrowRight => Self::Step(StepDirection::Forward),
            Key::Home => Self::JumpToFirst,
            Key::End => Self::JumpToLast,
            Key::Escape => Self::Deselect,
        }
    }

    /// Parse a text command such as `frame 12`, `pan 10 -5` or `zoom in`
    pub fn parse(line: &str) -> Result<Self, ParseCommandError> {
        let mut words = line.split_whitespace();
        let command = words.next().ok_or(ParseCommandError::Empty)?.to_lowercase();
        let mut arg = |name: &'static str| words.next().ok_or(ParseCommandError::MissingArgument(name));

        let parsed = match command.as_str() {
            "play" => Self::Play,
            "pause" => Self::Pause,
            "toggle" | "space" => Self::TogglePlay,
            "next" | "right" => Self::Step(StepDirection::Forward),
            "prev" | "previous" | "left" => Self::Step(StepDirection::Backward),
            "step" => {
                let delta: i64 = number(arg("delta")?)?;
                if delta < 0 {
                    Self::Step(StepDirection::Backward)
                } else {
                    Self::Step(StepDirection::Forward)
                }
            }
            "first" | "home" => Self::JumpToFirst,
            "last" | "end" => Self::JumpToLast,
            "frame" | "goto" => Self::SetFrame(number(arg("frame")?)?),
            "speed" => Self::SetSpeed(number(arg("milliseconds")?)?),
            "pan" => Self::Pan {
                dx: float(arg("dx")?)?,
                dy: float(arg("dy")?)?,
            },
            "zoom" => match arg("in|out")? {
                "in" | "+" => Self::ZoomIn,
                "out" | "-" => Self::ZoomOut,
                other => return Err(ParseCommandError::Unknown(format!("zoom {other}"))),
            },
            "wheel" => Self::Wheel {
                delta_y: float(arg("delta")?)?,
            },
            "select" | "click" => Self::SelectAt {
                x: float(arg("x")?)?,
                y: float(arg("y")?)?,
            },
            "deselect" | "esc" | "escape" => Self::Deselect,
            "reset" => Self::ResetView,
            "focus" => Self::FocusPlayer(number(arg("player")?)?),
            "resize" => Self::Resize {
                width: float(arg("width")?)?,
                height: float(arg("height")?)?,
            },
            _ => return Err(ParseCommandError::Unknown(command.clone())),
        };
        Ok(parsed)
    }
}

fn number<T: std::str::FromStr>(text: &str) -> Result<T, ParseCommandError> {
    text.parse()
        .map_err(|_| ParseCommandError::InvalidNumber(text.to_string()))
}

/// Like [`number`], but NaN and infinities are rejected too
fn float(text: &str) -> Result<f64, ParseCommandError> {
    let value: f64 = number(text)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ParseCommandError::InvalidNumber(text.to_string()))
    }
}
