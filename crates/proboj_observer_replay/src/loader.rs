// SPDX-License-Identifier: MIT OR Apache-2.0
//! Replay file parsing.
//!
//! Accepted documents:
//! - a JSON array of frames
//! - an object with a `frames` array
//! - a single frame object
//! - newline-delimited (or otherwise concatenated) frame objects

use crate::frame::Frame;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors while parsing replay data
#[derive(Debug, Error)]
pub enum LoadError {
    /// The replay file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The document is not valid JSON
    #[error("Invalid replay JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is JSON but holds no frames
    #[error("Unsupported replay document: expected frames, found {0}")]
    UnsupportedShape(&'static str),
}

/// Read and parse a replay file
pub fn load_frames(path: &Path) -> Result<Vec<Frame>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Read {} bytes from {}", text.len(), path.display());
    parse_frames(&text)
}

/// Parse replay text into frames.
///
/// Individual frames are read leniently; only text that is not JSON at all,
/// or a top-level scalar, is an error.
pub fn parse_frames(text: &str) -> Result<Vec<Frame>, LoadError> {
    let mut values = serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .collect::<Result<Vec<_>, _>>()?;

    let frames = match values.len() {
        0 => Vec::new(),
        1 => frames_from_document(values.remove(0))?,
        _ => values.into_iter().map(Frame::from_value).collect(),
    };

    tracing::debug!("Parsed {} frames", frames.len());
    Ok(frames)
}

fn frames_from_document(document: Value) -> Result<Vec<Frame>, LoadError> {
    match document {
        Value::Array(entries) => Ok(entries.into_iter().map(Frame::from_value).collect()),
        Value::Object(mut object) => match object.remove("frames") {
            Some(Value::Array(entries)) => Ok(entries.into_iter().map(Frame::from_value).collect()),
            Some(_) => Err(LoadError::UnsupportedShape("non-array `frames`")),
            None => Ok(vec![Frame::from_value(Value::Object(object))]),
        },
        Value::Null => Err(LoadError::UnsupportedShape("null")),
        Value::Bool(_) => Err(LoadError::UnsupportedShape("a boolean")),
        Value::Number(_) => Err(LoadError::UnsupportedShape("a number")),
        Value::String(_) => Err(LoadError::UnsupportedShape("a string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::FrameStore;

    #[test]
    fn test_parse_array() {
        let frames = parse_frames(r#"[{"ships": []}, {"ships": [], "round": 2}]"#).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].round, Some(2));
    }

    #[test]
    fn test_parse_wrapped_frames() {
        let frames = parse_frames(r#"{"frames": [{"ships": []}]}"#).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_parse_single_frame_object() {
        let frames = parse_frames(r#"{"ships": [], "radius": 100}"#).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].radius, 100.0);
    }

    #[test]
    fn test_parse_newline_delimited() {
        let text = "{\"ships\": [], \"round\": 1}\n\n{\"ships\": [], \"round\": 2}\n{\"ships\": 5}\n";
        let frames = parse_frames(text).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].round, Some(2));
        assert!(!FrameStore::validate(&frames[2]));
    }

    #[test]
    fn test_malformed_frames_still_load() {
        let frames = parse_frames(r#"[{"ships": [{"health": 3}]}, 7, null]"#).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|frame| !FrameStore::validate(frame)));
    }

    #[test]
    fn test_empty_text() {
        assert!(parse_frames("   \n").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_frames(Path::new("/nonexistent/replay.json"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(parse_frames("{not json"), Err(LoadError::Json(_))));
        assert!(matches!(
            parse_frames("42"),
            Err(LoadError::UnsupportedShape("a number"))
        ));
        assert!(matches!(
            parse_frames(r#"{"frames": 1}"#),
            Err(LoadError::UnsupportedShape(_))
        ));
    }
}
