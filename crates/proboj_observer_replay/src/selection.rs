// SPDX-License-Identifier: MIT OR Apache-2.0
//! Selection tracking across frame changes.
//!
//! The selection is an identity (kind + id), never a reference into a
//! particular frame: entity instances are not shared between frames, so the
//! reference is re-resolved against whichever frame is current.

use crate::events::ReplayEvent;
use crate::frame::{Asteroid, EntityId, Frame, Ship, Vec2, Wormhole};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a selectable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A ship
    Ship,
    /// An asteroid
    Asteroid,
    /// A wormhole
    Wormhole,
}

impl EntityKind {
    /// Lowercase name of this kind
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ship => "ship",
            Self::Asteroid => "asteroid",
            Self::Wormhole => "wormhole",
        }
    }

    /// Name of the frame collection holding entities of this kind
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Ship => "ships",
            Self::Asteroid => "asteroids",
            Self::Wormhole => "wormholes",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of a picked entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionRef {
    /// Entity kind
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Entity ID within its kind
    pub id: EntityId,
}

impl SelectionRef {
    /// Create a new selection reference
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self { kind, id }
    }
}

/// A selection resolved against one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedEntity<'a> {
    /// Resolved ship
    Ship(&'a Ship),
    /// Resolved asteroid
    Asteroid(&'a Asteroid),
    /// Resolved wormhole
    Wormhole(&'a Wormhole),
}

impl ResolvedEntity<'_> {
    /// Kind of the resolved entity
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Ship(_) => EntityKind::Ship,
            Self::Asteroid(_) => EntityKind::Asteroid,
            Self::Wormhole(_) => EntityKind::Wormhole,
        }
    }

    /// World position of the resolved entity
    pub fn position(&self) -> Option<Vec2> {
        match self {
            Self::Ship(ship) => ship.position,
            Self::Asteroid(asteroid) => asteroid.position,
            Self::Wormhole(wormhole) => wormhole.position,
        }
    }
}

/// Holds the tracked entity and re-finds it in each frame
#[derive(Debug, Default)]
pub struct SelectionTracker {
    current: Option<SelectionRef>,
    pending_events: Vec<ReplayEvent>,
}

impl SelectionTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a reference, or clear it with `None`.
    /// Returns true when the selection actually changed.
    pub fn select(&mut self, selection: Option<SelectionRef>) -> bool {
        if self.current == selection {
            return false;
        }
        self.current = selection;
        self.pending_events
            .push(ReplayEvent::SelectionChanged(selection));
        true
    }

    /// Clear the selection
    pub fn clear(&mut self) -> bool {
        self.select(None)
    }

    /// The stored reference
    pub fn get(&self) -> Option<SelectionRef> {
        self.current
    }

    /// Check if anything is selected
    pub fn is_selected(&self) -> bool {
        self.current.is_some()
    }

    /// Look the stored reference up in `frame`. A miss keeps the reference,
    /// so the entity reappears if a later frame contains it again.
    pub fn resolve<'a>(&self, frame: &'a Frame) -> Option<ResolvedEntity<'a>> {
        let selection = self.current?;
        match selection.kind {
            EntityKind::Ship => frame.ship(selection.id).map(ResolvedEntity::Ship),
            EntityKind::Asteroid => frame.asteroid(selection.id).map(ResolvedEntity::Asteroid),
            EntityKind::Wormhole => frame.wormhole(selection.id).map(ResolvedEntity::Wormhole),
        }
    }

    /// Get pending events and clear them
    pub fn take_events(&mut self) -> Vec<ReplayEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame_with_ship(id: EntityId) -> Frame {
        Frame::from_value(json!({
            "ships": [{"id": id, "player": 0, "health": 10, "position": {"x": 0.0, "y": 0.0}}],
            "asteroids": [{"id": 1, "position": {"x": 5.0, "y": 5.0}, "size": 3.0}]
        }))
    }

    #[test]
    fn test_resolve_by_identity() {
        let mut tracker = SelectionTracker::new();
        tracker.select(Some(SelectionRef::new(EntityKind::Ship, 4)));

        let frame = frame_with_ship(4);
        let resolved = tracker.resolve(&frame).unwrap();
        assert_eq!(resolved.kind(), EntityKind::Ship);
        assert_eq!(resolved.position(), Some(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn test_miss_keeps_reference() {
        let mut tracker = SelectionTracker::new();
        tracker.select(Some(SelectionRef::new(EntityKind::Ship, 4)));

        let without = frame_with_ship(9);
        assert!(tracker.resolve(&without).is_none());
        assert!(tracker.is_selected());

        let with = frame_with_ship(4);
        assert!(tracker.resolve(&with).is_some());
    }

    #[test]
    fn test_kind_is_part_of_identity() {
        let mut tracker = SelectionTracker::new();
        tracker.select(Some(SelectionRef::new(EntityKind::Wormhole, 1)));

        // Asteroid 1 exists, wormhole 1 does not
        let frame = frame_with_ship(4);
        assert!(tracker.resolve(&frame).is_none());
    }

    #[test]
    fn test_select_emits_only_on_change() {
        let mut tracker = SelectionTracker::new();
        let selection = SelectionRef::new(EntityKind::Asteroid, 2);

        assert!(tracker.select(Some(selection)));
        assert!(!tracker.select(Some(selection)));
        assert!(tracker.clear());
        assert!(!tracker.clear());

        assert_eq!(
            tracker.take_events(),
            vec![
                ReplayEvent::SelectionChanged(Some(selection)),
                ReplayEvent::SelectionChanged(None),
            ]
        );
        assert!(tracker.take_events().is_empty());
    }

    #[test]
    fn test_selection_ref_serializes_with_type_tag() {
        let value = serde_json::to_value(SelectionRef::new(EntityKind::Asteroid, 7)).unwrap();
        assert_eq!(value, json!({"type": "asteroid", "id": 7}));
    }
}
