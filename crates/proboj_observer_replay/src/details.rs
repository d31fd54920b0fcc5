// SPDX-License-Identifier: MIT OR Apache-2.0
//! Display-ready summaries of the selected entity and of each player.
//!
//! These replace the on-screen info panels: the host decides how to show
//! them, the engine only computes them from the current frame.

use crate::frame::{AsteroidType, EntityId, Frame, ShipType, Vec2};
use crate::selection::ResolvedEntity;
use indexmap::IndexMap;
use std::f64::consts::PI;
use std::fmt;

/// Asteroid material per unit of surface
pub const MATERIAL_TO_SURFACE_RATIO: f64 = 1.0;
/// Color used when a player has none
pub const DEFAULT_PLAYER_COLOR: &str = "#ffffff";

/// What the details panel should show
#[derive(Debug, Clone, PartialEq)]
pub enum DetailsView {
    /// No entity is selected
    NothingSelected,
    /// The selected entity is absent from the current frame
    NotInFrame,
    /// The selected entity as seen in the current frame
    Entity(EntityDetails),
}

impl fmt::Display for DetailsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingSelected => f.write_str("Click on an entity to see details"),
            Self::NotInFrame => f.write_str("Selected entity not found in current frame"),
            Self::Entity(details) => write!(f, "{details}"),
        }
    }
}

/// Details of a resolved entity
#[derive(Debug, Clone, PartialEq)]
pub enum EntityDetails {
    /// Ship details
    Ship {
        /// Ship ID
        id: Option<EntityId>,
        /// Owner
        player: Option<EntityId>,
        /// Position
        position: Option<Vec2>,
        /// Health
        health: Option<f64>,
        /// Fuel
        fuel: Option<f64>,
        /// Class
        ship_type: Option<ShipType>,
        /// Carried rock
        rock: Option<f64>,
        /// Destroyed flag
        destroyed: bool,
    },
    /// Asteroid details
    Asteroid {
        /// Asteroid ID
        id: Option<EntityId>,
        /// Position
        position: Option<Vec2>,
        /// Radius
        size: f64,
        /// Material content
        material: f64,
        /// Material type
        asteroid_type: Option<AsteroidType>,
        /// Owner, when owned
        owner: Option<EntityId>,
        /// Mined surface
        surface: Option<f64>,
    },
    /// Wormhole details
    Wormhole {
        /// Wormhole ID
        id: Option<EntityId>,
        /// Position
        position: Option<Vec2>,
        /// Paired exit ID
        target_id: Option<EntityId>,
        /// Where the exit sits in this frame
        exit_position: Option<Vec2>,
    },
}

impl EntityDetails {
    /// Build details for an entity resolved in `frame`
    pub fn describe(entity: ResolvedEntity<'_>, frame: &Frame) -> Self {
        match entity {
            ResolvedEntity::Ship(ship) => Self::Ship {
                id: ship.id,
                player: ship.player,
                position: ship.position,
                health: ship.health,
                fuel: ship.fuel,
                ship_type: ship.ship_type,
                rock: ship.rock,
                destroyed: ship.is_destroyed(),
            },
            ResolvedEntity::Asteroid(asteroid) => {
                let size = asteroid.size.unwrap_or_default();
                Self::Asteroid {
                    id: asteroid.id,
                    position: asteroid.position,
                    size,
                    material: asteroid_material(size),
                    asteroid_type: asteroid.asteroid_type,
                    owner: asteroid.owner(),
                    surface: asteroid.surface,
                }
            }
            ResolvedEntity::Wormhole(wormhole) => Self::Wormhole {
                id: wormhole.id,
                position: wormhole.position,
                target_id: wormhole.target_id,
                exit_position: frame.wormhole_exit(wormhole).and_then(|exit| exit.position),
            },
        }
    }
}

/// Material held by an asteroid of the given size
pub fn asteroid_material(size: f64) -> f64 {
    size.powi(2) * PI * MATERIAL_TO_SURFACE_RATIO
}

struct Field<T>(Option<T>);

impl<T: fmt::Display> fmt::Display for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => write!(f, "{value}"),
            None => f.write_str("?"),
        }
    }
}

struct Position(Option<Vec2>);

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(position) => write!(f, "({}, {})", position.x.round(), position.y.round()),
            None => f.write_str("(?, ?)"),
        }
    }
}

impl fmt::Display for EntityDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ship {
                id,
                player,
                position,
                health,
                fuel,
                ship_type,
                rock,
                destroyed,
            } => {
                write!(
                    f,
                    "Ship ID: {} P{} Pos: {} HP: {} Fuel: {} Type: {} Rock: {}",
                    Field(*id),
                    Field(*player),
                    Position(*position),
                    Field(*health),
                    Field(*fuel),
                    Field(*ship_type),
                    Field(*rock),
                )?;
                if *destroyed {
                    f.write_str(" [destroyed]")?;
                }
                Ok(())
            }
            Self::Asteroid {
                id,
                position,
                size,
                material,
                asteroid_type,
                owner,
                surface,
            } => {
                write!(
                    f,
                    "Asteroid ID: {} Pos: {} Size: {size:.2} Material: {material:.2} Type: {}",
                    Field(*id),
                    Position(*position),
                    Field(*asteroid_type),
                )?;
                if let Some(owner) = owner {
                    write!(f, " Owner: P{owner}")?;
                }
                if let Some(surface) = surface {
                    write!(f, " Surface: {surface}")?;
                }
                Ok(())
            }
            Self::Wormhole {
                id,
                position,
                target_id,
                exit_position,
            } => {
                write!(
                    f,
                    "Wormhole ID: {} Pos: {} Target: {}",
                    Field(*id),
                    Position(*position),
                    Field(*target_id),
                )?;
                if exit_position.is_some() {
                    write!(f, " Exit: {}", Position(*exit_position))?;
                }
                Ok(())
            }
        }
    }
}

/// Per-player panel data
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSummary {
    /// Display name
    pub name: String,
    /// Score
    pub score: f64,
    /// Panel color
    pub color: String,
    /// Rock counter
    pub rock: Option<f64>,
    /// Fuel counter
    pub fuel: Option<f64>,
    /// Ships owned in this frame
    pub ships: usize,
}

impl fmt::Display for PlayerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} score {} rock {} fuel {} ships {}",
            self.name,
            self.score,
            Field(self.rock),
            Field(self.fuel),
            self.ships
        )
    }
}

/// Summaries of every player in `frame`, in frame order
pub fn player_summaries(frame: &Frame) -> IndexMap<EntityId, PlayerSummary> {
    frame
        .players()
        .filter_map(|player| {
            let id = player.id?;
            let ships = frame.ships().filter(|ship| ship.player == Some(id)).count();
            let summary = PlayerSummary {
                name: player.name.clone().unwrap_or_else(|| format!("Player {id}")),
                score: player.score.unwrap_or_default(),
                color: player
                    .color
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PLAYER_COLOR.to_string()),
                rock: player.rock(),
                fuel: player.fuel(),
                ships,
            };
            Some((id, summary))
        })
        .collect()
}

/// Color of a player in `frame`, white when unknown
pub fn player_color(frame: &Frame, player_id: EntityId) -> &str {
    frame
        .player(player_id)
        .and_then(|player| player.color.as_deref())
        .unwrap_or(DEFAULT_PLAYER_COLOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame() -> Frame {
        Frame::from_value(json!({
            "ships": [
                {"id": 1, "player": 0, "position": {"x": 10.4, "y": 19.6}, "health": 0, "fuel": 5, "type": 2, "rock": 3},
                {"id": 2, "player": 0, "position": {"x": 0, "y": 0}, "health": 9, "type": 0},
                {"id": 3, "player": 1, "position": {"x": 0, "y": 0}, "health": 9, "type": 0}
            ],
            "asteroids": [{"id": 5, "position": {"x": 1, "y": 2}, "size": 2.0, "type": 0, "owner_id": 1, "surface": 4}],
            "wormholes": [
                {"id": 7, "target_id": 8, "position": {"x": 0, "y": 0}},
                {"id": 8, "target_id": 7, "position": {"x": 100, "y": 0}}
            ],
            "players": [
                {"id": 1, "name": "beta", "score": 2, "rock": 10, "fuel": 20},
                {"id": 0, "name": "alpha", "color": "#00ff00", "mothership": {"rock": 1, "fuel": 2}}
            ]
        }))
    }

    #[test]
    fn test_ship_details() {
        let frame = frame();
        let ship = frame.ship(1).unwrap();
        let details = EntityDetails::describe(ResolvedEntity::Ship(ship), &frame);
        let text = details.to_string();
        assert!(text.starts_with("Ship ID: 1 P0 Pos: (10, 20)"));
        assert!(text.contains("Type: DrillShip"));
        assert!(text.ends_with("[destroyed]"));
    }

    #[test]
    fn test_asteroid_details() {
        let frame = frame();
        let asteroid = frame.asteroid(5).unwrap();
        let details = EntityDetails::describe(ResolvedEntity::Asteroid(asteroid), &frame);
        match &details {
            EntityDetails::Asteroid { material, owner, .. } => {
                assert!((material - 4.0 * PI).abs() < 1e-9);
                assert_eq!(*owner, Some(1));
            }
            other => panic!("unexpected details {other:?}"),
        }
        assert!(details.to_string().contains("Material: 12.57"));
    }

    #[test]
    fn test_wormhole_details_include_exit() {
        let frame = frame();
        let wormhole = frame.wormhole(7).unwrap();
        let details = EntityDetails::describe(ResolvedEntity::Wormhole(wormhole), &frame);
        assert!(details.to_string().ends_with("Target: 8 Exit: (100, 0)"));
    }

    #[test]
    fn test_details_view_messages() {
        assert_eq!(
            DetailsView::NothingSelected.to_string(),
            "Click on an entity to see details"
        );
        assert_eq!(
            DetailsView::NotInFrame.to_string(),
            "Selected entity not found in current frame"
        );
    }

    #[test]
    fn test_player_summaries_keep_frame_order() {
        let summaries = player_summaries(&frame());
        let ids: Vec<_> = summaries.keys().copied().collect();
        assert_eq!(ids, vec![1, 0]);

        let alpha = &summaries[&0];
        assert_eq!(alpha.ships, 2);
        assert_eq!(alpha.rock, Some(1.0));
        assert_eq!(alpha.color, "#00ff00");

        let beta = &summaries[&1];
        assert_eq!(beta.fuel, Some(20.0));
        assert_eq!(beta.color, DEFAULT_PLAYER_COLOR);
    }

    #[test]
    fn test_player_color_defaults_to_white() {
        let frame = frame();
        assert_eq!(player_color(&frame, 0), "#00ff00");
        assert_eq!(player_color(&frame, 42), DEFAULT_PLAYER_COLOR);
    }
}
