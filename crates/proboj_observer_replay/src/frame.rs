// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame schema - one captured game-state snapshot.
//!
//! Frames are read leniently: a field with the wrong JSON type reads as
//! absent instead of failing the whole frame. Whether a frame is usable is
//! decided later by [`FrameStore::validate`](crate::store::FrameStore::validate),
//! never by the parser.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifier of a ship, asteroid, wormhole or player inside a frame
pub type EntityId = i64;

/// 2D vector in world space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vec2 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
}

impl Vec2 {
    /// Create a new vector
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(self, other: Vec2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Ship class as encoded by the game server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ShipType {
    /// Type 0
    MotherShip,
    /// Type 1
    SuckerShip,
    /// Type 2
    DrillShip,
    /// Type 3
    TankerShip,
    /// Type 4
    TruckShip,
    /// Type 5
    BattleShip,
    /// Any code the observer does not know about
    Unknown(i64),
}

impl ShipType {
    /// Display name of this ship class
    pub fn name(&self) -> &'static str {
        match self {
            Self::MotherShip => "MotherShip",
            Self::SuckerShip => "SuckerShip",
            Self::DrillShip => "DrillShip",
            Self::TankerShip => "TankerShip",
            Self::TruckShip => "TruckShip",
            Self::BattleShip => "BattleShip",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl From<i64> for ShipType {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::MotherShip,
            1 => Self::SuckerShip,
            2 => Self::DrillShip,
            3 => Self::TankerShip,
            4 => Self::TruckShip,
            5 => Self::BattleShip,
            other => Self::Unknown(other),
        }
    }
}

impl From<ShipType> for i64 {
    fn from(ship_type: ShipType) -> Self {
        match ship_type {
            ShipType::MotherShip => 0,
            ShipType::SuckerShip => 1,
            ShipType::DrillShip => 2,
            ShipType::TankerShip => 3,
            ShipType::TruckShip => 4,
            ShipType::BattleShip => 5,
            ShipType::Unknown(code) => code,
        }
    }
}

impl fmt::Display for ShipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "Unknown ({code})"),
            known => f.write_str(known.name()),
        }
    }
}

/// Asteroid material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum AsteroidType {
    /// Rock asteroid (type 0)
    Rock,
    /// Fuel asteroid (type 1)
    Fuel,
    /// Unrecognized code
    Unknown(i64),
}

impl From<i64> for AsteroidType {
    fn from(code: i64) -> Self {
        match code {
            0 => Self::Rock,
            1 => Self::Fuel,
            other => Self::Unknown(other),
        }
    }
}

impl From<AsteroidType> for i64 {
    fn from(asteroid_type: AsteroidType) -> Self {
        match asteroid_type {
            AsteroidType::Rock => 0,
            AsteroidType::Fuel => 1,
            AsteroidType::Unknown(code) => code,
        }
    }
}

impl fmt::Display for AsteroidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rock => f.write_str("Rock"),
            Self::Fuel => f.write_str("Fuel"),
            Self::Unknown(code) => write!(f, "Unknown ({code})"),
        }
    }
}

/// A ship as captured in one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    /// Ship ID
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<EntityId>,
    /// Owning player ID
    #[serde(default, deserialize_with = "lenient")]
    pub player: Option<EntityId>,
    /// World position
    #[serde(default, deserialize_with = "lenient")]
    pub position: Option<Vec2>,
    /// Heading / velocity vector
    #[serde(default, deserialize_with = "lenient")]
    pub vector: Option<Vec2>,
    /// Remaining health
    #[serde(default, deserialize_with = "lenient")]
    pub health: Option<f64>,
    /// Remaining fuel
    #[serde(default, deserialize_with = "lenient")]
    pub fuel: Option<f64>,
    /// Ship class
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub ship_type: Option<ShipType>,
    /// Carried rock
    #[serde(default, deserialize_with = "lenient")]
    pub rock: Option<f64>,
    /// Explicit destroyed flag
    #[serde(default, deserialize_with = "lenient")]
    pub is_destroyed: Option<bool>,
}

impl Ship {
    /// Whether the ship defines every field the observer relies on
    pub fn is_complete(&self) -> bool {
        self.health.is_some() && self.position.is_some() && self.player.is_some()
    }

    /// A ship is destroyed when its health is spent or the server flagged it
    pub fn is_destroyed(&self) -> bool {
        self.is_destroyed == Some(true) || self.health.is_some_and(|health| health <= 0.0)
    }

    /// Whether this is a player's mothership
    pub fn is_mothership(&self) -> bool {
        self.ship_type == Some(ShipType::MotherShip)
    }
}

/// An asteroid as captured in one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asteroid {
    /// Asteroid ID
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<EntityId>,
    /// World position
    #[serde(default, deserialize_with = "lenient")]
    pub position: Option<Vec2>,
    /// Drift vector
    #[serde(default, deserialize_with = "lenient")]
    pub vector: Option<Vec2>,
    /// Radius
    #[serde(default, deserialize_with = "lenient")]
    pub size: Option<f64>,
    /// Material
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub asteroid_type: Option<AsteroidType>,
    /// Owning player, -1 when unowned
    #[serde(default, deserialize_with = "lenient")]
    pub owner_id: Option<EntityId>,
    /// Mined surface
    #[serde(default, deserialize_with = "lenient")]
    pub surface: Option<f64>,
}

impl Asteroid {
    /// Owning player, if any
    pub fn owner(&self) -> Option<EntityId> {
        self.owner_id.filter(|owner| *owner != -1)
    }
}

/// One end of a wormhole pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wormhole {
    /// Wormhole ID
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<EntityId>,
    /// ID of the paired exit
    #[serde(default, deserialize_with = "lenient")]
    pub target_id: Option<EntityId>,
    /// World position
    #[serde(default, deserialize_with = "lenient")]
    pub position: Option<Vec2>,
}

/// A player as captured in one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Player ID
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<EntityId>,
    /// Display name
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// CSS-style color string
    #[serde(default, deserialize_with = "lenient")]
    pub color: Option<String>,
    /// Current score
    #[serde(default, deserialize_with = "lenient")]
    pub score: Option<f64>,
    /// Whether the player is still in the game
    #[serde(default, deserialize_with = "lenient")]
    pub alive: Option<bool>,
    /// Rock counter when reported directly on the player
    #[serde(default, deserialize_with = "lenient")]
    pub rock: Option<f64>,
    /// Fuel counter when reported directly on the player
    #[serde(default, deserialize_with = "lenient")]
    pub fuel: Option<f64>,
    /// Nested mothership carrying the resource counters
    #[serde(default, deserialize_with = "lenient")]
    pub mothership: Option<Ship>,
}

impl Player {
    /// Rock counter, read directly or from the nested mothership
    pub fn rock(&self) -> Option<f64> {
        self.rock
            .or_else(|| self.mothership.as_ref().and_then(|ship| ship.rock))
    }

    /// Fuel counter, read directly or from the nested mothership
    pub fn fuel(&self) -> Option<f64> {
        self.fuel
            .or_else(|| self.mothership.as_ref().and_then(|ship| ship.fuel))
    }
}

/// One complete game-state snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Ship slots. `None` when the field is missing or not a sequence;
    /// `null` entries are kept as empty slots.
    #[serde(default, deserialize_with = "ship_slots")]
    pub ships: Option<Vec<Option<Ship>>>,
    /// Asteroid slots
    #[serde(default, deserialize_with = "entity_slots")]
    pub asteroids: Vec<Option<Asteroid>>,
    /// Wormhole slots
    #[serde(default, deserialize_with = "entity_slots")]
    pub wormholes: Vec<Option<Wormhole>>,
    /// Player slots
    #[serde(default, deserialize_with = "entity_slots")]
    pub players: Vec<Option<Player>>,
    /// Play-field radius
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub radius: f64,
    /// Game round this frame was captured at
    #[serde(default, deserialize_with = "lenient")]
    pub round: Option<i64>,
}

impl Frame {
    /// The canonical empty frame handed out when no usable frame exists
    pub fn empty() -> Self {
        Self {
            ships: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Convert an arbitrary JSON value into a frame. Never fails; anything
    /// that is not an object becomes a frame without a ship list.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    /// Ships present in this frame, skipping empty slots
    pub fn ships(&self) -> impl Iterator<Item = &Ship> {
        self.ships.iter().flatten().flatten()
    }

    /// Asteroids present in this frame
    pub fn asteroids(&self) -> impl Iterator<Item = &Asteroid> {
        self.asteroids.iter().flatten()
    }

    /// Wormholes present in this frame
    pub fn wormholes(&self) -> impl Iterator<Item = &Wormhole> {
        self.wormholes.iter().flatten()
    }

    /// Players present in this frame
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().flatten()
    }

    /// Look up a ship by ID
    pub fn ship(&self, id: EntityId) -> Option<&Ship> {
        self.ships().find(|ship| ship.id == Some(id))
    }

    /// Look up an asteroid by ID
    pub fn asteroid(&self, id: EntityId) -> Option<&Asteroid> {
        self.asteroids().find(|asteroid| asteroid.id == Some(id))
    }

    /// Look up a wormhole by ID
    pub fn wormhole(&self, id: EntityId) -> Option<&Wormhole> {
        self.wormholes().find(|wormhole| wormhole.id == Some(id))
    }

    /// Look up a player by ID
    pub fn player(&self, id: EntityId) -> Option<&Player> {
        self.players().find(|player| player.id == Some(id))
    }

    /// Position of a player's mothership: the ship list first, then the
    /// mothership nested in the player record.
    pub fn mothership_position(&self, player_id: EntityId) -> Option<Vec2> {
        self.ships()
            .find(|ship| ship.player == Some(player_id) && ship.is_mothership())
            .and_then(|ship| ship.position)
            .or_else(|| {
                self.player(player_id)
                    .and_then(|player| player.mothership.as_ref())
                    .and_then(|ship| ship.position)
            })
    }

    /// The exit of a wormhole: the wormhole with its `target_id` sitting at
    /// a different position.
    pub fn wormhole_exit(&self, wormhole: &Wormhole) -> Option<&Wormhole> {
        let target = wormhole.target_id?;
        self.wormholes()
            .find(|other| other.id == Some(target) && other.position != wormhole.position)
    }
}

/// Read a field, treating a value of the wrong shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Ship list: a non-sequence reads as missing, and a non-object entry reads
/// as a ship with every field absent so validation rejects it.
fn ship_slots<'de, D>(deserializer: D) -> Result<Option<Vec<Option<Ship>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };

    Ok(Some(
        entries
            .into_iter()
            .map(|entry| match entry {
                Value::Null => None,
                other => Some(serde_json::from_value::<Ship>(other).unwrap_or_default()),
            })
            .collect(),
    ))
}

/// Unvalidated entity list: malformed entries become empty slots.
fn entity_slots<'de, D, T>(deserializer: D) -> Result<Vec<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .map(|entry| serde_json::from_value::<Option<T>>(entry).ok().flatten())
        .collect())
}
