//! Entity types for the Rockburst simulation.
//!
//! - [`EntityId`]: Unique identifier for entities
//! - [`EntityKind`]: Kind tag, which also fixes the update priority
//! - [`EntityState`]: Closed sum of per-kind state
//! - [`Entity`]: Body plus state under one id
//!
//! # Example
//!
//! ```
//! use glam::DVec2;
//! use rockburst_core::entity::{AsteroidState, Body, Entity, EntityId, EntityKind, EntityState, WrapMode};
//! use rockburst_core::geometry::HitArea;
//!
//! let rock = Entity::new(
//!     EntityId::new(42),
//!     Body::new(HitArea::regular(9, 40.0), DVec2::new(10.0, 10.0), 0.0, WrapMode::BOTH),
//!     EntityState::Asteroid(AsteroidState { generation: 0 }),
//! );
//!
//! assert_eq!(rock.id().as_u64(), 42);
//! assert_eq!(rock.kind(), EntityKind::Asteroid);
//! ```

pub mod components;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tick_queue::TickPriority;

pub use components::{
    AsteroidState, Body, DestroyCause, ProjectileOwner, ProjectileState, ShipState, UfoClass,
    UfoState, WrapMode,
};

/// Unique identifier for an entity.
///
/// `EntityId` is a newtype wrapper around `u64`. Ids are assigned
/// monotonically by the arena and never reused within a game, so sorting by
/// id is sorting by creation order.
///
/// # Example
///
/// ```
/// use rockburst_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    ///
    /// # Arguments
    ///
    /// * `id` - The raw identifier value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Entity kind tag.
///
/// The kind decides the update priority: the ship moves first, then UFOs,
/// then asteroids, then projectiles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player's ship
    Ship,
    /// Enemy saucer
    Ufo,
    /// Rock of some generation
    Asteroid,
    /// Shot fired by the ship or a UFO
    Projectile,
}

impl EntityKind {
    /// Returns the tick queue priority for this kind.
    #[must_use]
    pub const fn priority(self) -> TickPriority {
        match self {
            Self::Ship => TickPriority::new(0),
            Self::Ufo => TickPriority::new(1),
            Self::Asteroid => TickPriority::new(2),
            Self::Projectile => TickPriority::new(3),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ship => write!(f, "Ship"),
            Self::Ufo => write!(f, "Ufo"),
            Self::Asteroid => write!(f, "Asteroid"),
            Self::Projectile => write!(f, "Projectile"),
        }
    }
}

/// Per-kind state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityState {
    /// Ship state
    Ship(ShipState),
    /// Asteroid state
    Asteroid(AsteroidState),
    /// UFO state
    Ufo(UfoState),
    /// Projectile state
    Projectile(ProjectileState),
}

impl EntityState {
    /// Returns the kind tag matching this variant.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Ship(_) => EntityKind::Ship,
            Self::Asteroid(_) => EntityKind::Asteroid,
            Self::Ufo(_) => EntityKind::Ufo,
            Self::Projectile(_) => EntityKind::Projectile,
        }
    }
}

/// A live entity: id, body, and per-kind state.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    /// Kinematics and outline
    pub body: Body,
    /// Per-kind state
    pub state: EntityState,
}

impl Entity {
    /// Creates an entity.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier for this entity
    /// * `body` - Initial kinematic state
    /// * `state` - Per-kind state
    #[must_use]
    pub const fn new(id: EntityId, body: Body, state: EntityState) -> Self {
        Self { id, body, state }
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's kind.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.state.kind()
    }

    /// Returns the ship state if this is the ship.
    #[must_use]
    pub const fn as_ship(&self) -> Option<&ShipState> {
        match &self.state {
            EntityState::Ship(s) => Some(s),
            _ => None,
        }
    }

    /// Returns mutable ship state if this is the ship.
    #[must_use]
    pub fn as_ship_mut(&mut self) -> Option<&mut ShipState> {
        match &mut self.state {
            EntityState::Ship(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the asteroid state if this is an asteroid.
    #[must_use]
    pub const fn as_asteroid(&self) -> Option<&AsteroidState> {
        match &self.state {
            EntityState::Asteroid(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the UFO state if this is a UFO.
    #[must_use]
    pub const fn as_ufo(&self) -> Option<&UfoState> {
        match &self.state {
            EntityState::Ufo(s) => Some(s),
            _ => None,
        }
    }

    /// Returns mutable UFO state if this is a UFO.
    #[must_use]
    pub fn as_ufo_mut(&mut self) -> Option<&mut UfoState> {
        match &mut self.state {
            EntityState::Ufo(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the projectile state if this is a projectile.
    #[must_use]
    pub const fn as_projectile(&self) -> Option<&ProjectileState> {
        match &self.state {
            EntityState::Projectile(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;
    use crate::geometry::HitArea;

    fn rock(id: u64) -> Entity {
        Entity::new(
            EntityId::new(id),
            Body::new(HitArea::Circle(1.0), DVec2::ZERO, 0.0, WrapMode::BOTH),
            EntityState::Asteroid(AsteroidState { generation: 1 }),
        )
    }

    mod entity_id_tests {
        use super::*;

        #[test]
        fn ordering() {
            let mut ids = vec![EntityId::new(3), EntityId::new(1), EntityId::new(2)];
            ids.sort();
            assert_eq!(ids, vec![EntityId::new(1), EntityId::new(2), EntityId::new(3)]);
        }

        #[test]
        fn debug_format() {
            assert_eq!(format!("{:?}", EntityId::new(42)), "EntityId(42)");
        }

        #[test]
        fn display_format() {
            assert_eq!(format!("{}", EntityId::new(42)), "42");
        }

        #[test]
        fn u64_conversions() {
            let id: EntityId = 42u64.into();
            let raw: u64 = id.into();
            assert_eq!(raw, 42);
        }

        #[test]
        fn serialization_roundtrip() {
            let id = EntityId::new(12345);
            let json = serde_json::to_string(&id).unwrap();
            let deserialized: EntityId = serde_json::from_str(&json).unwrap();
            assert_eq!(id, deserialized);
        }
    }

    mod entity_kind_tests {
        use super::*;

        #[test]
        fn priorities_follow_update_order() {
            assert!(EntityKind::Ship.priority() < EntityKind::Ufo.priority());
            assert!(EntityKind::Ufo.priority() < EntityKind::Asteroid.priority());
            assert!(EntityKind::Asteroid.priority() < EntityKind::Projectile.priority());
        }

        #[test]
        fn display_format() {
            assert_eq!(format!("{}", EntityKind::Ufo), "Ufo");
            assert_eq!(format!("{}", EntityKind::Projectile), "Projectile");
        }
    }

    mod entity_tests {
        use super::*;

        #[test]
        fn kind_follows_state() {
            let entity = rock(1);
            assert_eq!(entity.kind(), EntityKind::Asteroid);
            assert_eq!(entity.as_asteroid().map(|a| a.generation), Some(1));
            assert!(entity.as_ship().is_none());
            assert!(entity.as_ufo().is_none());
            assert!(entity.as_projectile().is_none());
        }

        #[test]
        fn mutable_accessors_match_variant() {
            let mut entity = rock(2);
            assert!(entity.as_ship_mut().is_none());
            assert!(entity.as_ufo_mut().is_none());
        }
    }
}
