//! Component structs shared by every entity kind, plus the per-kind state.

use std::fmt;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::EntityId;
use crate::geometry::{wrap_coordinate, HitArea, HitShape, WorldSize};

bitflags::bitflags! {
    /// Axes on which an entity re-enters from the opposite edge.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct WrapMode: u8 {
        /// Wrap on the x axis.
        const HORIZONTAL = 0b01;
        /// Wrap on the y axis.
        const VERTICAL = 0b10;
        /// Wrap on both axes.
        const BOTH = Self::HORIZONTAL.bits() | Self::VERTICAL.bits();
    }
}

// =============================================================================
// Body
// =============================================================================

/// Kinematic state and collision outline of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    /// Center in world units
    pub position: DVec2,
    /// Units per second
    pub velocity: DVec2,
    /// Heading in radians
    pub rotation: f64,
    /// Radians per second
    pub rotation_speed: f64,
    /// Axes that wrap
    pub wrap: WrapMode,
    shape: HitShape,
}

impl Body {
    /// Creates a body at rest.
    #[must_use]
    pub fn new(area: HitArea, position: DVec2, rotation: f64, wrap: WrapMode) -> Self {
        Self {
            position,
            velocity: DVec2::ZERO,
            rotation,
            rotation_speed: 0.0,
            wrap,
            shape: HitShape::new(area, position, rotation),
        }
    }

    /// Builder that sets the initial velocity.
    #[must_use]
    pub fn with_velocity(mut self, velocity: DVec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Advances position and rotation by `dt` seconds.
    pub fn integrate(&mut self, dt: f64) {
        self.position += self.velocity * dt;
        self.rotation += self.rotation_speed * dt;
    }

    /// Wraps the position on each wrapped axis, using the bounding radius
    /// as the margin.
    pub fn wrap_into(&mut self, world: WorldSize) {
        let margin = self.bounding_radius();
        if self.wrap.contains(WrapMode::HORIZONTAL) {
            self.position.x = wrap_coordinate(self.position.x, f64::from(world.width), margin);
        }
        if self.wrap.contains(WrapMode::VERTICAL) {
            self.position.y = wrap_coordinate(self.position.y, f64::from(world.height), margin);
        }
    }

    /// Integrates, wraps, and re-derives the outline.
    pub fn step(&mut self, dt: f64, world: WorldSize) {
        self.integrate(dt);
        self.wrap_into(world);
        self.refresh_shape();
    }

    /// Re-derives the world outline if the body moved or turned.
    pub fn refresh_shape(&mut self) {
        self.shape.refresh(self.position, self.rotation);
    }

    /// Returns the placed collision outline.
    #[must_use]
    pub const fn shape(&self) -> &HitShape {
        &self.shape
    }

    /// Returns the bounding radius of the outline.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.shape.bounding_radius()
    }

    /// Tests whether two bodies overlap.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.shape.intersects(&other.shape)
    }

    /// Returns `true` if the body is fully past the left or right edge.
    #[must_use]
    pub fn outside_horizontally(&self, world: WorldSize) -> bool {
        let margin = self.bounding_radius();
        self.position.x < -margin || self.position.x > f64::from(world.width) + margin
    }
}

// =============================================================================
// Per-kind State
// =============================================================================

/// Why an entity was removed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestroyCause {
    /// Collided with the ship
    Ship,
    /// Hit by a ship projectile
    ShipProjectile,
    /// Hit by a UFO projectile
    UfoProjectile,
    /// Collided with a UFO
    Ufo,
    /// Collided with an asteroid
    Asteroid,
    /// Projectile lifetime ran out
    Expired,
    /// UFO flew off the side of the world
    LeftWorld,
    /// Game was reset
    Reset,
}

impl DestroyCause {
    /// Returns `true` if the cause was a collision with another entity.
    #[must_use]
    pub const fn is_collision(self) -> bool {
        matches!(
            self,
            Self::Ship | Self::ShipProjectile | Self::UfoProjectile | Self::Ufo | Self::Asteroid
        )
    }

    /// Returns `true` if the ship or one of its projectiles did the damage,
    /// which is what makes a destruction worth points.
    #[must_use]
    pub const fn awards_points(self) -> bool {
        matches!(self, Self::Ship | Self::ShipProjectile)
    }
}

/// UFO size class.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UfoClass {
    /// Slow, fires at random
    Large,
    /// Fast, aims
    Small,
}

impl fmt::Display for UfoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Large => write!(f, "Large"),
            Self::Small => write!(f, "Small"),
        }
    }
}

/// Who fired a projectile.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileOwner {
    /// The player's ship
    Ship,
    /// A UFO, which may no longer exist
    Ufo(EntityId),
}

/// State specific to the ship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShipState {
    /// In hyperspace: not drawn, not updated, not collidable
    pub hidden: bool,
    /// Collisions are ignored until this timestamp
    pub invulnerable_until: f64,
}

/// State specific to an asteroid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AsteroidState {
    /// Size generation, 0 is largest
    pub generation: u8,
}

/// State specific to a UFO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UfoState {
    /// Size class
    pub class: UfoClass,
    /// Timestamp of the next shot
    pub next_fire_at: f64,
    /// Timestamp of the next vertical direction change
    pub next_shift_at: f64,
}

/// State specific to a projectile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileState {
    /// Who fired it
    pub owner: ProjectileOwner,
    /// Timestamp at which it disappears
    pub expires_at: f64,
}
