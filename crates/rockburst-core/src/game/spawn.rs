//! Entity construction and placement.

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::DVec2;
use tracing::debug;

use super::{Game, CHILDREN_COUNT};
use crate::entity::{
    AsteroidState, Body, EntityId, EntityKind, EntityState, ProjectileOwner, ProjectileState,
    ShipState, UfoClass, UfoState, WrapMode,
};
use crate::events::GameEvent;
use crate::geometry::HitArea;

/// Sides of an asteroid outline.
const ASTEROID_SIDES: u32 = 9;

/// Ship outline, nose along +x.
fn ship_area() -> HitArea {
    HitArea::Polygon(vec![
        DVec2::new(14.0, 0.0),
        DVec2::new(-10.0, -9.0),
        DVec2::new(-10.0, 9.0),
    ])
}

/// Flattened hexagon whose bounding radius equals `radius`.
fn ufo_area(radius: f64) -> HitArea {
    HitArea::Polygon(
        [
            (1.0, 0.0),
            (0.5, 0.4),
            (-0.5, 0.4),
            (-1.0, 0.0),
            (-0.5, -0.4),
            (0.5, -0.4),
        ]
        .into_iter()
        .map(|(x, y)| DVec2::new(x, y) * radius)
        .collect(),
    )
}

impl Game {
    pub(super) fn spawn_ship(&mut self, position: DVec2) -> EntityId {
        let body = Body::new(ship_area(), position, -FRAC_PI_2, WrapMode::BOTH);
        let id = self.insert_entity(body, EntityState::Ship(ShipState::default()));
        self.emit(GameEvent::ShipCreated { id });
        id
    }

    pub(super) fn spawn_asteroid(
        &mut self,
        position: DVec2,
        velocity: DVec2,
        generation: u8,
    ) -> EntityId {
        let radius = self.config.asteroid_radii[usize::from(generation)];
        let rotation = self.rng.next_angle();
        let rotation_speed = self.rng.next_float(-1.0, 1.0);

        let mut body = Body::new(
            HitArea::regular(ASTEROID_SIDES, radius),
            position,
            rotation,
            WrapMode::BOTH,
        )
        .with_velocity(velocity);
        body.rotation_speed = rotation_speed;

        let id = self.insert_entity(body, EntityState::Asteroid(AsteroidState { generation }));
        self.emit(GameEvent::AsteroidCreated { id, generation });
        id
    }

    /// Random velocity for an asteroid of `generation` on the current level.
    fn asteroid_velocity(&mut self, angle: f64, generation: u8) -> DVec2 {
        let (min, max) = self.config.asteroid_speeds[usize::from(generation)];
        let speed = self.rng.next_float(min, max) * self.config.speed_factor(self.state.level);
        DVec2::from_angle(angle) * speed
    }

    /// Spawns the asteroids for the current level, away from the ship.
    pub(super) fn spawn_level_asteroids(&mut self) {
        let count = self.config.asteroid_count(self.state.level);
        for _ in 0..count {
            let position = self.find_location(Self::is_clear_of_ship);
            let angle = self.rng.next_angle();
            let velocity = self.asteroid_velocity(angle, 0);
            self.spawn_asteroid(position, velocity, 0);
        }
        debug!(level = self.state.level, count, "asteroids spawned");
    }

    /// Spawns the fragments of a split asteroid.
    ///
    /// Fragment headings are spread evenly around a random base angle and
    /// jittered, but siblings stay at least `child_min_separation` apart.
    pub(super) fn spawn_children(&mut self, origin: DVec2, generation: u8) {
        #[allow(clippy::cast_precision_loss)]
        let slice = TAU / CHILDREN_COUNT as f64;
        let jitter = ((slice - self.config.child_min_separation) / 2.0).max(0.0);
        let base = self.rng.next_angle();

        for i in 0..CHILDREN_COUNT {
            #[allow(clippy::cast_precision_loss)]
            let angle = base + i as f64 * slice + self.rng.next_float(-jitter, jitter);
            let velocity = self.asteroid_velocity(angle, generation);
            self.spawn_asteroid(origin, velocity, generation);
        }
    }

    pub(super) fn spawn_ufo(&mut self) -> EntityId {
        let score = self.state.score;
        let class = if self.rng.chance(self.config.small_ufo_chance(score)) {
            UfoClass::Small
        } else {
            UfoClass::Large
        };
        let tuning = self.config.ufo_class(class).clone();
        let world = self.state.world_size;
        let now = self.state.timestamp;

        let from_left = self.rng.next_bool();
        let y = self.rng.next_float(0.0, f64::from(world.height));
        #[allow(clippy::cast_precision_loss)]
        let vertical = self.rng.next_int(-1, 1) as f64;

        let (x, vx) = if from_left {
            (0.0, tuning.speed)
        } else {
            (f64::from(world.width), -tuning.speed)
        };
        let velocity = DVec2::new(vx, vertical * tuning.speed * self.config.ufo_vertical_speed_ratio);
        let body = Body::new(ufo_area(tuning.radius), DVec2::new(x, y), 0.0, WrapMode::VERTICAL)
            .with_velocity(velocity);
        let state = UfoState {
            class,
            next_fire_at: now + tuning.fire_interval_ms,
            next_shift_at: now + self.config.ufo_shift_interval_ms,
        };

        let id = self.insert_entity(body, EntityState::Ufo(state));
        debug!(%id, %class, from_left, at = now, "ufo spawned");
        self.emit(GameEvent::UfoCreated { id, class });
        id
    }

    pub(super) fn spawn_projectile(
        &mut self,
        position: DVec2,
        velocity: DVec2,
        owner: ProjectileOwner,
        expires_at: f64,
    ) -> EntityId {
        let body = Body::new(
            HitArea::Circle(self.config.projectile_radius),
            position,
            0.0,
            WrapMode::BOTH,
        )
        .with_velocity(velocity);
        let id = self.insert_entity(body, EntityState::Projectile(ProjectileState { owner, expires_at }));
        self.emit(GameEvent::ProjectileCreated { id, owner });
        id
    }

    // =========================================================================
    // Placement
    // =========================================================================

    fn random_point(&mut self) -> DVec2 {
        let world = self.state.world_size;
        let x = self.rng.next_float(0.0, f64::from(world.width));
        let y = self.rng.next_float(0.0, f64::from(world.height));
        DVec2::new(x, y)
    }

    /// Draws random points until one is accepted, up to
    /// `placement_attempts` times. Falls back to the last point drawn, or to
    /// the world center when no attempt is configured.
    pub(super) fn find_location(&mut self, accept: fn(&Self, DVec2) -> bool) -> DVec2 {
        let mut candidate = self.state.world_size.center();
        for _ in 0..self.config.placement_attempts {
            candidate = self.random_point();
            if accept(self, candidate) {
                return candidate;
            }
        }
        candidate
    }

    /// No asteroid, UFO or UFO projectile comes within `safe_distance` of
    /// `point`, measured from their outlines.
    pub(super) fn is_safe(&self, point: DVec2) -> bool {
        let clearance = self.config.safe_distance;
        self.arena.entities_sorted().all(|entity| {
            let hazard = match entity.kind() {
                EntityKind::Asteroid | EntityKind::Ufo => true,
                EntityKind::Projectile => entity
                    .as_projectile()
                    .is_some_and(|p| matches!(p.owner, ProjectileOwner::Ufo(_))),
                EntityKind::Ship => false,
            };
            !hazard
                || point.distance(entity.body.position) - entity.body.bounding_radius() > clearance
        })
    }

    fn is_clear_of_ship(&self, point: DVec2) -> bool {
        self.state
            .ship
            .and_then(|id| self.arena.get(id))
            .map_or(true, |ship| {
                point.distance(ship.body.position) > self.config.safe_distance
            })
    }
}
