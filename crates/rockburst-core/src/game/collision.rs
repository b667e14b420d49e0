//! Collision resolution and the destruction rules that follow from it.
//!
//! Pairs are tested in a fixed order so the outcome of a frame never depends
//! on anything but the entity lists:
//!
//! 1. ship against UFOs, asteroids, then UFO projectiles
//! 2. UFOs against each other
//! 3. asteroids against UFOs
//! 4. UFOs against ship projectiles
//! 5. asteroids against projectiles of either owner
//!
//! An entity destroyed earlier in the pass takes no further part in it.

use super::{Game, GENERATIONS};
use crate::entity::{DestroyCause, EntityId, ProjectileOwner};

impl Game {
    pub(super) fn resolve_collisions(&mut self) {
        self.collide_ship();
        self.collide_ufos();
        self.collide_asteroids_with_ufos();
        self.collide_ufos_with_projectiles();
        self.collide_asteroids_with_projectiles();
    }

    fn overlapping(&self, a: EntityId, b: EntityId) -> bool {
        match (self.arena.get(a), self.arena.get(b)) {
            (Some(a), Some(b)) => a.body.intersects(&b.body),
            _ => false,
        }
    }

    fn projectile_owner(&self, id: EntityId) -> Option<ProjectileOwner> {
        self.arena.get(id)?.as_projectile().map(|p| p.owner)
    }

    fn collide_ship(&mut self) {
        let Some(ship) = self.collidable_ship() else {
            return;
        };

        for ufo in self.state.ufos.clone() {
            if self.overlapping(ship, ufo) {
                self.destroy_ufo(ufo, DestroyCause::Ship);
                self.destroy_ship(DestroyCause::Ufo);
                return;
            }
        }

        for asteroid in self.state.asteroids.clone() {
            if self.overlapping(ship, asteroid) {
                self.destroy_asteroid(asteroid, DestroyCause::Ship);
                self.destroy_ship(DestroyCause::Asteroid);
                return;
            }
        }

        for projectile in self.state.projectiles.clone() {
            let hostile = matches!(self.projectile_owner(projectile), Some(ProjectileOwner::Ufo(_)));
            if hostile && self.overlapping(ship, projectile) {
                self.remove_entity(projectile, DestroyCause::Ship);
                self.destroy_ship(DestroyCause::UfoProjectile);
                return;
            }
        }
    }

    fn collide_ufos(&mut self) {
        let ufos = self.state.ufos.clone();
        for (i, &a) in ufos.iter().enumerate() {
            for &b in &ufos[i + 1..] {
                if self.overlapping(a, b) {
                    self.destroy_ufo(a, DestroyCause::Ufo);
                    self.destroy_ufo(b, DestroyCause::Ufo);
                    break;
                }
            }
        }
    }

    fn collide_asteroids_with_ufos(&mut self) {
        for asteroid in self.state.asteroids.clone() {
            for ufo in self.state.ufos.clone() {
                if self.overlapping(asteroid, ufo) {
                    self.destroy_ufo(ufo, DestroyCause::Asteroid);
                    self.destroy_asteroid(asteroid, DestroyCause::Ufo);
                    break;
                }
            }
        }
    }

    fn collide_ufos_with_projectiles(&mut self) {
        for ufo in self.state.ufos.clone() {
            for projectile in self.state.projectiles.clone() {
                if self.projectile_owner(projectile) != Some(ProjectileOwner::Ship) {
                    continue;
                }
                if self.overlapping(ufo, projectile) {
                    self.remove_entity(projectile, DestroyCause::Ufo);
                    self.destroy_ufo(ufo, DestroyCause::ShipProjectile);
                    break;
                }
            }
        }
    }

    fn collide_asteroids_with_projectiles(&mut self) {
        for asteroid in self.state.asteroids.clone() {
            for projectile in self.state.projectiles.clone() {
                let Some(owner) = self.projectile_owner(projectile) else {
                    continue;
                };
                if self.overlapping(asteroid, projectile) {
                    let cause = match owner {
                        ProjectileOwner::Ship => DestroyCause::ShipProjectile,
                        ProjectileOwner::Ufo(_) => DestroyCause::UfoProjectile,
                    };
                    self.remove_entity(projectile, DestroyCause::Asteroid);
                    self.destroy_asteroid(asteroid, cause);
                    break;
                }
            }
        }
    }

    // =========================================================================
    // Destruction Rules
    // =========================================================================

    /// Removes an asteroid, scores it, and splits it when hit by something.
    pub(super) fn destroy_asteroid(&mut self, id: EntityId, cause: DestroyCause) {
        let Some(entity) = self.remove_entity(id, cause) else {
            return;
        };
        let Some(generation) = entity.as_asteroid().map(|a| a.generation) else {
            return;
        };

        if cause.awards_points() {
            self.add_score(self.config.asteroid_scores[usize::from(generation)]);
        }
        if cause.is_collision() && generation + 1 < GENERATIONS {
            self.spawn_children(entity.body.position, generation + 1);
        }
    }

    /// Removes a UFO and scores it. Shooting one down starts full-auto.
    pub(super) fn destroy_ufo(&mut self, id: EntityId, cause: DestroyCause) {
        let Some(entity) = self.remove_entity(id, cause) else {
            return;
        };
        let Some(class) = entity.as_ufo().map(|u| u.class) else {
            return;
        };

        if cause.awards_points() {
            self.add_score(self.config.ufo_class(class).score);
        }
        if cause == DestroyCause::ShipProjectile && self.state.is_running() {
            self.start_powerup();
        }
    }

    /// Removes the ship and takes a life.
    pub(super) fn destroy_ship(&mut self, cause: DestroyCause) {
        let Some(id) = self.state.ship else {
            return;
        };
        if self.remove_entity(id, cause).is_none() {
            return;
        }
        self.timers.powerup_until = self.state.timestamp;
        self.timers.next_auto_fire_at = None;
        self.timers.hyperspace_return_at = None;
        self.lose_life();
    }
}
