//! UFO movement and fire control.

use glam::DVec2;

use super::Game;
use crate::entity::{DestroyCause, Entity, EntityId, ProjectileOwner, UfoClass};

/// Returns the point a projectile of `speed` fired from `shooter` must aim at
/// to meet a target at `target` moving with constant `target_velocity`.
///
/// Solves `|r + v t| = s t` for the smallest positive `t`, with `r` the
/// relative position. Returns `None` when the projectile can never catch
/// the target.
///
/// # Example
///
/// ```
/// use glam::DVec2;
/// use rockburst_core::game::intercept;
///
/// let aim = intercept(DVec2::ZERO, DVec2::new(100.0, 0.0), DVec2::ZERO, 10.0).unwrap();
/// assert!((aim - DVec2::new(100.0, 0.0)).length() < 1e-9);
/// ```
#[must_use]
pub fn intercept(
    shooter: DVec2,
    target: DVec2,
    target_velocity: DVec2,
    speed: f64,
) -> Option<DVec2> {
    const EPSILON: f64 = 1e-9;

    let r = target - shooter;
    let v = target_velocity;
    let a = v.dot(v) - speed * speed;
    let b = 2.0 * r.dot(v);
    let c = r.dot(r);

    let t = if a.abs() < EPSILON {
        if b.abs() < EPSILON {
            return None;
        }
        -c / b
    } else {
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let t1 = (-b - root) / (2.0 * a);
        let t2 = (-b + root) / (2.0 * a);
        match (t1 > 0.0, t2 > 0.0) {
            (true, true) => t1.min(t2),
            (true, false) => t1,
            (false, true) => t2,
            (false, false) => return None,
        }
    };

    (t > 0.0).then(|| target + v * t)
}

impl Game {
    pub(super) fn update_ufo(&mut self, id: EntityId, dt: f64) {
        let now = self.state.timestamp;
        let world = self.state.world_size;

        let Some(ufo) = self.arena.get_mut(id) else {
            return;
        };
        ufo.body.step(dt, world);
        if ufo.body.outside_horizontally(world) {
            self.remove_entity(id, DestroyCause::LeftWorld);
            return;
        }

        let Some(state) = ufo.as_ufo() else {
            return;
        };
        let class = state.class;
        let shift_due = now >= state.next_shift_at;
        let fire_due = now >= state.next_fire_at;

        if shift_due {
            #[allow(clippy::cast_precision_loss)]
            let direction = self.rng.next_int(-1, 1) as f64;
            let speed = self.config.ufo_class(class).speed * self.config.ufo_vertical_speed_ratio;
            let interval = self.config.ufo_shift_interval_ms;
            if let Some(ufo) = self.arena.get_mut(id) {
                ufo.body.velocity.y = direction * speed;
                if let Some(state) = ufo.as_ufo_mut() {
                    state.next_shift_at = now + interval;
                }
            }
        }

        if fire_due {
            self.ufo_fire(id, class);
            let interval = self.config.ufo_class(class).fire_interval_ms;
            if let Some(state) = self.arena.get_mut(id).and_then(Entity::as_ufo_mut) {
                state.next_fire_at = now + interval;
            }
        }
    }

    fn ufo_fire(&mut self, id: EntityId, class: UfoClass) {
        let Some(origin) = self.arena.get(id).map(|e| e.body.position) else {
            return;
        };
        let speed = self.config.ufo_projectile_speed;

        let angle = match class {
            UfoClass::Large => self.rng.next_angle(),
            UfoClass::Small => match self.aim_target() {
                Some((position, velocity)) => {
                    let aim = intercept(origin, position, velocity, speed).unwrap_or(position);
                    let offset = aim - origin;
                    let error = self.config.ufo_inaccuracy(self.state.score);
                    offset.y.atan2(offset.x) + self.rng.next_float(-error, error)
                }
                None => self.rng.next_angle(),
            },
        };

        let expires_at = self.state.timestamp + self.config.ufo_projectile_life_ms;
        self.spawn_projectile(
            origin,
            DVec2::from_angle(angle) * speed,
            ProjectileOwner::Ufo(id),
            expires_at,
        );
    }

    /// Position and velocity a small UFO aims at: the visible ship, otherwise
    /// a random asteroid.
    fn aim_target(&mut self) -> Option<(DVec2, DVec2)> {
        let ship = self
            .state
            .ship
            .and_then(|id| self.arena.get(id))
            .filter(|e| e.as_ship().is_some_and(|s| !s.hidden));
        if let Some(ship) = ship {
            return Some((ship.body.position, ship.body.velocity));
        }

        let index = self.rng.pick_index(self.state.asteroids.len())?;
        let rock = self.arena.get(self.state.asteroids[index])?;
        Some((rock.body.position, rock.body.velocity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GameEvent;
    use crate::game::{GameConfig, GameStatus};
    use crate::geometry::WorldSize;
    use crate::input::InputState;
    use crate::replay::Frame;
    use crate::rng::Seed;

    mod intercept_tests {
        use super::*;

        #[test]
        fn stationary_target_is_aimed_at_directly() {
            let aim = intercept(DVec2::ZERO, DVec2::new(100.0, 0.0), DVec2::ZERO, 10.0).unwrap();
            assert!((aim - DVec2::new(100.0, 0.0)).length() < 1e-9);
        }

        #[test]
        fn crossing_target_is_led() {
            let aim = intercept(
                DVec2::ZERO,
                DVec2::new(100.0, 0.0),
                DVec2::new(0.0, 10.0),
                20.0,
            )
            .unwrap();
            let t = aim.length() / 20.0;
            assert!((aim - (DVec2::new(100.0, 0.0) + DVec2::new(0.0, 10.0) * t)).length() < 1e-6);
            assert!((aim.y - 57.735_026_918_962_58).abs() < 1e-6);
        }

        #[test]
        fn fleeing_fast_target_cannot_be_caught() {
            assert!(intercept(
                DVec2::ZERO,
                DVec2::new(100.0, 0.0),
                DVec2::new(50.0, 0.0),
                10.0
            )
            .is_none());
        }

        #[test]
        fn equal_speeds_use_linear_solution() {
            let aim = intercept(
                DVec2::ZERO,
                DVec2::new(100.0, 0.0),
                DVec2::new(-10.0, 0.0),
                10.0,
            )
            .unwrap();
            assert!((aim - DVec2::new(50.0, 0.0)).length() < 1e-9);
        }
    }

    mod behavior_tests {
        use super::*;

        fn game_with_ufo() -> (Game, EntityId) {
            let mut game = Game::new(GameConfig::default(), &Seed::from_u64(21));
            game.set_world_size(WorldSize::new(960, 720));
            game.start();
            let id = game.spawn_ufo();
            (game, id)
        }

        /// A UFO on an empty field, entering from a side with room to cross
        /// well past its first shot.
        fn quiet_game_with_ufo() -> (Game, EntityId) {
            let config = GameConfig {
                initial_asteroids: 0,
                ..GameConfig::default()
            };
            let mut game = Game::new(config, &Seed::from_u64(21));
            game.set_world_size(WorldSize::new(960, 720));
            game.start();
            let id = game.spawn_ufo();
            (game, id)
        }

        #[test]
        fn ufo_fires_on_schedule() {
            let (mut game, id) = quiet_game_with_ufo();
            let class = game.entity(id).unwrap().as_ufo().unwrap().class;
            let interval = game.config().ufo_class(class).fire_interval_ms;

            let fired = std::rc::Rc::new(std::cell::Cell::new(0u32));
            let sink = std::rc::Rc::clone(&fired);
            game.subscribe(move |event| {
                if let GameEvent::ProjectileCreated {
                    owner: ProjectileOwner::Ufo(owner),
                    ..
                } = event
                {
                    if *owner == id {
                        sink.set(sink.get() + 1);
                    }
                }
            });

            let frame = Frame::new(50.0, WorldSize::new(960, 720), InputState::IDLE);
            while game.state().timestamp + 50.0 < interval {
                game.tick(&frame);
            }
            assert!(game.arena().contains(id));
            assert_eq!(fired.get(), 0, "fired before {interval} ms");

            // Straddles the fire time; the sub-step lands exactly on it.
            game.tick(&Frame::new(100.0, WorldSize::new(960, 720), InputState::IDLE));
            assert!(game.arena().contains(id));
            assert_eq!(fired.get(), 1);
            let next = game.entity(id).unwrap().as_ufo().unwrap().next_fire_at;
            assert!((next - 2.0 * interval).abs() < 1e-9);
            assert_eq!(game.state().status, GameStatus::Running);
        }

        #[test]
        fn ufo_leaving_world_is_removed() {
            let (mut game, id) = game_with_ufo();
            if let Some(ufo) = game.arena.get_mut(id) {
                ufo.body.position.x = -1_000.0;
                ufo.body.velocity.x = -100.0;
            }
            game.update_ufo(id, 0.016);
            assert!(!game.arena().contains(id));
            assert!(game.state().ufos.is_empty());
        }
    }
}
