//! State hashing for determinism verification.
//!
//! Two games fed the same seed and the same canonical frames must produce the
//! same hash after every tick. Floats are hashed by their bit patterns so the
//! comparison is exact.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use glam::DVec2;

use crate::entity::{Entity, EntityState, ProjectileOwner};
use crate::game::{Game, GameStatus};

/// Computes a deterministic hash of a game.
///
/// This hash includes:
/// - Status, level, score, lives and timestamp
/// - The world size and the entity lists
/// - Every live entity's kinematics and per-kind state
/// - The generator history, which is all a replay needs to continue it
#[must_use]
pub fn hash_game(game: &Game) -> u64 {
    let mut hasher = DefaultHasher::new();
    let state = game.state();

    let status: u8 = match state.status {
        GameStatus::Init => 0,
        GameStatus::Running => 1,
        GameStatus::Finished => 2,
    };
    status.hash(&mut hasher);
    state.level.hash(&mut hasher);
    state.score.hash(&mut hasher);
    state.lives.hash(&mut hasher);
    state.timestamp.to_bits().hash(&mut hasher);
    state.world_size.hash(&mut hasher);

    state.ship.hash(&mut hasher);
    state.asteroids.hash(&mut hasher);
    state.ufos.hash(&mut hasher);
    state.projectiles.hash(&mut hasher);

    for entity in game.entities() {
        hash_entity(entity, &mut hasher);
    }

    game.rng().seed().hash(&mut hasher);

    hasher.finish()
}

fn hash_vec<H: Hasher>(v: DVec2, hasher: &mut H) {
    v.x.to_bits().hash(hasher);
    v.y.to_bits().hash(hasher);
}

fn hash_entity<H: Hasher>(entity: &Entity, hasher: &mut H) {
    entity.id().hash(hasher);
    entity.kind().hash(hasher);

    let body = &entity.body;
    hash_vec(body.position, hasher);
    hash_vec(body.velocity, hasher);
    body.rotation.to_bits().hash(hasher);
    body.rotation_speed.to_bits().hash(hasher);
    body.wrap.bits().hash(hasher);

    match &entity.state {
        EntityState::Ship(ship) => {
            0u8.hash(hasher);
            ship.hidden.hash(hasher);
            ship.invulnerable_until.to_bits().hash(hasher);
        }
        EntityState::Asteroid(asteroid) => {
            1u8.hash(hasher);
            asteroid.generation.hash(hasher);
        }
        EntityState::Ufo(ufo) => {
            2u8.hash(hasher);
            ufo.class.hash(hasher);
            ufo.next_fire_at.to_bits().hash(hasher);
            ufo.next_shift_at.to_bits().hash(hasher);
        }
        EntityState::Projectile(projectile) => {
            3u8.hash(hasher);
            match projectile.owner {
                ProjectileOwner::Ship => 0u8.hash(hasher),
                ProjectileOwner::Ufo(id) => {
                    1u8.hash(hasher);
                    id.hash(hasher);
                }
            }
            projectile.expires_at.to_bits().hash(hasher);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::geometry::WorldSize;
    use crate::input::InputState;
    use crate::replay::Frame;
    use crate::rng::Seed;

    fn started(seed: u64) -> Game {
        let mut game = Game::new(GameConfig::default(), &Seed::from_u64(seed));
        game.set_world_size(WorldSize::new(800, 600));
        game.start();
        game
    }

    #[test]
    fn same_seed_same_hash() {
        assert_eq!(hash_game(&started(4)), hash_game(&started(4)));
    }

    #[test]
    fn different_seed_different_hash() {
        assert_ne!(hash_game(&started(4)), hash_game(&started(5)));
    }

    #[test]
    fn hash_changes_with_time() {
        let mut game = started(4);
        let before = hash_game(&game);
        game.tick(&Frame::new(16.0, WorldSize::new(800, 600), InputState::IDLE));
        assert_ne!(before, hash_game(&game));
    }
}
