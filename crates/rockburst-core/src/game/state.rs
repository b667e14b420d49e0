//! The game-state aggregate read by the outside world.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, EntityKind};
use crate::geometry::WorldSize;

/// Lifecycle status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Created or reset, waiting for `start`
    Init,
    /// In play
    Running,
    /// Out of lives; outcome frozen
    Finished,
}

/// Outcome-relevant state of one game.
///
/// Entity lists hold ids in creation order. The entities themselves live in
/// the game's arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Current level, starting at 1
    pub level: u32,
    /// Accumulated points
    pub score: u64,
    /// Remaining lives
    pub lives: u32,
    /// Lifecycle status
    pub status: GameStatus,
    /// Milliseconds since `start`
    pub timestamp: f64,
    /// Current playfield size
    pub world_size: WorldSize,
    /// The ship, while it exists
    pub ship: Option<EntityId>,
    /// Live asteroids
    pub asteroids: Vec<EntityId>,
    /// Live UFOs
    pub ufos: Vec<EntityId>,
    /// Live projectiles of both owners
    pub projectiles: Vec<EntityId>,
}

impl GameState {
    /// Fresh state in `Init`.
    #[must_use]
    pub const fn new(world_size: WorldSize) -> Self {
        Self {
            level: 1,
            score: 0,
            lives: 0,
            status: GameStatus::Init,
            timestamp: 0.0,
            world_size,
            ship: None,
            asteroids: Vec::new(),
            ufos: Vec::new(),
            projectiles: Vec::new(),
        }
    }

    /// Returns `true` while in play.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == GameStatus::Running
    }

    /// Returns `true` once the last life is gone.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Finished
    }

    /// Total number of live entities tracked by the lists.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        usize::from(self.ship.is_some()) + self.asteroids.len() + self.ufos.len() + self.projectiles.len()
    }

    pub(crate) fn track(&mut self, id: EntityId, kind: EntityKind) {
        match kind {
            EntityKind::Ship => {
                debug_assert!(self.ship.is_none(), "a second ship was spawned");
                self.ship = Some(id);
            }
            EntityKind::Asteroid => self.asteroids.push(id),
            EntityKind::Ufo => self.ufos.push(id),
            EntityKind::Projectile => self.projectiles.push(id),
        }
    }

    pub(crate) fn untrack(&mut self, id: EntityId, kind: EntityKind) {
        match kind {
            EntityKind::Ship => {
                if self.ship == Some(id) {
                    self.ship = None;
                }
            }
            EntityKind::Asteroid => self.asteroids.retain(|a| *a != id),
            EntityKind::Ufo => self.ufos.retain(|u| *u != id),
            EntityKind::Projectile => self.projectiles.retain(|p| *p != id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_and_untrack_keep_order() {
        let mut state = GameState::new(WorldSize::default());
        state.track(EntityId::new(1), EntityKind::Asteroid);
        state.track(EntityId::new(2), EntityKind::Asteroid);
        state.track(EntityId::new(3), EntityKind::Asteroid);
        state.untrack(EntityId::new(2), EntityKind::Asteroid);
        assert_eq!(state.asteroids, vec![EntityId::new(1), EntityId::new(3)]);
    }

    #[test]
    fn entity_count_includes_ship() {
        let mut state = GameState::new(WorldSize::default());
        state.track(EntityId::new(0), EntityKind::Ship);
        state.track(EntityId::new(1), EntityKind::Projectile);
        assert_eq!(state.entity_count(), 2);
        state.untrack(EntityId::new(0), EntityKind::Ship);
        assert_eq!(state.ship, None);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&GameStatus::Running).unwrap(), "\"running\"");
    }
}
