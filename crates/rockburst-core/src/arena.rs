//! Arena module: id-keyed storage for every live entity.
//!
//! The Arena is the container for all entities in a game. It provides:
//! - Entity storage with deterministic iteration order (`BTreeMap`)
//! - Entity lifecycle management (spawn/despawn)
//! - The [`TickQueue`] that fixes per-sub-step update order
//!
//! # Architecture
//!
//! Entity IDs are monotonically increasing and never reused, and the
//! `BTreeMap`'s natural ordering makes iteration identical across runs.
//! Spawning registers the entity in the tick queue under its kind's priority;
//! despawning unregisters it. The two structures hold exactly the same ids at
//! all times.
//!
//! # Example
//!
//! ```
//! use glam::DVec2;
//! use rockburst_core::arena::Arena;
//! use rockburst_core::entity::{AsteroidState, Body, EntityState, ShipState, WrapMode};
//! use rockburst_core::geometry::HitArea;
//!
//! let mut arena = Arena::new();
//!
//! let rock = arena.spawn(
//!     Body::new(HitArea::Circle(20.0), DVec2::new(10.0, 10.0), 0.0, WrapMode::BOTH),
//!     EntityState::Asteroid(AsteroidState { generation: 0 }),
//! );
//! let ship = arena.spawn(
//!     Body::new(HitArea::Circle(8.0), DVec2::new(50.0, 50.0), 0.0, WrapMode::BOTH),
//!     EntityState::Ship(ShipState::default()),
//! );
//!
//! // The ship updates before the asteroid even though it was spawned later.
//! assert_eq!(arena.update_order(), vec![ship, rock]);
//!
//! arena.despawn(rock);
//! assert!(arena.despawn(rock).is_none());
//! ```

use std::collections::BTreeMap;

use crate::entity::{Body, Entity, EntityId, EntityKind, EntityState};
use crate::tick_queue::TickQueue;

/// Container for all live entities.
///
/// # Determinism
///
/// The Arena uses `BTreeMap` for entity storage so iterating over entities
/// always produces the same sequence. Update order comes from the tick
/// queue, which is ordered by `(priority, spawn sequence)`.
#[derive(Debug, Clone)]
pub struct Arena {
    /// Monotonically increasing entity ID counter.
    next_id: u64,
    /// Entity storage with deterministic iteration order.
    entities: BTreeMap<EntityId, Entity>,
    /// Update schedule, always holding the same ids as `entities`.
    queue: TickQueue<EntityId>,
}

impl Arena {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entities: BTreeMap::new(),
            queue: TickQueue::new(),
        }
    }

    /// Spawns a new entity in the arena.
    ///
    /// The entity is assigned a unique ID and registered in the tick queue
    /// at its kind's priority.
    ///
    /// # Arguments
    ///
    /// * `body` - Initial kinematic state
    /// * `state` - Per-kind state
    ///
    /// # Returns
    ///
    /// The unique ID assigned to the new entity.
    pub fn spawn(&mut self, body: Body, state: EntityState) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;

        let priority = state.kind().priority();
        self.entities.insert(id, Entity::new(id, body, state));
        self.queue.register(id, priority);

        debug_assert_eq!(self.entities.len(), self.queue.len());
        id
    }

    /// Despawns an entity from the arena.
    ///
    /// The entity is removed from both the entity map and the tick queue.
    /// Despawning an id that is already gone is a no-op.
    ///
    /// # Returns
    ///
    /// The removed entity, if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.remove(&id);
        self.queue.unregister(id);
        debug_assert_eq!(self.entities.len(), self.queue.len());
        removed
    }

    /// Returns a reference to an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable reference to an entity by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns `true` if the entity is alive.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Returns an iterator over entity IDs in creation order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Returns an iterator over entities in creation order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Returns the ids of one kind in creation order.
    #[must_use]
    pub fn ids_of_kind(&self, kind: EntityKind) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.kind() == kind)
            .map(Entity::id)
            .collect()
    }

    /// Returns a snapshot of the update order for one sub-step.
    #[must_use]
    pub fn update_order(&self) -> Vec<EntityId> {
        self.queue.snapshot()
    }

    /// Returns the tick queue.
    #[must_use]
    pub const fn queue(&self) -> &TickQueue<EntityId> {
        &self.queue
    }

    /// Returns the number of entities in the arena.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the arena has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::*;
    use crate::entity::{
        AsteroidState, ProjectileOwner, ProjectileState, ShipState, UfoClass, UfoState, WrapMode,
    };
    use crate::geometry::HitArea;

    fn body() -> Body {
        Body::new(HitArea::Circle(1.0), DVec2::ZERO, 0.0, WrapMode::BOTH)
    }

    fn asteroid() -> EntityState {
        EntityState::Asteroid(AsteroidState { generation: 0 })
    }

    fn projectile() -> EntityState {
        EntityState::Projectile(ProjectileState {
            owner: ProjectileOwner::Ship,
            expires_at: 100.0,
        })
    }

    mod arena_tests {
        use super::*;

        #[test]
        fn new_creates_empty_arena() {
            let arena = Arena::new();
            assert!(arena.is_empty());
            assert_eq!(arena.entity_count(), 0);
            assert!(arena.queue().is_empty());
        }

        #[test]
        fn spawn_creates_entity_with_sequential_ids() {
            let mut arena = Arena::new();

            let id1 = arena.spawn(body(), asteroid());
            let id2 = arena.spawn(body(), asteroid());
            let id3 = arena.spawn(body(), asteroid());

            assert_eq!(id1, EntityId::new(0));
            assert_eq!(id2, EntityId::new(1));
            assert_eq!(id3, EntityId::new(2));
            assert_eq!(arena.entity_count(), 3);
            assert_eq!(arena.queue().len(), 3);
        }

        #[test]
        fn ids_are_not_reused() {
            let mut arena = Arena::new();
            let id1 = arena.spawn(body(), asteroid());
            arena.despawn(id1);
            let id2 = arena.spawn(body(), asteroid());
            assert_ne!(id1, id2);
        }

        #[test]
        fn despawn_unregisters_and_is_idempotent() {
            let mut arena = Arena::new();
            let id = arena.spawn(body(), asteroid());

            let removed = arena.despawn(id);
            assert!(removed.is_some());
            assert!(!arena.queue().contains(id));
            assert!(arena.despawn(id).is_none());
            assert!(arena.is_empty());
        }

        #[test]
        fn update_order_is_by_kind_then_spawn() {
            let mut arena = Arena::new();
            let shot = arena.spawn(body(), projectile());
            let rock = arena.spawn(body(), asteroid());
            let ufo = arena.spawn(
                body(),
                EntityState::Ufo(UfoState {
                    class: UfoClass::Large,
                    next_fire_at: 0.0,
                    next_shift_at: 0.0,
                }),
            );
            let ship = arena.spawn(body(), EntityState::Ship(ShipState::default()));
            let rock2 = arena.spawn(body(), asteroid());

            assert_eq!(arena.update_order(), vec![ship, ufo, rock, rock2, shot]);
        }

        #[test]
        fn ids_of_kind_filters() {
            let mut arena = Arena::new();
            let a = arena.spawn(body(), asteroid());
            arena.spawn(body(), projectile());
            let b = arena.spawn(body(), asteroid());

            assert_eq!(arena.ids_of_kind(EntityKind::Asteroid), vec![a, b]);
            assert!(arena.ids_of_kind(EntityKind::Ship).is_empty());
        }

        #[test]
        fn get_mut_changes_entity() {
            let mut arena = Arena::new();
            let id = arena.spawn(body(), asteroid());
            if let Some(entity) = arena.get_mut(id) {
                entity.body.position = DVec2::new(5.0, 6.0);
            }
            assert_eq!(arena.get(id).map(|e| e.body.position), Some(DVec2::new(5.0, 6.0)));
        }
    }
}
