//! Typed publish/subscribe for game events.
//!
//! The [`EventBus`] stores listeners keyed by a [`Subscription`] handle.
//! Listeners run synchronously, in subscription order, inside the call that
//! published the event. Keep the handle to remove the listener later with
//! [`EventBus::unsubscribe`].
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use rockburst_core::events::EventBus;
//!
//! let total = Rc::new(Cell::new(0));
//! let mut bus = EventBus::<u32>::new();
//!
//! let sink = Rc::clone(&total);
//! let handle = bus.subscribe(move |value| sink.set(sink.get() + *value));
//!
//! bus.publish(&5);
//! assert!(bus.unsubscribe(handle));
//! bus.publish(&7);
//!
//! assert_eq!(total.get(), 5);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{DestroyCause, EntityId, ProjectileOwner, UfoClass};

// =============================================================================
// Game Events
// =============================================================================

/// Everything the simulation reports to the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// The game moved from `Init` to `Running`.
    Started,
    /// The last life was lost.
    Finished {
        /// Final score
        score: u64,
        /// Level reached
        level: u32,
    },
    /// The game was discarded and returned to `Init`.
    Reset,
    /// Points were awarded.
    ScoreChanged {
        /// New total
        score: u64,
        /// Points added
        delta: u64,
    },
    /// A new level began.
    LevelChanged {
        /// New level
        level: u32,
    },
    /// A life was gained or lost.
    LivesChanged {
        /// Remaining lives
        lives: u32,
    },
    /// The ship spawned or respawned.
    ShipCreated {
        /// Ship entity
        id: EntityId,
    },
    /// The ship was removed.
    ShipDestroyed {
        /// Ship entity
        id: EntityId,
        /// What removed it
        cause: DestroyCause,
    },
    /// An asteroid appeared, either at level start or as a fragment.
    AsteroidCreated {
        /// Asteroid entity
        id: EntityId,
        /// Size generation, 0 is largest
        generation: u8,
    },
    /// An asteroid was removed.
    AsteroidDestroyed {
        /// Asteroid entity
        id: EntityId,
        /// Size generation
        generation: u8,
        /// What removed it
        cause: DestroyCause,
    },
    /// A UFO entered the field.
    UfoCreated {
        /// UFO entity
        id: EntityId,
        /// Size class
        class: UfoClass,
    },
    /// A UFO was removed.
    UfoDestroyed {
        /// UFO entity
        id: EntityId,
        /// Size class
        class: UfoClass,
        /// What removed it
        cause: DestroyCause,
    },
    /// A projectile was fired.
    ProjectileCreated {
        /// Projectile entity
        id: EntityId,
        /// Who fired it
        owner: ProjectileOwner,
    },
    /// A projectile was removed.
    ProjectileDestroyed {
        /// Projectile entity
        id: EntityId,
        /// Who fired it
        owner: ProjectileOwner,
        /// What removed it
        cause: DestroyCause,
    },
    /// The ship jumped into hyperspace.
    HyperspaceEntered {
        /// Ship entity
        id: EntityId,
    },
    /// The ship came back out of hyperspace.
    HyperspaceExited {
        /// Ship entity
        id: EntityId,
    },
    /// A full-auto powerup window opened.
    PowerupStarted {
        /// Timestamp at which it ends
        until_ms: f64,
    },
}

impl GameEvent {
    /// Returns a stable snake-case name for the variant.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Finished { .. } => "finished",
            Self::Reset => "reset",
            Self::ScoreChanged { .. } => "score_changed",
            Self::LevelChanged { .. } => "level_changed",
            Self::LivesChanged { .. } => "lives_changed",
            Self::ShipCreated { .. } => "ship_created",
            Self::ShipDestroyed { .. } => "ship_destroyed",
            Self::AsteroidCreated { .. } => "asteroid_created",
            Self::AsteroidDestroyed { .. } => "asteroid_destroyed",
            Self::UfoCreated { .. } => "ufo_created",
            Self::UfoDestroyed { .. } => "ufo_destroyed",
            Self::ProjectileCreated { .. } => "projectile_created",
            Self::ProjectileDestroyed { .. } => "projectile_destroyed",
            Self::HyperspaceEntered { .. } => "hyperspace_entered",
            Self::HyperspaceExited { .. } => "hyperspace_exited",
            Self::PowerupStarted { .. } => "powerup_started",
        }
    }
}

// =============================================================================
// Event Bus
// =============================================================================

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subscription(u64);

impl Subscription {
    /// Returns the raw handle value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

type Listener<E> = Box<dyn FnMut(&E)>;

/// Synchronous publish/subscribe channel for events of type `E`.
pub struct EventBus<E> {
    listeners: BTreeMap<Subscription, Listener<E>>,
    next_handle: u64,
    published: u64,
}

impl<E> EventBus<E> {
    /// Creates a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: BTreeMap::new(),
            next_handle: 0,
            published: 0,
        }
    }

    /// Adds a listener and returns its handle.
    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&E) + 'static,
    {
        let handle = Subscription(self.next_handle);
        self.next_handle += 1;
        self.listeners.insert(handle, Box::new(listener));
        handle
    }

    /// Removes a listener. Returns `false` if the handle was unknown.
    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        self.listeners.remove(&handle).is_some()
    }

    /// Delivers `event` to every listener in subscription order.
    pub fn publish(&mut self, event: &E) {
        self.published += 1;
        for listener in self.listeners.values_mut() {
            listener(event);
        }
    }

    /// Returns the number of active listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Returns how many events have been published over the bus lifetime.
    #[must_use]
    pub const fn published(&self) -> u64 {
        self.published
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &format!("[{} listeners]", self.listeners.len()))
            .field("published", &self.published)
            .finish()
    }
}
