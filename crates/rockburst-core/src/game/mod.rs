//! The deterministic game simulation.
//!
//! A [`Game`] owns everything one play session needs: the state aggregate,
//! the entity arena, the seeded generator, the event bus and, optionally, a
//! replay logger. It is driven by [`Game::tick`] with one [`Frame`] at a time.
//!
//! # Tick Pipeline
//!
//! 1. **Canonicalize**: clamp the elapsed time and, when logging, run the
//!    frame through the logger so the simulation sees exactly what a replay
//!    will see
//! 2. **Subdivide**: split the frame at every critical timestamp (UFO fire and
//!    shift times, full-auto shots, hyperspace return) that falls inside it
//! 3. **Advance** each sub-step: ship input, entity updates in tick queue
//!    order, collisions, then spawn, level and respawn rules
//!
//! # Determinism
//!
//! Given the same seed and the same canonical frames, two games make the same
//! random draws in the same order and end in the same state. Nothing in here
//! reads a clock or iterates a hash map.
//!
//! # Example
//!
//! ```
//! use rockburst_core::game::{Game, GameConfig, GameStatus};
//! use rockburst_core::geometry::WorldSize;
//! use rockburst_core::input::InputState;
//! use rockburst_core::replay::Frame;
//! use rockburst_core::rng::Seed;
//!
//! let mut game = Game::new(GameConfig::default(), &Seed::from_u64(1));
//! game.set_world_size(WorldSize::new(960, 720));
//! game.start();
//!
//! let frame = Frame::new(16.0, WorldSize::new(960, 720), InputState::IDLE);
//! for _ in 0..60 {
//!     game.tick(&frame);
//! }
//!
//! assert_eq!(game.state().status, GameStatus::Running);
//! assert!(game.state().ship.is_some());
//! ```

mod collision;
mod config;
mod spawn;
mod state;
mod ufo;

pub use config::{
    check_version, GameConfig, UfoClassConfig, VersionError, CHILDREN_COUNT, GENERATIONS,
    RULES_VERSION,
};
pub use state::{GameState, GameStatus};
pub use ufo::intercept;

use glam::DVec2;
use tracing::{debug, info, trace};

use crate::arena::Arena;
use crate::entity::{Body, DestroyCause, Entity, EntityId, EntityKind, EntityState, ProjectileOwner};
use crate::events::{EventBus, GameEvent, Subscription};
use crate::geometry::WorldSize;
use crate::input::{Control, InputState};
use crate::replay::{Frame, ReplayLogger};
use crate::rng::{Seed, SeededRng};

/// Distance from the ship's center to its nose, where projectiles appear.
const SHIP_NOSE: f64 = 14.0;

/// Timestamps of pending rule events, all in simulation milliseconds.
#[derive(Debug, Clone, Default)]
struct Timers {
    fire_ready_at: f64,
    next_auto_fire_at: Option<f64>,
    powerup_until: f64,
    hyperspace_ready_at: f64,
    hyperspace_return_at: Option<f64>,
    next_ufo_at: f64,
    level_clear_at: Option<f64>,
    respawn_at: Option<f64>,
}

/// One play session.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    state: GameState,
    arena: Arena,
    rng: SeededRng,
    start_seed: Seed,
    bus: EventBus<GameEvent>,
    logger: Option<ReplayLogger>,
    previous_input: InputState,
    timers: Timers,
}

impl Game {
    /// Creates a game in `Init` whose random draws follow `seed`.
    #[must_use]
    pub fn new(config: GameConfig, seed: &Seed) -> Self {
        Self {
            config,
            state: GameState::new(WorldSize::default()),
            arena: Arena::new(),
            rng: SeededRng::new(seed),
            start_seed: *seed,
            bus: EventBus::new(),
            logger: None,
            previous_input: InputState::IDLE,
            timers: Timers::default(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the tuning in effect.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Returns the state aggregate.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Returns the entity arena.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Returns a live entity.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id)
    }

    /// Iterates live entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.arena.entities_sorted()
    }

    /// Returns the random generator.
    #[must_use]
    pub const fn rng(&self) -> &SeededRng {
        &self.rng
    }

    /// Returns the generator state at the most recent `start`, or at
    /// construction if the game has not started yet.
    ///
    /// This is the seed a replay of the current session must use.
    #[must_use]
    pub const fn replay_seed(&self) -> Seed {
        self.start_seed
    }

    /// Returns `true` while the full-auto powerup is active.
    #[must_use]
    pub fn powerup_active(&self) -> bool {
        self.state.timestamp < self.timers.powerup_until
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Registers an event listener.
    pub fn subscribe<F>(&mut self, listener: F) -> Subscription
    where
        F: FnMut(&GameEvent) + 'static,
    {
        self.bus.subscribe(listener)
    }

    /// Removes an event listener. Returns `false` for an unknown handle.
    pub fn unsubscribe(&mut self, handle: Subscription) -> bool {
        self.bus.unsubscribe(handle)
    }

    fn emit(&mut self, event: GameEvent) {
        self.bus.publish(&event);
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Sets the world size used by `start` and until the next frame.
    ///
    /// Sizes with a zero dimension are ignored.
    pub fn set_world_size(&mut self, size: WorldSize) {
        if !size.is_empty() {
            self.state.world_size = size;
        }
    }

    /// Attaches a replay logger. Only allowed in `Init`; returns whether
    /// logging is now enabled.
    pub fn enable_logging(&mut self) -> bool {
        if self.state.status == GameStatus::Init && self.logger.is_none() {
            self.logger = Some(ReplayLogger::new());
        }
        self.logger.is_some()
    }

    /// Returns the replay log recorded so far, if logging is enabled.
    #[must_use]
    pub fn replay_log(&self) -> Option<String> {
        self.logger.as_ref().map(ReplayLogger::encoded)
    }

    /// Moves from `Init` to `Running`. Returns `false` in any other state.
    ///
    /// When logging, the initial world size is recorded as an idle frame
    /// with zero elapsed time.
    pub fn start(&mut self) -> bool {
        if self.state.status != GameStatus::Init {
            return false;
        }

        self.start_seed = self.rng.seed();
        let world = self.state.world_size;
        self.state = GameState::new(world);
        self.state.status = GameStatus::Running;
        self.state.lives = self.config.starting_lives;
        self.timers = Timers::default();
        self.previous_input = InputState::IDLE;

        if let Some(logger) = self.logger.as_mut() {
            logger.record(0.0, world, InputState::IDLE);
        }

        info!(width = world.width, height = world.height, "game started");
        self.emit(GameEvent::Started);

        self.spawn_ship(world.center());
        self.spawn_level_asteroids();
        self.schedule_ufo();
        true
    }

    /// Discards the session and returns to `Init`.
    ///
    /// Every live entity is destroyed with [`DestroyCause::Reset`] and id
    /// assignment starts over. The generator is not rewound; the next `start` continues from its current
    /// state. A logger, if attached, is cleared.
    pub fn reset(&mut self) {
        let ids: Vec<EntityId> = self.arena.entity_ids_sorted().collect();
        for id in ids {
            self.remove_entity(id, DestroyCause::Reset);
        }
        debug_assert!(self.arena.is_empty(), "entities survived reset");
        debug_assert!(self.arena.queue().is_empty(), "tick queue survived reset");
        self.arena = Arena::new();

        let world = self.state.world_size;
        self.state = GameState::new(world);
        self.timers = Timers::default();
        self.previous_input = InputState::IDLE;
        if let Some(logger) = self.logger.as_mut() {
            logger.clear();
        }

        info!("game reset");
        self.emit(GameEvent::Reset);
    }

    // =========================================================================
    // Simulation
    // =========================================================================

    /// Advances the simulation by one frame. Does nothing in `Init`.
    pub fn tick(&mut self, frame: &Frame) {
        if self.state.status == GameStatus::Init {
            return;
        }

        let elapsed = if frame.elapsed_ms.is_finite() {
            frame.elapsed_ms.clamp(0.0, self.config.max_elapsed_ms)
        } else {
            0.0
        };
        // A degenerate size keeps the current one, so the log never holds a
        // size the reader rejects.
        let world_size = if frame.world_size.is_empty() {
            self.state.world_size
        } else {
            frame.world_size
        };
        let frame = match self.logger.as_mut() {
            Some(logger) => logger.record(elapsed, world_size, frame.input),
            None => Frame::new(elapsed, world_size, frame.input),
        };

        self.set_world_size(frame.world_size);
        let input = frame.input;
        let fire_edge =
            input.is_pressed(Control::Fire) && !self.previous_input.is_pressed(Control::Fire);
        let hyperspace_edge = input.is_pressed(Control::Hyperspace)
            && !self.previous_input.is_pressed(Control::Hyperspace);
        self.previous_input = input;

        let end = self.state.timestamp + frame.elapsed_ms;
        let mut first = true;
        loop {
            let now = self.state.timestamp;
            let target = self.next_boundary(now, end, &input);
            self.advance(
                target,
                target - now,
                &input,
                first && fire_edge,
                first && hyperspace_edge,
            );
            first = false;
            if target >= end {
                break;
            }
        }
    }

    /// Earliest critical timestamp strictly inside `(now, end)`, or `end`.
    fn next_boundary(&self, now: f64, end: f64, input: &InputState) -> f64 {
        let mut target = end;
        let mut consider = |t: f64| {
            if t > now && t < target {
                target = t;
            }
        };

        for entity in self.state.ufos.iter().filter_map(|id| self.arena.get(*id)) {
            if let Some(ufo) = entity.as_ufo() {
                consider(ufo.next_fire_at);
                consider(ufo.next_shift_at);
            }
        }
        if let Some(t) = self.timers.hyperspace_return_at {
            consider(t);
        }
        if input.is_pressed(Control::Fire) && now < self.timers.powerup_until {
            if let Some(t) = self.timers.next_auto_fire_at {
                consider(t);
            }
        }
        target
    }

    /// Runs one sub-step ending at `now`.
    fn advance(
        &mut self,
        now: f64,
        dt_ms: f64,
        input: &InputState,
        fire_edge: bool,
        hyperspace_edge: bool,
    ) {
        self.state.timestamp = now;
        let dt = dt_ms / 1000.0;

        self.apply_ship_input(dt, input, fire_edge, hyperspace_edge);

        for id in self.arena.update_order() {
            let Some(kind) = self.arena.get(id).map(Entity::kind) else {
                continue;
            };
            match kind {
                EntityKind::Ship => self.update_ship(id, dt),
                EntityKind::Ufo => self.update_ufo(id, dt),
                EntityKind::Asteroid => self.update_asteroid(id, dt),
                EntityKind::Projectile => self.update_projectile(id, dt),
            }
        }

        self.resolve_collisions();

        if self.state.is_running() {
            self.update_ufo_spawner();
            self.update_level();
            self.update_respawn();
        }
    }

    // =========================================================================
    // Ship
    // =========================================================================

    fn apply_ship_input(
        &mut self,
        dt: f64,
        input: &InputState,
        fire_edge: bool,
        hyperspace_edge: bool,
    ) {
        let Some(id) = self.state.ship else {
            return;
        };
        let now = self.state.timestamp;
        let config = &self.config;
        let Some(ship) = self.arena.get_mut(id) else {
            return;
        };
        if ship.as_ship().is_some_and(|s| s.hidden) {
            return;
        }

        let body = &mut ship.body;
        let turn = input.get(Control::Turn);
        if turn == 0.0 {
            body.rotation_speed -= body.rotation_speed * (config.ship_turn_friction * dt).min(1.0);
        } else {
            body.rotation_speed = (body.rotation_speed + turn * config.ship_turn_acceleration * dt)
                .clamp(-config.ship_max_turn_speed, config.ship_max_turn_speed);
        }

        let heading = DVec2::from_angle(body.rotation);
        let thrust = input.get(Control::Thrust).max(0.0);
        body.velocity += heading * (thrust * config.ship_thrust * dt);
        body.velocity -= body.velocity * (config.ship_friction * dt).min(1.0);
        body.velocity = body.velocity.clamp_length_max(config.ship_max_speed);

        if self.powerup_active() {
            if input.is_pressed(Control::Fire) {
                if self.timers.next_auto_fire_at.map_or(true, |t| now >= t) {
                    self.fire_ship_projectile(id);
                    self.timers.next_auto_fire_at = Some(now + self.config.auto_fire_interval_ms);
                }
            } else {
                self.timers.next_auto_fire_at = None;
            }
        } else {
            self.timers.next_auto_fire_at = None;
            if fire_edge && now >= self.timers.fire_ready_at {
                self.fire_ship_projectile(id);
                self.timers.fire_ready_at = now + self.config.fire_cooldown_ms;
            }
        }

        if hyperspace_edge && now >= self.timers.hyperspace_ready_at {
            self.enter_hyperspace(id);
        }
    }

    fn fire_ship_projectile(&mut self, ship_id: EntityId) {
        let Some(ship) = self.arena.get(ship_id) else {
            return;
        };
        let heading = DVec2::from_angle(ship.body.rotation);
        let origin = ship.body.position + heading * SHIP_NOSE;
        let mut velocity = heading * self.config.projectile_speed + ship.body.velocity;

        let speed = velocity.length();
        if speed < self.config.projectile_min_speed {
            velocity = if speed > 0.0 {
                velocity * (self.config.projectile_min_speed / speed)
            } else {
                heading * self.config.projectile_min_speed
            };
        } else if speed > self.config.projectile_max_speed {
            velocity *= self.config.projectile_max_speed / speed;
        }

        let expires_at = self.state.timestamp + self.config.ship_projectile_life_ms;
        self.spawn_projectile(origin, velocity, ProjectileOwner::Ship, expires_at);
    }

    fn enter_hyperspace(&mut self, id: EntityId) {
        let now = self.state.timestamp;
        let duration = self.config.hyperspace_duration_ms;
        let Some(ship) = self.arena.get_mut(id) else {
            return;
        };
        if let Some(state) = ship.as_ship_mut() {
            state.hidden = true;
            state.invulnerable_until = now + duration;
        }
        ship.body.velocity = DVec2::ZERO;
        ship.body.rotation_speed = 0.0;

        self.timers.hyperspace_return_at = Some(now + duration / 2.0);
        self.timers.hyperspace_ready_at = now + self.config.hyperspace_cooldown_ms;
        debug!(%id, at = now, "hyperspace entered");
        self.emit(GameEvent::HyperspaceEntered { id });
    }

    fn exit_hyperspace(&mut self, id: EntityId) {
        let position = self.find_location(Self::is_safe);
        let Some(ship) = self.arena.get_mut(id) else {
            return;
        };
        if let Some(state) = ship.as_ship_mut() {
            state.hidden = false;
        }
        ship.body.position = position;
        ship.body.refresh_shape();
        self.timers.hyperspace_return_at = None;
        debug!(%id, x = position.x, y = position.y, "hyperspace exited");
        self.emit(GameEvent::HyperspaceExited { id });
    }

    fn update_ship(&mut self, id: EntityId, dt: f64) {
        let now = self.state.timestamp;
        let world = self.state.world_size;
        let hidden = self
            .arena
            .get(id)
            .and_then(Entity::as_ship)
            .is_some_and(|s| s.hidden);

        if hidden {
            if self.timers.hyperspace_return_at.is_some_and(|t| now >= t) {
                self.exit_hyperspace(id);
            }
            return;
        }
        if let Some(ship) = self.arena.get_mut(id) {
            ship.body.step(dt, world);
        }
    }

    /// The ship's id if it can currently be hit.
    fn collidable_ship(&self) -> Option<EntityId> {
        let id = self.state.ship?;
        let ship = self.arena.get(id)?.as_ship()?;
        (!ship.hidden && self.state.timestamp >= ship.invulnerable_until).then_some(id)
    }

    // =========================================================================
    // Other Entities
    // =========================================================================

    fn update_asteroid(&mut self, id: EntityId, dt: f64) {
        let world = self.state.world_size;
        if let Some(asteroid) = self.arena.get_mut(id) {
            asteroid.body.step(dt, world);
        }
    }

    fn update_projectile(&mut self, id: EntityId, dt: f64) {
        let now = self.state.timestamp;
        let world = self.state.world_size;
        let expired = self
            .arena
            .get(id)
            .and_then(Entity::as_projectile)
            .is_some_and(|p| now >= p.expires_at);

        if expired {
            self.remove_entity(id, DestroyCause::Expired);
        } else if let Some(projectile) = self.arena.get_mut(id) {
            projectile.body.step(dt, world);
        }
    }

    // =========================================================================
    // Rules
    // =========================================================================

    /// Registers a new entity in the arena and the state lists.
    fn insert_entity(&mut self, body: Body, state: EntityState) -> EntityId {
        let kind = state.kind();
        let id = self.arena.spawn(body, state);
        self.state.track(id, kind);
        trace!(%id, %kind, "entity spawned");
        id
    }

    /// Removes an entity and reports it. Returns `None` if it was already gone.
    fn remove_entity(&mut self, id: EntityId, cause: DestroyCause) -> Option<Entity> {
        let entity = self.arena.despawn(id)?;
        self.state.untrack(id, entity.kind());
        trace!(%id, kind = %entity.kind(), ?cause, "entity destroyed");

        let event = match &entity.state {
            EntityState::Ship(_) => GameEvent::ShipDestroyed { id, cause },
            EntityState::Asteroid(a) => GameEvent::AsteroidDestroyed {
                id,
                generation: a.generation,
                cause,
            },
            EntityState::Ufo(u) => GameEvent::UfoDestroyed {
                id,
                class: u.class,
                cause,
            },
            EntityState::Projectile(p) => GameEvent::ProjectileDestroyed {
                id,
                owner: p.owner,
                cause,
            },
        };
        self.emit(event);
        Some(entity)
    }

    fn add_score(&mut self, points: u64) {
        if !self.state.is_running() || points == 0 {
            return;
        }
        let before = self.state.score;
        self.state.score = before.saturating_add(points);
        self.emit(GameEvent::ScoreChanged {
            score: self.state.score,
            delta: points,
        });

        let every = self.config.extra_life_every;
        if every == 0 {
            return;
        }
        let crossings = self.state.score / every - before / every;
        let earned = u32::try_from(crossings).unwrap_or(u32::MAX);
        let lives = self
            .state
            .lives
            .saturating_add(earned)
            .min(self.config.max_lives)
            .max(self.state.lives);
        if lives != self.state.lives {
            self.state.lives = lives;
            debug!(lives, "extra life");
            self.emit(GameEvent::LivesChanged { lives });
        }
    }

    fn lose_life(&mut self) {
        if !self.state.is_running() {
            return;
        }
        self.state.lives = self.state.lives.saturating_sub(1);
        let lives = self.state.lives;
        self.emit(GameEvent::LivesChanged { lives });
        if lives == 0 {
            self.finish();
        } else {
            self.timers.respawn_at = Some(self.state.timestamp + self.config.respawn_delay_ms);
        }
    }

    fn finish(&mut self) {
        if self.state.status != GameStatus::Running {
            return;
        }
        self.state.status = GameStatus::Finished;
        self.timers.respawn_at = None;
        self.timers.level_clear_at = None;
        let (score, level) = (self.state.score, self.state.level);
        info!(score, level, at = self.state.timestamp, "game finished");
        self.emit(GameEvent::Finished { score, level });
    }

    fn start_powerup(&mut self) {
        let until_ms = self.state.timestamp + self.config.powerup_duration_ms;
        self.timers.powerup_until = until_ms;
        debug!(until_ms, "powerup started");
        self.emit(GameEvent::PowerupStarted { until_ms });
    }

    fn schedule_ufo(&mut self) {
        let delay = self
            .rng
            .next_float(self.config.ufo_delay_min_ms, self.config.ufo_delay_max_ms);
        self.timers.next_ufo_at = self.state.timestamp + delay;
    }

    fn update_ufo_spawner(&mut self) {
        if self.state.timestamp < self.timers.next_ufo_at {
            return;
        }
        if self.state.ufos.len() < self.config.max_ufos {
            self.spawn_ufo();
        }
        self.schedule_ufo();
    }

    fn update_level(&mut self) {
        if !self.state.asteroids.is_empty() {
            return;
        }
        let now = self.state.timestamp;
        match self.timers.level_clear_at {
            None => self.timers.level_clear_at = Some(now + self.config.level_delay_ms),
            Some(t) if now >= t => {
                self.timers.level_clear_at = None;
                self.state.level += 1;
                let level = self.state.level;
                debug!(level, at = now, "level advanced");
                self.emit(GameEvent::LevelChanged { level });
                self.spawn_level_asteroids();
            }
            Some(_) => {}
        }
    }

    fn update_respawn(&mut self) {
        let Some(t) = self.timers.respawn_at else {
            return;
        };
        if self.state.timestamp < t || self.state.ship.is_some() {
            return;
        }
        self.timers.respawn_at = None;
        let center = self.state.world_size.center();
        let position = if self.is_safe(center) {
            center
        } else {
            self.find_location(Self::is_safe)
        };
        debug!(x = position.x, y = position.y, "ship respawned");
        self.spawn_ship(position);
    }
}
