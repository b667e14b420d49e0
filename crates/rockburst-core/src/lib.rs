//! # Rockburst Core
//!
//! Deterministic simulation core for Rockburst, a wrap-around asteroid
//! shooter whose scores are verified by replaying the player's input.
//!
//! A live client and a verifier run the same [`game::Game`] with the same
//! seed and the same canonical frames, and reach the same score.
//!
//! ## Architecture
//!
//! - **Generator**: [`rng`] lagged XOR generator with a printable seed
//! - **Entities**: [`entity`] bodies and per-kind state, stored in the [`arena`]
//!   and updated in [`tick_queue`] order
//! - **Rules**: [`game`] tick pipeline, collisions, scoring and spawning
//! - **Replay**: [`replay`] compact text log of every frame
//!
//! ## Usage
//!
//! ```
//! use rockburst_core::{Frame, Game, GameConfig, InputState, Seed, WorldSize};
//!
//! let size = WorldSize::new(960, 720);
//! let mut game = Game::new(GameConfig::default(), &Seed::from_u64(7));
//! game.set_world_size(size);
//! game.enable_logging();
//! game.start();
//! game.tick(&Frame::new(16.0, size, InputState::IDLE));
//!
//! let log = game.replay_log().unwrap();
//! assert!(log.starts_with("[qo,k0]"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod base36;
pub mod entity;
pub mod events;
pub mod game;
pub mod geometry;
pub mod hash;
pub mod input;
pub mod replay;
pub mod rng;
pub mod tick_queue;

#[cfg(test)]
mod tests;

pub use arena::Arena;
pub use entity::{DestroyCause, Entity, EntityId, EntityKind};
pub use events::{EventBus, GameEvent, Subscription};
pub use game::{Game, GameConfig, GameState, GameStatus};
pub use geometry::WorldSize;
pub use hash::hash_game;
pub use input::{Control, InputState};
pub use replay::{Frame, LogParseError, LogReader, ReplayLogger};
pub use rng::{Seed, SeedError, SeededRng};
