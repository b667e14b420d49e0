//! Test helper functions for setting up games and driving them.
//!
//! This module provides factory functions and input scripts that make
//! writing tests more ergonomic and consistent.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::events::GameEvent;
use crate::game::{Game, GameConfig};
use crate::geometry::WorldSize;
use crate::input::{Control, InputState};
use crate::replay::Frame;
use crate::rng::Seed;

/// World size used by every helper.
pub const TEST_SIZE: WorldSize = WorldSize::new(960, 720);

// =============================================================================
// Game Setup
// =============================================================================

/// Creates a game in `Init` with default tuning.
pub fn new_game(seed: u64) -> Game {
    new_game_with(GameConfig::default(), seed)
}

/// Creates a game in `Init` with custom tuning.
pub fn new_game_with(config: GameConfig, seed: u64) -> Game {
    let mut game = Game::new(config, &Seed::from_u64(seed));
    game.set_world_size(TEST_SIZE);
    game
}

/// Creates a game that logs its input and has already started.
pub fn logged_game(seed: u64) -> Game {
    let mut game = new_game(seed);
    assert!(game.enable_logging());
    assert!(game.start());
    game
}

// =============================================================================
// Frames
// =============================================================================

/// A frame of `elapsed_ms` with no control held.
pub fn idle_frame(elapsed_ms: f64) -> Frame {
    Frame::new(elapsed_ms, TEST_SIZE, InputState::IDLE)
}

/// Deterministic pseudo-player input for frame `step`.
///
/// Turns in slow sweeps, thrusts in bursts, taps fire every few frames and
/// jumps to hyperspace now and then. Elapsed times jitter around 16 ms so the
/// log exercises quantization.
pub fn scripted_frame(step: u32) -> Frame {
    let phase = f64::from(step % 240) / 240.0;
    let turn = (phase * std::f64::consts::TAU).sin() * 0.8;
    let thrust = if step % 90 < 30 { 0.66 } else { 0.0 };
    let fire = step % 7 < 2;
    let hyperspace = step % 400 == 399;
    let elapsed = 16.0 + f64::from(step % 5) * 0.37;

    let input = InputState::IDLE
        .with(Control::Turn, turn)
        .with(Control::Thrust, thrust)
        .with(Control::Fire, f64::from(u8::from(fire)))
        .with(Control::Hyperspace, f64::from(u8::from(hyperspace)));
    Frame::new(elapsed, TEST_SIZE, input)
}

/// Ticks `game` with `frames` scripted frames.
pub fn run_scripted(game: &mut Game, frames: u32) {
    for step in 0..frames {
        game.tick(&scripted_frame(step));
    }
}

// =============================================================================
// Event Capture
// =============================================================================

/// Shared event tally keyed by event name.
pub type EventCounts = Rc<RefCell<BTreeMap<&'static str, usize>>>;

/// Subscribes a counter to `game` and returns the shared tally.
pub fn count_events(game: &mut Game) -> EventCounts {
    let counts: EventCounts = Rc::default();
    let sink = Rc::clone(&counts);
    game.subscribe(move |event: &GameEvent| {
        *sink.borrow_mut().entry(event.name()).or_insert(0) += 1;
    });
    counts
}

/// Subscribes a recorder that keeps every event.
pub fn record_events(game: &mut Game) -> Rc<RefCell<Vec<GameEvent>>> {
    let events: Rc<RefCell<Vec<GameEvent>>> = Rc::default();
    let sink = Rc::clone(&events);
    game.subscribe(move |event: &GameEvent| sink.borrow_mut().push(*event));
    events
}
