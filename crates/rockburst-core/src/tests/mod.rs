//! Test module for determinism and integration tests.
//!
//! - **Determinism tests**: same seed and frames give identical games, and a
//!   logged session replays to the same state
//! - **Integration tests**: controls, levels, lives and reset through the
//!   public surface
//! - **Helper functions**: game factories, scripted input and event capture

mod helpers;

pub use helpers::*;
