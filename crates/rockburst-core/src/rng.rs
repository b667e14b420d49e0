//! Seeded random generator used for every random decision in the simulation.
//!
//! The generator keeps a 55-value history of `u32`s, newest first. Each draw
//! removes the oldest value, XORs it with the value [`TAP`] slots from the
//! front, and pushes the result to the front. The result, divided by `2^32`,
//! is the unit value every bounded draw is built from.
//!
//! # Determinism
//!
//! Once seeded, the sequence of draws is a pure function of the seed and the
//! order of calls. Callers must never make the number or order of draws depend
//! on anything outside the simulation, or recorded replays stop reproducing.
//!
//! # Example
//!
//! ```
//! use rockburst_core::rng::{Seed, SeededRng};
//!
//! let seed = Seed::from_u64(7);
//! let mut a = SeededRng::new(&seed);
//! let mut b = SeededRng::new(&seed);
//!
//! for _ in 0..100 {
//!     assert_eq!(a.next_int(1, 6), b.next_int(1, 6));
//! }
//! ```

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::base36;

/// Number of values in the generator history.
pub const HISTORY_LEN: usize = 55;

/// Distance from the front of the history of the value combined with the
/// oldest one.
pub const TAP: usize = 24;

/// `2^32`, the divisor normalizing a raw draw into `[0, 1)`.
const UNIT_SCALE: f64 = 4_294_967_296.0;

// =============================================================================
// Seed
// =============================================================================

/// Errors produced when parsing or constructing a [`Seed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeedError {
    /// The seed did not contain exactly [`HISTORY_LEN`] values.
    #[error("seed must contain {expected} values, found {found}")]
    WrongLength {
        /// Required number of values
        expected: usize,
        /// Number of values present
        found: usize,
    },
    /// A value was empty or contained a non base-36 digit.
    #[error("seed value {index} is not a base-36 number: {value:?}")]
    InvalidValue {
        /// Position of the value in the list
        index: usize,
        /// The offending text
        value: String,
    },
    /// A value does not fit in 32 bits.
    #[error("seed value {index} does not fit in 32 bits")]
    Overflow {
        /// Position of the value in the list
        index: usize,
    },
    /// Every value is zero, which makes the generator emit only zeros.
    #[error("seed history is all zeros")]
    Degenerate,
}

/// The exact generator state needed to reproduce a random sequence.
///
/// Values are stored newest first. The textual form is the values in that
/// order, base-36 encoded and joined with commas.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed([u32; HISTORY_LEN]);

impl Seed {
    /// Creates a seed from an explicit history.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError::Degenerate`] if every value is zero.
    pub fn new(values: [u32; HISTORY_LEN]) -> Result<Self, SeedError> {
        if values.iter().all(|&v| v == 0) {
            return Err(SeedError::Degenerate);
        }
        Ok(Self(values))
    }

    /// Expands a 64-bit number into a full history.
    ///
    /// This is a convenience for tests and tools that want to name a seed
    /// with a single number; the expansion itself is deterministic.
    #[must_use]
    pub fn from_u64(value: u64) -> Self {
        let mut source = ChaCha8Rng::seed_from_u64(value);
        let mut values = [0u32; HISTORY_LEN];
        for slot in &mut values {
            *slot = source.next_u32();
        }
        if values.iter().all(|&v| v == 0) {
            values[0] = 1;
        }
        Self(values)
    }

    /// Draws a fresh seed from a non-reproducible source.
    #[must_use]
    pub fn fresh() -> Self {
        let mut source = rand::thread_rng();
        let mut values = [0u32; HISTORY_LEN];
        for slot in &mut values {
            *slot = source.gen();
        }
        if values.iter().all(|&v| v == 0) {
            values[0] = 1;
        }
        Self(values)
    }

    /// Returns the history values, newest first.
    #[must_use]
    pub const fn values(&self) -> &[u32; HISTORY_LEN] {
        &self.0
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({})", self)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(&base36::encode(u64::from(*value)))?;
        }
        Ok(())
    }
}

impl FromStr for Seed {
    type Err = SeedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(',').collect();
        if parts.len() != HISTORY_LEN {
            return Err(SeedError::WrongLength {
                expected: HISTORY_LEN,
                found: parts.len(),
            });
        }

        let mut values = [0u32; HISTORY_LEN];
        for (index, (slot, part)) in values.iter_mut().zip(&parts).enumerate() {
            let part = part.trim();
            let value = base36::decode(part).ok_or_else(|| {
                if !part.is_empty() && part.bytes().all(|b| base36::digit_value(b).is_some()) {
                    SeedError::Overflow { index }
                } else {
                    SeedError::InvalidValue {
                        index,
                        value: part.to_string(),
                    }
                }
            })?;
            *slot = u32::try_from(value).map_err(|_| SeedError::Overflow { index })?;
        }
        Self::new(values)
    }
}

impl Serialize for Seed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Seed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Lagged XOR generator over a 55-value history.
///
/// The history is a ring buffer; `head` is the slot holding the newest value
/// and front index `i` lives at `(head + i) % HISTORY_LEN`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    history: [u32; HISTORY_LEN],
    head: usize,
    draws: u64,
}

impl SeededRng {
    /// Creates a generator that replays the sequence of `seed`.
    #[must_use]
    pub fn new(seed: &Seed) -> Self {
        Self {
            history: seed.0,
            head: 0,
            draws: 0,
        }
    }

    /// Creates a generator from a fresh, non-reproducible seed.
    ///
    /// Use [`SeededRng::seed`] before the first draw to capture the seed for
    /// a replay submission.
    #[must_use]
    pub fn fresh() -> Self {
        Self::new(&Seed::fresh())
    }

    /// Returns the current history as a seed.
    ///
    /// Before any draw this is the seed the generator was created with.
    #[must_use]
    pub fn seed(&self) -> Seed {
        let mut values = [0u32; HISTORY_LEN];
        for (i, slot) in values.iter_mut().enumerate() {
            *slot = self.history[(self.head + i) % HISTORY_LEN];
        }
        Seed(values)
    }

    /// Returns the number of draws made so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    /// Advances the history by one step and returns the new front value.
    pub fn next_u32(&mut self) -> u32 {
        let oldest = (self.head + HISTORY_LEN - 1) % HISTORY_LEN;
        let tapped = self.history[(self.head + TAP) % HISTORY_LEN];
        let value = self.history[oldest] ^ tapped;
        self.history[oldest] = value;
        self.head = oldest;
        self.draws += 1;
        value
    }

    /// Returns a value in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        f64::from(self.next_u32()) / UNIT_SCALE
    }

    /// Returns an integer in `[min, max]`, both inclusive.
    ///
    /// Computed as `floor(unit * (max - min + 1)) + min`.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn next_int(&mut self, min: i64, max: i64) -> i64 {
        debug_assert!(max >= min, "next_int called with max < min");
        let span = (max - min + 1) as f64;
        (self.next_unit() * span).floor() as i64 + min
    }

    /// Returns a float in `[min, max)`.
    pub fn next_float(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_unit() * (max - min)
    }

    /// Returns an angle in `[0, TAU)`.
    pub fn next_angle(&mut self) -> f64 {
        self.next_float(0.0, TAU)
    }

    /// Returns `true` or `false` with equal probability.
    pub fn next_bool(&mut self) -> bool {
        self.next_int(0, 1) == 1
    }

    /// Returns `true` with probability `p`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_unit() < p
    }

    /// Picks an index into a collection of `len` items.
    ///
    /// Returns `None` without drawing when `len` is zero.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.next_int(0, len as i64 - 1) as usize)
    }
}

// =============================================================================
// Tests
// =============================================================================
