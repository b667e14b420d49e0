//! Tuning constants and rule-set versioning.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::UfoClass;

/// Version of the rule set implemented by [`GameConfig::default`].
///
/// Replays are only comparable between builds whose rule versions share the
/// same major and minor number.
pub const RULES_VERSION: &str = "1.0";

/// Number of asteroid size generations. Generation 0 is the largest.
pub const GENERATIONS: u8 = 3;

/// Number of fragments a non-terminal asteroid splits into.
pub const CHILDREN_COUNT: usize = 2;

/// Tuning for one UFO class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UfoClassConfig {
    /// Outline radius
    pub radius: f64,
    /// Horizontal speed, units per second
    pub speed: f64,
    /// Points for destroying it
    pub score: u64,
    /// Milliseconds between shots
    pub fire_interval_ms: f64,
}

/// Every tuning constant of the simulation.
///
/// Missing fields deserialize to their defaults, so a partial JSON object
/// overrides only what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Longest frame the simulation accepts, in milliseconds
    pub max_elapsed_ms: f64,

    /// Lives at the start of a game
    pub starting_lives: u32,
    /// Extra lives never raise the count above this
    pub max_lives: u32,
    /// An extra life is granted each time the score crosses a multiple of this
    pub extra_life_every: u64,

    /// Pause between clearing the last asteroid and the next level
    pub level_delay_ms: f64,
    /// Pause between losing the ship and respawning it
    pub respawn_delay_ms: f64,
    /// Clearance required around a placement point
    pub safe_distance: f64,
    /// Random draws tried when looking for a safe point
    pub placement_attempts: u32,

    /// Forward acceleration at full thrust, units per second squared
    pub ship_thrust: f64,
    /// Linear friction coefficient, per second
    pub ship_friction: f64,
    /// Speed clamp, units per second
    pub ship_max_speed: f64,
    /// Angular acceleration at full turn, radians per second squared
    pub ship_turn_acceleration: f64,
    /// Angular friction when not turning, per second
    pub ship_turn_friction: f64,
    /// Angular speed clamp, radians per second
    pub ship_max_turn_speed: f64,
    /// Minimum time between single shots
    pub fire_cooldown_ms: f64,

    /// Muzzle speed of ship projectiles before the ship velocity is added
    pub projectile_speed: f64,
    /// Lower bound of a ship projectile's final speed
    pub projectile_min_speed: f64,
    /// Upper bound of a ship projectile's final speed
    pub projectile_max_speed: f64,
    /// Collision radius of every projectile
    pub projectile_radius: f64,
    /// Lifetime of a ship projectile
    pub ship_projectile_life_ms: f64,

    /// Length of the full-auto window after shooting down a UFO
    pub powerup_duration_ms: f64,
    /// Time between shots while full-auto is active and fire is held
    pub auto_fire_interval_ms: f64,

    /// Total hyperspace window; the ship reappears at its midpoint
    pub hyperspace_duration_ms: f64,
    /// Time after a jump before the next one is allowed
    pub hyperspace_cooldown_ms: f64,

    /// Outline radius per generation
    pub asteroid_radii: [f64; GENERATIONS as usize],
    /// `(min, max)` speed per generation
    pub asteroid_speeds: [(f64, f64); GENERATIONS as usize],
    /// Points per generation
    pub asteroid_scores: [u64; GENERATIONS as usize],
    /// Asteroids on level 1
    pub initial_asteroids: u32,
    /// Additional asteroids per level
    pub asteroids_per_level: u32,
    /// Upper bound on asteroids spawned for a level
    pub max_asteroids: u32,
    /// Speed bonus per level after the first, as a fraction
    pub level_speed_bonus: f64,
    /// Cap on the accumulated speed bonus
    pub max_level_speed_bonus: f64,
    /// Minimum angle between sibling fragments, radians
    pub child_min_separation: f64,

    /// Shortest wait before the next UFO
    pub ufo_delay_min_ms: f64,
    /// Longest wait before the next UFO
    pub ufo_delay_max_ms: f64,
    /// UFOs alive at once
    pub max_ufos: usize,
    /// Probability of a small UFO at score 0
    pub ufo_small_chance_easy: f64,
    /// Probability of a small UFO at and above `ufo_hard_score`
    pub ufo_small_chance_hard: f64,
    /// Score at which UFOs reach full difficulty
    pub ufo_hard_score: u64,
    /// Large UFO tuning
    pub ufo_large: UfoClassConfig,
    /// Small UFO tuning
    pub ufo_small: UfoClassConfig,
    /// Time between vertical direction changes
    pub ufo_shift_interval_ms: f64,
    /// Vertical speed as a fraction of horizontal speed
    pub ufo_vertical_speed_ratio: f64,
    /// Speed of UFO projectiles
    pub ufo_projectile_speed: f64,
    /// Lifetime of a UFO projectile
    pub ufo_projectile_life_ms: f64,
    /// Aim error in radians at score 0
    pub ufo_inaccuracy_max: f64,
    /// Aim error in radians at and above `ufo_hard_score`
    pub ufo_inaccuracy_min: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_elapsed_ms: 100.0,

            starting_lives: 3,
            max_lives: 5,
            extra_life_every: 10_000,

            level_delay_ms: 2000.0,
            respawn_delay_ms: 2000.0,
            safe_distance: 120.0,
            placement_attempts: 12,

            ship_thrust: 280.0,
            ship_friction: 0.6,
            ship_max_speed: 360.0,
            ship_turn_acceleration: 28.0,
            ship_turn_friction: 10.0,
            ship_max_turn_speed: 5.0,
            fire_cooldown_ms: 220.0,

            projectile_speed: 520.0,
            projectile_min_speed: 420.0,
            projectile_max_speed: 760.0,
            projectile_radius: 2.0,
            ship_projectile_life_ms: 900.0,

            powerup_duration_ms: 6000.0,
            auto_fire_interval_ms: 90.0,

            hyperspace_duration_ms: 1000.0,
            hyperspace_cooldown_ms: 4000.0,

            asteroid_radii: [42.0, 22.0, 11.0],
            asteroid_speeds: [(30.0, 70.0), (60.0, 110.0), (90.0, 150.0)],
            asteroid_scores: [20, 50, 100],
            initial_asteroids: 4,
            asteroids_per_level: 1,
            max_asteroids: 11,
            level_speed_bonus: 0.08,
            max_level_speed_bonus: 0.8,
            child_min_separation: 0.6,

            ufo_delay_min_ms: 9000.0,
            ufo_delay_max_ms: 16000.0,
            max_ufos: 2,
            ufo_small_chance_easy: 0.1,
            ufo_small_chance_hard: 0.75,
            ufo_hard_score: 40_000,
            ufo_large: UfoClassConfig {
                radius: 22.0,
                speed: 90.0,
                score: 200,
                fire_interval_ms: 1400.0,
            },
            ufo_small: UfoClassConfig {
                radius: 12.0,
                speed: 140.0,
                score: 1000,
                fire_interval_ms: 1100.0,
            },
            ufo_shift_interval_ms: 1500.0,
            ufo_vertical_speed_ratio: 0.5,
            ufo_projectile_speed: 300.0,
            ufo_projectile_life_ms: 1300.0,
            ufo_inaccuracy_max: 0.45,
            ufo_inaccuracy_min: 0.04,
        }
    }
}

impl GameConfig {
    /// Returns the tuning for a UFO class.
    #[must_use]
    pub const fn ufo_class(&self, class: UfoClass) -> &UfoClassConfig {
        match class {
            UfoClass::Large => &self.ufo_large,
            UfoClass::Small => &self.ufo_small,
        }
    }

    /// Number of asteroids spawned at the start of `level`.
    #[must_use]
    pub fn asteroid_count(&self, level: u32) -> u32 {
        self.initial_asteroids
            .saturating_add(level.saturating_sub(1).saturating_mul(self.asteroids_per_level))
            .min(self.max_asteroids)
    }

    /// Speed multiplier for asteroids spawned on `level`.
    #[must_use]
    pub fn speed_factor(&self, level: u32) -> f64 {
        let bonus = f64::from(level.saturating_sub(1)) * self.level_speed_bonus;
        1.0 + bonus.min(self.max_level_speed_bonus)
    }

    /// Fraction of full UFO difficulty reached at `score`, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn difficulty(&self, score: u64) -> f64 {
        if self.ufo_hard_score == 0 {
            return 1.0;
        }
        (score as f64 / self.ufo_hard_score as f64).min(1.0)
    }

    /// Probability that the next UFO is small.
    #[must_use]
    pub fn small_ufo_chance(&self, score: u64) -> f64 {
        let t = self.difficulty(score);
        self.ufo_small_chance_easy + (self.ufo_small_chance_hard - self.ufo_small_chance_easy) * t
    }

    /// Aim error bound for small UFOs.
    #[must_use]
    pub fn ufo_inaccuracy(&self, score: u64) -> f64 {
        let t = self.difficulty(score);
        self.ufo_inaccuracy_max + (self.ufo_inaccuracy_min - self.ufo_inaccuracy_max) * t
    }
}

// =============================================================================
// Versioning
// =============================================================================

/// Errors from comparing a claimed rule version with [`RULES_VERSION`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The version is not `major.minor` or `major.minor.patch`.
    #[error("malformed rules version {0:?}")]
    Malformed(String),
    /// The version names a different rule set.
    #[error("rules version {claimed} is not compatible with {supported}")]
    Incompatible {
        /// Version in the submission
        claimed: String,
        /// Version this build implements
        supported: &'static str,
    },
}

fn major_minor(version: &str) -> Option<(u32, u32)> {
    let parts = version
        .trim()
        .split('.')
        .map(|part| part.parse::<u32>().ok())
        .collect::<Option<Vec<_>>>()?;
    match parts.as_slice() {
        [major, minor] | [major, minor, _] => Some((*major, *minor)),
        _ => None,
    }
}

/// Checks that `claimed` is compatible with [`RULES_VERSION`].
///
/// # Errors
///
/// Returns [`VersionError::Malformed`] if `claimed` cannot be parsed and
/// [`VersionError::Incompatible`] if its major or minor number differs.
pub fn check_version(claimed: &str) -> Result<(), VersionError> {
    let theirs = major_minor(claimed).ok_or_else(|| VersionError::Malformed(claimed.to_string()))?;
    let ours = major_minor(RULES_VERSION).ok_or_else(|| VersionError::Malformed(RULES_VERSION.to_string()))?;
    if theirs == ours {
        Ok(())
    } else {
        Err(VersionError::Incompatible {
            claimed: claimed.to_string(),
            supported: RULES_VERSION,
        })
    }
}
