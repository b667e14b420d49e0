//! # Rockburst Verify
//!
//! Server-side validation of Rockburst score submissions.
//!
//! A submission carries the seed, the replay log and the claimed outcome of
//! one game. [`validate`] replays the log against a fresh simulation with the
//! default rules and accepts the claim only if the replay ends the game with
//! the same score and level.
//!
//! Validations share nothing, so [`validate_batch`] runs them in parallel.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::cell::RefCell;
use std::rc::Rc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use rockburst_core::entity::{DestroyCause, ProjectileOwner, UfoClass};
use rockburst_core::game::{check_version, RULES_VERSION};
use rockburst_core::{
    Control, Frame, Game, GameConfig, GameEvent, InputState, LogParseError, LogReader, Seed,
    SeedError, WorldSize,
};

#[cfg(test)]
mod tests;

// =============================================================================
// Submission
// =============================================================================

/// A claimed game outcome together with the evidence for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Rules version of the client that played the game
    pub version: String,
    /// Generator seed at game start, in its printed form
    pub seed: String,
    /// Replay log
    pub log: String,
    /// Claimed final score
    pub score: u64,
    /// Claimed final level
    pub level: u32,
}

/// Why a submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The seed string does not parse.
    #[error("invalid seed: {0}")]
    InvalidSeed(#[from] SeedError),

    /// The log holds no frames.
    #[error("replay log is empty")]
    EmptyLog,

    /// The log is malformed.
    #[error("replay log is malformed: {0}")]
    Parse(#[from] LogParseError),

    /// The log ran out before the game finished.
    #[error("replay log ended after {frames} frames without finishing the game")]
    PrematureEnd {
        /// Frames consumed
        frames: usize,
    },

    /// The replayed score differs from the claim.
    #[error("claimed score {claimed} but replay scored {replayed}")]
    ScoreMismatch {
        /// Score in the submission
        claimed: u64,
        /// Score reached by the replay
        replayed: u64,
    },

    /// The replayed level differs from the claim.
    #[error("claimed level {claimed} but replay reached level {replayed}")]
    LevelMismatch {
        /// Level in the submission
        claimed: u32,
        /// Level reached by the replay
        replayed: u32,
    },

    /// The client played under different rules.
    #[error("client rules version {claimed} is not compatible with {supported}")]
    VersionMismatch {
        /// Version in the submission
        claimed: String,
        /// Version this validator implements
        supported: &'static str,
    },
}

impl ValidationError {
    /// Returns a stable snake-case name for the variant.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSeed(_) => "invalid_seed",
            Self::EmptyLog => "empty_log",
            Self::Parse(_) => "parse",
            Self::PrematureEnd { .. } => "premature_end",
            Self::ScoreMismatch { .. } => "score_mismatch",
            Self::LevelMismatch { .. } => "level_mismatch",
            Self::VersionMismatch { .. } => "version_mismatch",
        }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Statistics derived from an accepted replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySummary {
    /// Simulated game time in milliseconds
    pub duration_ms: f64,
    /// Frames consumed from the log, including the initial one
    pub frames: usize,
    /// Projectiles fired by the ship
    pub shots_fired: u64,
    /// Ship projectiles that hit an asteroid or a UFO
    pub shots_hit: u64,
    /// `shots_hit / shots_fired`, or 0 when nothing was fired
    pub accuracy: f64,
    /// Asteroids destroyed by the player
    pub asteroids_destroyed: u64,
    /// Large UFOs destroyed by the player
    pub ufos_large: u64,
    /// Small UFOs destroyed by the player
    pub ufos_small: u64,
    /// Final score
    pub score: u64,
    /// Final level
    pub level: u32,
}

/// Running counters fed from the game's event stream.
#[derive(Debug, Default)]
struct Tally {
    shots_fired: u64,
    shots_hit: u64,
    asteroids_destroyed: u64,
    ufos_large: u64,
    ufos_small: u64,
}

impl Tally {
    fn observe(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::ProjectileCreated {
                owner: ProjectileOwner::Ship,
                ..
            } => self.shots_fired += 1,
            GameEvent::ProjectileDestroyed {
                owner: ProjectileOwner::Ship,
                cause: DestroyCause::Asteroid | DestroyCause::Ufo,
                ..
            } => self.shots_hit += 1,
            GameEvent::AsteroidDestroyed { cause, .. } if cause.awards_points() => {
                self.asteroids_destroyed += 1;
            }
            GameEvent::UfoDestroyed { class, cause, .. } if cause.awards_points() => match class {
                UfoClass::Large => self.ufos_large += 1,
                UfoClass::Small => self.ufos_small += 1,
            },
            _ => {}
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn accuracy(&self) -> f64 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f64 / self.shots_fired as f64
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Replays a submission and checks its claim.
///
/// # Errors
///
/// Returns the first [`ValidationError`] that applies, checked in this
/// order: version, seed, empty log, log syntax, premature end, score, level.
pub fn validate(submission: &Submission) -> Result<ReplaySummary, ValidationError> {
    let result = replay(submission);
    match &result {
        Ok(summary) => info!(
            score = summary.score,
            level = summary.level,
            frames = summary.frames,
            "submission accepted"
        ),
        Err(error) => warn!(kind = error.kind(), %error, "submission rejected"),
    }
    result
}

fn replay(submission: &Submission) -> Result<ReplaySummary, ValidationError> {
    check_version(&submission.version).map_err(|_| ValidationError::VersionMismatch {
        claimed: submission.version.clone(),
        supported: RULES_VERSION,
    })?;
    let seed: Seed = submission.seed.parse()?;

    let mut reader = LogReader::new(&submission.log);
    let first = reader.next().ok_or(ValidationError::EmptyLog)??;

    let mut game = Game::new(GameConfig::default(), &seed);
    let tally = Rc::new(RefCell::new(Tally::default()));
    let sink = Rc::clone(&tally);
    game.subscribe(move |event| sink.borrow_mut().observe(event));

    game.set_world_size(first.world_size);
    game.start();

    let mut frames = 1;
    for record in reader {
        if game.state().is_finished() {
            break;
        }
        game.tick(&record?);
        frames += 1;
    }

    let state = game.state();
    if !state.is_finished() {
        return Err(ValidationError::PrematureEnd { frames });
    }
    if state.score != submission.score {
        return Err(ValidationError::ScoreMismatch {
            claimed: submission.score,
            replayed: state.score,
        });
    }
    if state.level != submission.level {
        return Err(ValidationError::LevelMismatch {
            claimed: submission.level,
            replayed: state.level,
        });
    }

    let tally = tally.borrow();
    Ok(ReplaySummary {
        duration_ms: state.timestamp,
        frames,
        shots_fired: tally.shots_fired,
        shots_hit: tally.shots_hit,
        accuracy: tally.accuracy(),
        asteroids_destroyed: tally.asteroids_destroyed,
        ufos_large: tally.ufos_large,
        ufos_small: tally.ufos_small,
        score: state.score,
        level: state.level,
    })
}

/// Validates many submissions in parallel, one simulation per submission.
///
/// Results are returned in input order.
#[must_use]
pub fn validate_batch(submissions: &[Submission]) -> Vec<Result<ReplaySummary, ValidationError>> {
    submissions.par_iter().map(validate).collect()
}

// =============================================================================
// Recording
// =============================================================================

/// Input of a simple autopilot on frame `step`.
///
/// Always thrusts, weaves left and right, and taps fire twice a second. It
/// flies into things soon enough that sessions end on their own.
#[must_use]
pub fn autopilot_frame(step: u32, world_size: WorldSize) -> Frame {
    let turn = if (step / 45) % 2 == 0 { 0.6 } else { -0.4 };
    let fire = step % 30 < 3;
    let input = InputState::IDLE
        .with(Control::Turn, turn)
        .with(Control::Thrust, 1.0)
        .with(Control::Fire, f64::from(u8::from(fire)));
    Frame::new(16.0, world_size, input)
}

/// Plays an autopilot session with logging enabled and packages it as a
/// submission.
///
/// The session stops when the game finishes or after `max_frames` ticks,
/// whichever comes first. A session cut short does not validate.
#[must_use]
pub fn record_session(seed: &Seed, max_frames: u32, world_size: WorldSize) -> Submission {
    let mut game = Game::new(GameConfig::default(), seed);
    game.set_world_size(world_size);
    game.enable_logging();
    game.start();

    for step in 0..max_frames {
        if game.state().is_finished() {
            break;
        }
        game.tick(&autopilot_frame(step, world_size));
    }

    let state = game.state();
    info!(
        score = state.score,
        level = state.level,
        finished = state.is_finished(),
        "session recorded"
    );
    Submission {
        version: RULES_VERSION.to_string(),
        seed: game.replay_seed().to_string(),
        log: game.replay_log().unwrap_or_default(),
        score: state.score,
        level: state.level,
    }
}
