//! Validator tests against recorded autopilot sessions.
//!
//! - **Soundness**: honest sessions are accepted with matching summaries
//! - **Completeness**: tampered claims and broken logs are rejected with the
//!   right error kind

use std::sync::OnceLock;

use proptest::prelude::*;

use rockburst_core::game::RULES_VERSION;
use rockburst_core::{Seed, WorldSize};

use crate::{record_session, validate, validate_batch, Submission, ValidationError};

const SIZE: WorldSize = WorldSize::new(960, 720);

/// A finished session, recorded once and shared by every test.
fn honest() -> &'static Submission {
    static SESSION: OnceLock<Submission> = OnceLock::new();
    SESSION.get_or_init(|| record_session(&Seed::from_u64(2024), 200_000, SIZE))
}

mod soundness_tests {
    use super::*;

    #[test]
    fn honest_session_is_accepted() {
        let submission = honest();
        let summary = validate(submission).unwrap();

        assert_eq!(summary.score, submission.score);
        assert_eq!(summary.level, submission.level);
        assert!(summary.frames > 1);
        assert!(summary.duration_ms > 0.0);
        assert!(summary.shots_fired > 0);
        assert!(summary.shots_hit <= summary.shots_fired);
        assert!((0.0..=1.0).contains(&summary.accuracy));
    }

    #[test]
    fn patch_version_is_accepted() {
        let submission = Submission {
            version: format!("{RULES_VERSION}.9"),
            ..honest().clone()
        };
        assert!(validate(&submission).is_ok());
    }

    #[test]
    fn submission_survives_json() {
        let text = serde_json::to_string(honest()).unwrap();
        let parsed: Submission = serde_json::from_str(&text).unwrap();
        assert_eq!(&parsed, honest());
    }

    #[test]
    fn batch_keeps_order() {
        let mut inflated = honest().clone();
        inflated.score += 10;
        let results = validate_batch(&[honest().clone(), inflated, honest().clone()]);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ValidationError::ScoreMismatch { .. })));
        assert_eq!(results[0], results[2]);
    }
}

mod rejection_tests {
    use super::*;

    #[test]
    fn inflated_score_is_rejected() {
        let submission = Submission {
            score: honest().score + 1_000,
            ..honest().clone()
        };
        assert_eq!(
            validate(&submission),
            Err(ValidationError::ScoreMismatch {
                claimed: honest().score + 1_000,
                replayed: honest().score,
            })
        );
    }

    #[test]
    fn wrong_level_is_rejected() {
        let submission = Submission {
            level: honest().level + 1,
            ..honest().clone()
        };
        assert!(matches!(
            validate(&submission),
            Err(ValidationError::LevelMismatch { .. })
        ));
    }

    #[test]
    fn unfinished_session_is_premature() {
        let short = record_session(&Seed::from_u64(2024), 50, SIZE);
        assert_eq!(
            validate(&short),
            Err(ValidationError::PrematureEnd { frames: 51 })
        );
    }

    #[test]
    fn empty_log_is_rejected() {
        let submission = Submission {
            log: String::new(),
            ..honest().clone()
        };
        assert_eq!(validate(&submission), Err(ValidationError::EmptyLog));
    }

    #[test]
    fn malformed_log_is_rejected() {
        let submission = Submission {
            log: format!("[qo,k0]00!{}", &honest().log[9..]),
            ..honest().clone()
        };
        let error = validate(&submission).unwrap_err();
        assert_eq!(error.kind(), "parse");
    }

    #[test]
    fn bad_seed_is_rejected() {
        let submission = Submission {
            seed: "not a seed".to_string(),
            ..honest().clone()
        };
        assert!(matches!(
            validate(&submission),
            Err(ValidationError::InvalidSeed(_))
        ));
    }

    #[test]
    fn other_seed_does_not_reproduce() {
        let submission = Submission {
            seed: Seed::from_u64(1).to_string(),
            ..honest().clone()
        };
        assert!(validate(&submission).is_err());
    }

    #[test]
    fn incompatible_version_is_rejected() {
        let submission = Submission {
            version: "2.0".to_string(),
            ..honest().clone()
        };
        assert_eq!(
            validate(&submission),
            Err(ValidationError::VersionMismatch {
                claimed: "2.0".to_string(),
                supported: RULES_VERSION,
            })
        );
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn any_other_score_is_rejected(delta in 1_u64..1_000_000) {
        let claimed = honest().score + delta;
        let submission = Submission { score: claimed, ..honest().clone() };
        let is_mismatch = matches!(
            validate(&submission),
            Err(ValidationError::ScoreMismatch { claimed: c, .. }) if c == claimed
        );
        prop_assert!(is_mismatch);
    }
}
