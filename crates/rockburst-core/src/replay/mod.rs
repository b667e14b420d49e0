//! Replay log codec.
//!
//! A replay log is a dense ASCII string of frames. Each frame carries the
//! elapsed time since the previous frame, the world size when it changed, and
//! the control changes that happened on that frame:
//!
//! ```text
//! log     := frame*
//! frame   := size? elapsed (run | control*)
//! size    := '[' base36 ',' base36 ']'
//! elapsed := digit digit              ; 100 µs units, 0..=1295
//! run     := '*' digit                ; total frames in the run, 2..=35
//! control := 'T' digit | 'U' digit    ; turn / thrust, analog
//!          | 'F'                      ; fire toggled
//!          | 'H'                      ; hyperspace pressed
//! ```
//!
//! Digits are base-36 (`0-9a-z`). Control codes are uppercase, so they can
//! never be confused with the next frame's elapsed digits.
//!
//! [`ReplayLogger`] encodes and [`LogReader`] decodes. Decoding the logger's
//! output yields exactly the canonical frames the logger returned from
//! [`ReplayLogger::record`].

mod logger;
mod reader;

pub use logger::ReplayLogger;
pub use reader::{decode_all, LogParseError, LogReader};

use serde::{Deserialize, Serialize};

use crate::geometry::WorldSize;
use crate::input::InputState;

/// Maximum elapsed value in log units (`zz`).
pub const MAX_ELAPSED_UNITS: u32 = 1295;

/// Log units per millisecond (one unit is 100 µs).
pub const UNITS_PER_MS: f64 = 10.0;

/// Largest number of frames one run token can stand for.
pub const MAX_RUN: u32 = 35;

/// Analog digit for a released control.
pub const ANALOG_CENTER: u32 = 17;

/// Largest valid analog digit.
pub const ANALOG_MAX_DIGIT: u32 = 34;

/// One simulation input record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Milliseconds since the previous frame
    pub elapsed_ms: f64,
    /// World size in effect for this frame
    pub world_size: WorldSize,
    /// Control values for this frame
    pub input: InputState,
}

impl Frame {
    /// Creates a frame.
    #[must_use]
    pub const fn new(elapsed_ms: f64, world_size: WorldSize, input: InputState) -> Self {
        Self {
            elapsed_ms,
            world_size,
            input,
        }
    }
}

/// Quantizes milliseconds to log units, saturating at both ends.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn quantize_elapsed(elapsed_ms: f64) -> u32 {
    if !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
        return 0;
    }
    (elapsed_ms * UNITS_PER_MS)
        .round()
        .min(f64::from(MAX_ELAPSED_UNITS)) as u32
}

/// Converts log units back to milliseconds.
#[must_use]
pub fn elapsed_from_units(units: u32) -> f64 {
    f64::from(units) / UNITS_PER_MS
}

/// Maps an analog value in `[-1, 1]` to its log digit `0..=34`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn analog_digit(value: f64) -> u32 {
    if !value.is_finite() {
        return ANALOG_CENTER;
    }
    ((value.clamp(-1.0, 1.0) * f64::from(ANALOG_CENTER)).round() + f64::from(ANALOG_CENTER)) as u32
}

/// Maps an analog log digit back to its canonical value.
#[must_use]
pub fn analog_from_digit(digit: u32) -> f64 {
    (f64::from(digit) - f64::from(ANALOG_CENTER)) / f64::from(ANALOG_CENTER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Control;

    mod quantize_tests {
        use super::*;

        #[test]
        fn elapsed_rounds_to_100us() {
            assert_eq!(quantize_elapsed(16.66), 167);
            assert_eq!(quantize_elapsed(0.04), 0);
            assert_eq!(quantize_elapsed(-5.0), 0);
            assert_eq!(quantize_elapsed(f64::NAN), 0);
            assert_eq!(quantize_elapsed(129.5), MAX_ELAPSED_UNITS);
            assert_eq!(quantize_elapsed(10_000.0), MAX_ELAPSED_UNITS);
        }

        #[test]
        fn analog_digits_span_range() {
            assert_eq!(analog_digit(-1.0), 0);
            assert_eq!(analog_digit(0.0), ANALOG_CENTER);
            assert_eq!(analog_digit(1.0), ANALOG_MAX_DIGIT);
            assert_eq!(analog_digit(7.0), ANALOG_MAX_DIGIT);
            assert_eq!(analog_digit(f64::INFINITY), ANALOG_CENTER);
            assert!((analog_from_digit(0) + 1.0).abs() < f64::EPSILON);
            assert!((analog_from_digit(ANALOG_MAX_DIGIT) - 1.0).abs() < f64::EPSILON);
        }
    }

    mod roundtrip_tests {
        use super::*;

        #[test]
        fn max_elapsed_survives() {
            let size = WorldSize::new(800, 600);
            let mut logger = ReplayLogger::new();
            let canonical = logger.record(129.5, size, InputState::IDLE);
            assert!((canonical.elapsed_ms - 129.5).abs() < f64::EPSILON);

            let frames = decode_all(&logger.encoded()).unwrap();
            assert_eq!(frames, vec![canonical]);
        }

        #[test]
        fn idle_frame_is_valid_noop() {
            let size = WorldSize::new(800, 600);
            let mut logger = ReplayLogger::new();
            logger.record(0.0, size, InputState::IDLE);
            let frames = decode_all(&logger.encoded()).unwrap();
            assert_eq!(frames.len(), 1);
            assert!(frames[0].input.is_idle());
            assert!(frames[0].elapsed_ms.abs() < f64::EPSILON);
        }
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn raw_frame() -> impl Strategy<Value = (f64, u8, f64, f64, bool, bool)> {
            (
                0.0f64..200.0,
                0u8..4,
                -1.5f64..1.5,
                -1.0f64..1.0,
                any::<bool>(),
                any::<bool>(),
            )
        }

        proptest! {
            #[test]
            fn decode_matches_canonical(raw in prop::collection::vec(raw_frame(), 1..120)) {
                let sizes = [
                    WorldSize::new(960, 720),
                    WorldSize::new(960, 720),
                    WorldSize::new(1280, 720),
                    WorldSize::new(1, 46_655),
                ];
                let mut logger = ReplayLogger::new();
                let mut canonical = Vec::new();
                for (elapsed, size, turn, thrust, fire, hyper) in raw {
                    let input = InputState::IDLE
                        .with(Control::Turn, turn)
                        .with(Control::Thrust, thrust)
                        .with(Control::Fire, f64::from(u8::from(fire)))
                        .with(Control::Hyperspace, f64::from(u8::from(hyper)));
                    canonical.push(logger.record(elapsed, sizes[usize::from(size)], input));
                }

                let decoded = decode_all(&logger.encoded()).unwrap();
                prop_assert_eq!(decoded, canonical);
            }

            #[test]
            fn idle_runs_roundtrip(count in 1usize..200, elapsed in 0.0f64..130.0) {
                let size = WorldSize::new(640, 480);
                let mut logger = ReplayLogger::new();
                let canonical: Vec<Frame> = (0..count)
                    .map(|_| logger.record(elapsed, size, InputState::IDLE))
                    .collect();
                let decoded = decode_all(&logger.encoded()).unwrap();
                prop_assert_eq!(decoded, canonical);
            }
        }
    }
}
