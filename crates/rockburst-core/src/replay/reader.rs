use thiserror::Error;

use super::{analog_from_digit, elapsed_from_units, Frame, ANALOG_CENTER, ANALOG_MAX_DIGIT, MAX_RUN};
use crate::base36;
use crate::geometry::WorldSize;
use crate::input::{Control, InputState};

/// Errors produced while decoding a replay log.
///
/// Every variant carries the byte offset at which decoding failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogParseError {
    /// The log ended in the middle of a frame.
    #[error("log ended at byte {offset}, expected {expected}")]
    UnexpectedEnd {
        /// Byte offset
        offset: usize,
        /// What the decoder was looking for
        expected: &'static str,
    },
    /// A byte that cannot appear at this position.
    #[error("unexpected character {found:?} at byte {offset}")]
    UnexpectedCharacter {
        /// Byte offset
        offset: usize,
        /// The offending character
        found: char,
    },
    /// An uppercase letter that is not a control code.
    #[error("unknown control code {code:?} at byte {offset}")]
    UnknownControl {
        /// Byte offset
        offset: usize,
        /// The offending code
        code: char,
    },
    /// A run token with a count outside `2..=35`.
    #[error("invalid run length {length} at byte {offset}")]
    InvalidRunLength {
        /// Byte offset
        offset: usize,
        /// Decoded count
        length: u32,
    },
    /// An analog digit of 35.
    #[error("analog value digit {digit} out of range at byte {offset}")]
    AnalogOutOfRange {
        /// Byte offset
        offset: usize,
        /// Decoded digit
        digit: u32,
    },
    /// A world size that is zero or does not fit in 32 bits.
    #[error("invalid world size at byte {offset}")]
    InvalidWorldSize {
        /// Byte offset
        offset: usize,
    },
    /// The first frame did not declare a world size.
    #[error("first frame at byte {offset} has no world size")]
    MissingWorldSize {
        /// Byte offset
        offset: usize,
    },
}

impl LogParseError {
    /// Returns the byte offset at which decoding failed.
    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::UnexpectedEnd { offset, .. }
            | Self::UnexpectedCharacter { offset, .. }
            | Self::UnknownControl { offset, .. }
            | Self::InvalidRunLength { offset, .. }
            | Self::AnalogOutOfRange { offset, .. }
            | Self::InvalidWorldSize { offset }
            | Self::MissingWorldSize { offset } => *offset,
        }
    }
}

/// Restartable decoder over a replay log.
///
/// Yields one `Result<Frame, LogParseError>` per frame, expanding run tokens.
/// After the first error the iterator is exhausted; call
/// [`LogReader::restart`] to decode again from the beginning.
///
/// # Example
///
/// ```
/// use rockburst_core::input::Control;
/// use rockburst_core::replay::LogReader;
///
/// let mut reader = LogReader::new("[qo,k0]0aF0a*2");
/// let frames: Vec<_> = reader.by_ref().collect::<Result<_, _>>().unwrap();
/// assert_eq!(frames.len(), 3);
/// assert!(frames.iter().all(|f| f.input.is_pressed(Control::Fire)));
///
/// reader.restart();
/// assert_eq!(reader.count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct LogReader<'a> {
    log: &'a str,
    bytes: &'a [u8],
    pos: usize,
    size: Option<WorldSize>,
    turn: u32,
    thrust: u32,
    fire: bool,
    repeat: Option<(Frame, u32)>,
    failed: bool,
}

impl<'a> LogReader<'a> {
    /// Creates a reader over `log`.
    #[must_use]
    pub fn new(log: &'a str) -> Self {
        Self {
            log,
            bytes: log.as_bytes(),
            pos: 0,
            size: None,
            turn: ANALOG_CENTER,
            thrust: ANALOG_CENTER,
            fire: false,
            repeat: None,
            failed: false,
        }
    }

    /// Rewinds to the start of the log and forgets all held state.
    pub fn restart(&mut self) {
        *self = Self::new(self.source());
    }

    /// Returns the log being decoded.
    #[must_use]
    pub const fn source(&self) -> &'a str {
        self.log
    }

    /// Returns the byte offset of the next unread byte.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn digit(&mut self, expected: &'static str) -> Result<u32, LogParseError> {
        let offset = self.pos;
        let byte = self.peek().ok_or(LogParseError::UnexpectedEnd { offset, expected })?;
        let value = base36::digit_value(byte).ok_or(LogParseError::UnexpectedCharacter {
            offset,
            found: char::from(byte),
        })?;
        self.pos += 1;
        Ok(value)
    }

    fn expect(&mut self, wanted: u8, expected: &'static str) -> Result<(), LogParseError> {
        let offset = self.pos;
        match self.peek() {
            Some(byte) if byte == wanted => {
                self.pos += 1;
                Ok(())
            }
            Some(byte) => Err(LogParseError::UnexpectedCharacter {
                offset,
                found: char::from(byte),
            }),
            None => Err(LogParseError::UnexpectedEnd { offset, expected }),
        }
    }

    fn dimension(&mut self, start: usize) -> Result<u32, LogParseError> {
        let mut value = u64::from(self.digit("world size digit")?);
        while let Some(digit) = self.peek().and_then(base36::digit_value) {
            self.pos += 1;
            value = value
                .checked_mul(u64::from(base36::RADIX))
                .and_then(|v| v.checked_add(u64::from(digit)))
                .filter(|v| *v <= u64::from(u32::MAX))
                .ok_or(LogParseError::InvalidWorldSize { offset: start })?;
        }
        match u32::try_from(value) {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(LogParseError::InvalidWorldSize { offset: start }),
        }
    }

    fn world_size(&mut self) -> Result<WorldSize, LogParseError> {
        let start = self.pos;
        self.expect(b'[', "'['")?;
        let width = self.dimension(start)?;
        self.expect(b',', "','")?;
        let height = self.dimension(start)?;
        self.expect(b']', "']'")?;
        Ok(WorldSize::new(width, height))
    }

    fn analog(&mut self) -> Result<u32, LogParseError> {
        let offset = self.pos;
        let digit = self.digit("analog digit")?;
        if digit > ANALOG_MAX_DIGIT {
            return Err(LogParseError::AnalogOutOfRange { offset, digit });
        }
        Ok(digit)
    }

    fn canonical_input(&self, hyperspace: bool) -> InputState {
        InputState::IDLE
            .with(Control::Turn, analog_from_digit(self.turn))
            .with(Control::Thrust, analog_from_digit(self.thrust))
            .with(Control::Fire, f64::from(u8::from(self.fire)))
            .with(Control::Hyperspace, f64::from(u8::from(hyperspace)))
    }

    fn frame(&mut self) -> Result<Frame, LogParseError> {
        let frame_start = self.pos;
        if self.peek() == Some(b'[') {
            self.size = Some(self.world_size()?);
        }
        let size = self
            .size
            .ok_or(LogParseError::MissingWorldSize { offset: frame_start })?;

        let high = self.digit("elapsed digit")?;
        let low = self.digit("elapsed digit")?;
        let elapsed_ms = elapsed_from_units(high * base36::RADIX + low);

        if self.peek() == Some(b'*') {
            self.pos += 1;
            let offset = self.pos;
            let length = self.digit("run length digit")?;
            if !(2..=MAX_RUN).contains(&length) {
                return Err(LogParseError::InvalidRunLength { offset, length });
            }
            let frame = Frame::new(elapsed_ms, size, self.canonical_input(false));
            self.repeat = Some((frame, length - 1));
            return Ok(frame);
        }

        let mut hyperspace = false;
        while let Some(code) = self.peek().filter(u8::is_ascii_uppercase) {
            let offset = self.pos;
            self.pos += 1;
            match Control::from_code(code) {
                Some(Control::Turn) => self.turn = self.analog()?,
                Some(Control::Thrust) => self.thrust = self.analog()?,
                Some(Control::Fire) => self.fire = !self.fire,
                Some(Control::Hyperspace) => hyperspace = true,
                None => {
                    return Err(LogParseError::UnknownControl {
                        offset,
                        code: char::from(code),
                    })
                }
            }
        }

        Ok(Frame::new(elapsed_ms, size, self.canonical_input(hyperspace)))
    }
}

impl Iterator for LogReader<'_> {
    type Item = Result<Frame, LogParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if let Some((frame, remaining)) = self.repeat {
            self.repeat = (remaining > 1).then_some((frame, remaining - 1));
            return Some(Ok(frame));
        }
        if self.pos >= self.bytes.len() {
            return None;
        }
        let result = self.frame();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

/// Decodes a whole log, stopping at the first error.
///
/// # Errors
///
/// Returns the first [`LogParseError`] encountered.
pub fn decode_all(log: &str) -> Result<Vec<Frame>, LogParseError> {
    LogReader::new(log).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod decode_tests {
        use super::*;

        #[test]
        fn empty_log_has_no_frames() {
            assert_eq!(decode_all("").unwrap(), Vec::new());
        }

        #[test]
        fn held_state_carries_forward() {
            let frames = decode_all("[qo,k0]0aTyUh0aH0aF").unwrap();
            assert_eq!(frames.len(), 3);
            assert_eq!(frames[0].world_size, WorldSize::new(960, 720));
            assert!((frames[0].input.get(Control::Turn) - 1.0).abs() < f64::EPSILON);
            assert!(frames[0].input.get(Control::Thrust).abs() < f64::EPSILON);
            assert!((frames[2].input.get(Control::Turn) - 1.0).abs() < f64::EPSILON);
            assert_eq!(frames[2].world_size, WorldSize::new(960, 720));
            assert!(frames[1].input.is_pressed(Control::Hyperspace));
            assert!(!frames[2].input.is_pressed(Control::Hyperspace));
            assert!(frames[2].input.is_pressed(Control::Fire));
        }

        #[test]
        fn run_expands() {
            let frames = decode_all("[1,1]zz*3").unwrap();
            assert_eq!(frames.len(), 3);
            assert!(frames.iter().all(|f| (f.elapsed_ms - 129.5).abs() < f64::EPSILON));
        }

        #[test]
        fn restart_replays_from_start() {
            let mut reader = LogReader::new("[1,1]00*2");
            assert!(reader.next().is_some());
            reader.restart();
            assert_eq!(reader.offset(), 0);
            assert_eq!(reader.count(), 2);
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn missing_world_size() {
            assert_eq!(
                decode_all("0a").unwrap_err(),
                LogParseError::MissingWorldSize { offset: 0 }
            );
        }

        #[test]
        fn truncated_elapsed() {
            assert_eq!(
                decode_all("[1,1]0").unwrap_err(),
                LogParseError::UnexpectedEnd {
                    offset: 6,
                    expected: "elapsed digit"
                }
            );
        }

        #[test]
        fn bad_elapsed_character() {
            assert_eq!(
                decode_all("[1,1]0a!").unwrap_err(),
                LogParseError::UnexpectedCharacter { offset: 7, found: '!' }
            );
        }

        #[test]
        fn unknown_control() {
            let err = decode_all("[1,1]0aX").unwrap_err();
            assert_eq!(err, LogParseError::UnknownControl { offset: 7, code: 'X' });
            assert_eq!(err.offset(), 7);
        }

        #[test]
        fn run_length_bounds() {
            assert_eq!(
                decode_all("[1,1]0a*1").unwrap_err(),
                LogParseError::InvalidRunLength { offset: 8, length: 1 }
            );
            assert_eq!(
                decode_all("[1,1]0a*0").unwrap_err(),
                LogParseError::InvalidRunLength { offset: 8, length: 0 }
            );
            assert!(decode_all("[1,1]0a*z").is_ok());
        }

        #[test]
        fn analog_out_of_range() {
            assert_eq!(
                decode_all("[1,1]0aTz").unwrap_err(),
                LogParseError::AnalogOutOfRange { offset: 8, digit: 35 }
            );
        }

        #[test]
        fn zero_world_size() {
            assert_eq!(
                decode_all("[0,5]00").unwrap_err(),
                LogParseError::InvalidWorldSize { offset: 0 }
            );
        }

        #[test]
        fn oversized_world_size() {
            assert_eq!(
                decode_all("[1z141z4,1]00").unwrap_err(),
                LogParseError::InvalidWorldSize { offset: 0 }
            );
        }

        #[test]
        fn unterminated_size() {
            assert_eq!(
                decode_all("[1,1").unwrap_err(),
                LogParseError::UnexpectedEnd {
                    offset: 4,
                    expected: "']'"
                }
            );
        }

        #[test]
        fn stops_after_first_error() {
            let mut reader = LogReader::new("[1,1]00X00");
            assert!(reader.next().is_some_and(|r| r.is_err()));
            assert!(reader.next().is_none());
        }
    }
}
