use super::{
    analog_digit, analog_from_digit, elapsed_from_units, quantize_elapsed, Frame, ANALOG_CENTER,
    MAX_RUN,
};
use crate::base36;
use crate::geometry::WorldSize;
use crate::input::{Control, InputState};

/// Append-only encoder for the replay log.
///
/// The logger remembers the last logged world size and the held state of
/// every control, so only changes are written. Consecutive frames with the
/// same elapsed time and nothing else to say are collapsed into run tokens.
///
/// # Example
///
/// ```
/// use rockburst_core::geometry::WorldSize;
/// use rockburst_core::input::InputState;
/// use rockburst_core::replay::ReplayLogger;
///
/// let mut logger = ReplayLogger::new();
/// for _ in 0..3 {
///     logger.record(16.0, WorldSize::new(960, 720), InputState::IDLE);
/// }
/// assert_eq!(logger.encoded(), "[qo,k0]4g4g*2");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReplayLogger {
    buffer: String,
    size: Option<WorldSize>,
    turn: Option<u32>,
    thrust: Option<u32>,
    fire: bool,
    hyperspace_held: bool,
    pending: Option<(u32, u32)>,
    frames: usize,
}

impl ReplayLogger {
    /// Creates an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs one frame and returns its canonical form.
    ///
    /// The canonical frame has the quantized elapsed time, the analog values
    /// reconstructed from their digits, the held fire state, and hyperspace
    /// set only on the frame it was pressed. The simulation must run on the
    /// returned frame, not on the raw input, for replays to reproduce.
    pub fn record(&mut self, elapsed_ms: f64, world_size: WorldSize, input: InputState) -> Frame {
        let units = quantize_elapsed(elapsed_ms);
        let mut tokens = String::new();

        if self.size != Some(world_size) {
            tokens.push_str(&format!(
                "[{},{}]",
                base36::encode(u64::from(world_size.width)),
                base36::encode(u64::from(world_size.height))
            ));
            self.size = Some(world_size);
        }
        let size_changed = !tokens.is_empty();

        let mut controls = String::new();
        let turn = analog_digit(input.get(Control::Turn));
        if self.turn.unwrap_or(ANALOG_CENTER) != turn {
            controls.push(char::from(Control::Turn.code()));
            controls.push(base36::digit_char(turn));
        }
        self.turn = Some(turn);

        let thrust = analog_digit(input.get(Control::Thrust));
        if self.thrust.unwrap_or(ANALOG_CENTER) != thrust {
            controls.push(char::from(Control::Thrust.code()));
            controls.push(base36::digit_char(thrust));
        }
        self.thrust = Some(thrust);

        let fire = input.is_pressed(Control::Fire);
        if fire != self.fire {
            controls.push(char::from(Control::Fire.code()));
            self.fire = fire;
        }

        let hyperspace = input.is_pressed(Control::Hyperspace);
        let hyperspace_edge = hyperspace && !self.hyperspace_held;
        if hyperspace_edge {
            controls.push(char::from(Control::Hyperspace.code()));
        }
        self.hyperspace_held = hyperspace;

        if !size_changed && controls.is_empty() {
            match &mut self.pending {
                Some((pending_units, count)) if *pending_units == units && *count < MAX_RUN => {
                    *count += 1;
                }
                _ => {
                    self.flush_pending();
                    self.pending = Some((units, 1));
                }
            }
        } else {
            self.flush_pending();
            self.buffer.push_str(&tokens);
            push_elapsed(&mut self.buffer, units);
            self.buffer.push_str(&controls);
        }
        self.frames += 1;

        Frame::new(
            elapsed_from_units(units),
            world_size,
            InputState::IDLE
                .with(Control::Turn, analog_from_digit(turn))
                .with(Control::Thrust, analog_from_digit(thrust))
                .with(Control::Fire, f64::from(u8::from(fire)))
                .with(Control::Hyperspace, f64::from(u8::from(hyperspace_edge))),
        )
    }

    /// Returns the complete log so far, including any pending run.
    #[must_use]
    pub fn encoded(&self) -> String {
        let mut out = self.buffer.clone();
        if let Some((units, count)) = self.pending {
            push_run(&mut out, units, count);
        }
        out
    }

    /// Returns the number of frames logged.
    #[must_use]
    pub const fn frames(&self) -> usize {
        self.frames
    }

    /// Returns `true` if nothing has been logged.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Discards everything and starts a new log.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn flush_pending(&mut self) {
        if let Some((units, count)) = self.pending.take() {
            push_run(&mut self.buffer, units, count);
        }
    }
}

fn push_elapsed(out: &mut String, units: u32) {
    out.push(base36::digit_char(units / base36::RADIX));
    out.push(base36::digit_char(units % base36::RADIX));
}

fn push_run(out: &mut String, units: u32, count: u32) {
    push_elapsed(out, units);
    if count > 1 {
        out.push('*');
        out.push(base36::digit_char(count));
    }
}
