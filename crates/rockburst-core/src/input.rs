//! Player controls and per-frame input state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a control's value is interpreted and logged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ControlMode {
    /// Continuous value in `[-1, 1]`, logged whenever its quantized digit changes.
    Analog,
    /// Held on/off state, logged as a toggle when it changes.
    Level,
    /// Only the press matters, logged on the frame it happens.
    Edge,
}

/// A player control.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    /// Rotation, negative is counter-clockwise.
    Turn,
    /// Forward thrust. Negative values are treated as zero.
    Thrust,
    /// Fire the ship's gun.
    Fire,
    /// Jump to hyperspace.
    Hyperspace,
}

impl Control {
    /// Every control in log order.
    pub const ALL: [Self; 4] = [Self::Turn, Self::Thrust, Self::Fire, Self::Hyperspace];

    /// Returns the control name used by [`InputState::from_named`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Turn => "turn",
            Self::Thrust => "thrust",
            Self::Fire => "fire",
            Self::Hyperspace => "hyperspace",
        }
    }

    /// Looks a control up by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Returns the uppercase code the replay log uses.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Turn => b'T',
            Self::Thrust => b'U',
            Self::Fire => b'F',
            Self::Hyperspace => b'H',
        }
    }

    /// Looks a control up by its log code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            b'T' => Some(Self::Turn),
            b'U' => Some(Self::Thrust),
            b'F' => Some(Self::Fire),
            b'H' => Some(Self::Hyperspace),
            _ => None,
        }
    }

    /// Returns how values of this control are interpreted.
    #[must_use]
    pub const fn mode(self) -> ControlMode {
        match self {
            Self::Turn | Self::Thrust => ControlMode::Analog,
            Self::Fire => ControlMode::Level,
            Self::Hyperspace => ControlMode::Edge,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Turn => 0,
            Self::Thrust => 1,
            Self::Fire => 2,
            Self::Hyperspace => 3,
        }
    }
}

impl fmt::Display for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of every control for one frame.
///
/// Analog controls hold values in `[-1, 1]`; digital controls hold 0 or 1.
#[derive(Debug, Copy, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    values: [f64; 4],
}

impl InputState {
    /// All controls released.
    pub const IDLE: Self = Self { values: [0.0; 4] };

    /// Returns the value of `control`.
    #[must_use]
    pub const fn get(&self, control: Control) -> f64 {
        self.values[control.index()]
    }

    /// Sets `control`, clamping to the control's valid range.
    ///
    /// Non-finite values count as released.
    pub fn set(&mut self, control: Control, value: f64) {
        let value = if value.is_finite() { value } else { 0.0 };
        self.values[control.index()] = match control.mode() {
            ControlMode::Analog => value.clamp(-1.0, 1.0),
            ControlMode::Level | ControlMode::Edge => {
                if value > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        };
    }

    /// Builder form of [`InputState::set`].
    #[must_use]
    pub fn with(mut self, control: Control, value: f64) -> Self {
        self.set(control, value);
        self
    }

    /// Returns `true` if a digital control is held.
    #[must_use]
    pub fn is_pressed(&self, control: Control) -> bool {
        self.get(control) > 0.0
    }

    /// Builds a state from `(name, value)` pairs; unknown names are ignored.
    #[must_use]
    pub fn from_named<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        pairs
            .into_iter()
            .fold(Self::IDLE, |state, (name, value)| match Control::from_name(name) {
                Some(control) => state.with(control, value),
                None => state,
            })
    }

    /// Returns `true` if every control is released.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }
}
