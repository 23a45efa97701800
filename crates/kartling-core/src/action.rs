//! Action taxonomy and the label/signal codec.
//!
//! The agent reasons about exactly seven discrete actions. A trained classifier emits an
//! [`ActionLabel`]; the codec turns it into the [`ControlSignal`] a drive controller
//! consumes. The inverse direction labels recorded human input when building training
//! data, and the two directions are kept consistent: for every label,
//! `ActionLabel::from_signal(label.to_signal()) == label`.
//!
//! # Wire names
//!
//! Recorded datasets store labels under their upper-snake wire names (`ACCELERATE`,
//! `LEFT_BRAKE`, ...). [`fmt::Display`] and [`FromStr`] round-trip those names, and the
//! serde representation matches them, so a dataset written by the recorder can be read
//! back without a translation table.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The seven discrete driving actions.
///
/// `None` is the default and the fallback whenever no rule matches (no pedal pressed,
/// or a classifier output index outside the trained class range).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionLabel {
    #[default]
    None,
    Accelerate,
    Brake,
    LeftAccelerate,
    RightAccelerate,
    LeftBrake,
    RightBrake,
}

/// All labels, in taxonomy order. Useful for exhaustive property tests.
pub const ALL_ACTION_LABELS: [ActionLabel; 7] = [
    ActionLabel::None,
    ActionLabel::Accelerate,
    ActionLabel::Brake,
    ActionLabel::LeftAccelerate,
    ActionLabel::RightAccelerate,
    ActionLabel::LeftBrake,
    ActionLabel::RightBrake,
];

/// Continuous control output consumed by a downstream drive controller.
///
/// `turn` is in `[-1.0, 1.0]`; negative steers left. The codec only ever emits
/// `-1.0`, `0.0`, or `1.0`, but the inverse direction accepts any magnitude because
/// recorded human input may be analog.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlSignal {
    pub accelerate: bool,
    pub brake: bool,
    pub turn: f32,
}

impl ActionLabel {
    /// The stable name used in recorded CSV datasets.
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            ActionLabel::None => "NONE",
            ActionLabel::Accelerate => "ACCELERATE",
            ActionLabel::Brake => "BRAKE",
            ActionLabel::LeftAccelerate => "LEFT_ACCELERATE",
            ActionLabel::RightAccelerate => "RIGHT_ACCELERATE",
            ActionLabel::LeftBrake => "LEFT_BRAKE",
            ActionLabel::RightBrake => "RIGHT_BRAKE",
        }
    }

    /// Decodes this label into the control signal a drive controller consumes.
    ///
    /// Total over all seven labels; `None` maps to the all-false/zero signal.
    #[must_use]
    pub fn to_signal(self) -> ControlSignal {
        let mut signal = ControlSignal::default();
        match self {
            ActionLabel::None => {}
            ActionLabel::Accelerate => signal.accelerate = true,
            ActionLabel::Brake => signal.brake = true,
            ActionLabel::LeftAccelerate => {
                signal.accelerate = true;
                signal.turn = -1.0;
            }
            ActionLabel::RightAccelerate => {
                signal.accelerate = true;
                signal.turn = 1.0;
            }
            ActionLabel::LeftBrake => {
                signal.brake = true;
                signal.turn = -1.0;
            }
            ActionLabel::RightBrake => {
                signal.brake = true;
                signal.turn = 1.0;
            }
        }
        signal
    }

    /// Infers the label for a recorded control signal.
    ///
    /// Branches on `accelerate` first, then `brake`, else `None`. Within a branch the
    /// sign of `turn` alone selects the left/right variant; magnitude is ignored so that
    /// analog steering input still labels cleanly.
    #[must_use]
    pub fn from_signal(signal: ControlSignal) -> Self {
        if signal.accelerate {
            if signal.turn < 0.0 {
                ActionLabel::LeftAccelerate
            } else if signal.turn > 0.0 {
                ActionLabel::RightAccelerate
            } else {
                ActionLabel::Accelerate
            }
        } else if signal.brake {
            if signal.turn < 0.0 {
                ActionLabel::LeftBrake
            } else if signal.turn > 0.0 {
                ActionLabel::RightBrake
            } else {
                ActionLabel::Brake
            }
        } else {
            ActionLabel::None
        }
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Error returned when a string is not one of the seven wire names.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("unknown action label '{name}'")]
pub struct ParseActionLabelError {
    pub name: String,
}

impl FromStr for ActionLabel {
    type Err = ParseActionLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_ACTION_LABELS
            .into_iter()
            .find(|label| label.wire_name() == s)
            .ok_or_else(|| ParseActionLabelError {
                name: s.to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_round_trip_all_labels() {
        for label in ALL_ACTION_LABELS {
            let signal = label.to_signal();
            assert_eq!(
                ActionLabel::from_signal(signal),
                label,
                "round trip failed for {label}, signal {signal:?}",
            );
        }
    }

    #[test]
    fn test_none_is_all_false_zero() {
        let signal = ActionLabel::None.to_signal();
        assert!(!signal.accelerate);
        assert!(!signal.brake);
        assert_eq!(signal.turn, 0.0);
        assert_eq!(ActionLabel::from_signal(signal), ActionLabel::None);
    }

    #[test]
    fn test_turn_sign_not_magnitude_selects_variant() {
        let left = ControlSignal {
            accelerate: true,
            brake: false,
            turn: -0.25,
        };
        assert_eq!(ActionLabel::from_signal(left), ActionLabel::LeftAccelerate);

        let right = ControlSignal {
            accelerate: false,
            brake: true,
            turn: 0.01,
        };
        assert_eq!(ActionLabel::from_signal(right), ActionLabel::RightBrake);
    }

    #[test]
    fn test_accelerate_wins_over_brake() {
        // Both pedals pressed: the accelerate branch is checked first.
        let both = ControlSignal {
            accelerate: true,
            brake: true,
            turn: 0.0,
        };
        assert_eq!(ActionLabel::from_signal(both), ActionLabel::Accelerate);
    }

    #[test]
    fn test_wire_name_round_trip() {
        for label in ALL_ACTION_LABELS {
            let parsed: ActionLabel = label.wire_name().parse().unwrap();
            assert_eq!(parsed, label);
        }
        assert!("PIROUETTE".parse::<ActionLabel>().is_err());
    }
}
