//! Round stages.
//!
//! A round moves strictly forward through
//! `Idle -> TakingOff -> Flying -> Finished`. Only
//! [`FlightEngine::reset`](crate::engine::FlightEngine::reset) goes back to
//! `Idle`. Cloud spawning is a sub-stage of `Flying`, so it cannot be active
//! in any other stage.

use serde::{Deserialize, Serialize};

/// The current phase of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Stage {
    /// No round running. No physics is integrated.
    #[default]
    Idle,
    /// The plane climbs from the bottom-left toward the flight altitude.
    TakingOff,
    /// The plane holds the flight corner and shakes; the background scrolls.
    Flying {
        /// Whether clouds are spawning and moving. Never reverts within a
        /// round.
        clouds_active: bool,
    },
    /// The plane exploded. Terminal until reset.
    Finished,
}

impl Stage {
    /// Whether a round is running (the plane is airborne and the multiplier
    /// grows).
    pub fn is_in_progress(self) -> bool {
        matches!(self, Stage::TakingOff | Stage::Flying { .. })
    }

    /// Whether clouds are active.
    pub fn clouds_active(self) -> bool {
        matches!(
            self,
            Stage::Flying {
                clouds_active: true
            }
        )
    }

    /// Position of the stage along the round, used to check forward-only
    /// progress.
    pub fn ordinal(self) -> u8 {
        match self {
            Stage::Idle => 0,
            Stage::TakingOff => 1,
            Stage::Flying { .. } => 2,
            Stage::Finished => 3,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Idle => write!(f, "idle"),
            Stage::TakingOff => write!(f, "taking-off"),
            Stage::Flying {
                clouds_active: false,
            } => write!(f, "flying"),
            Stage::Flying {
                clouds_active: true,
            } => write!(f, "flying+clouds"),
            Stage::Finished => write!(f, "finished"),
        }
    }
}
