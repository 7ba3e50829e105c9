//! Deterministic replay with input recording and checkpoint verification.
//!
//! Everything that drives a [`FlightEngine`] from the outside is a
//! [`FrameInput`]: frame ticks, resets, takeoffs and resizes. A
//! [`ReplayRecorder`] applies inputs to an engine and logs them, along with a
//! state hash checkpoint every N frames. [`replay`] restores the log's initial
//! snapshot on another engine, feeds it the same inputs, and reports the first
//! checkpoint where the state diverges.
//!
//! # Recording and replaying
//!
//! ```
//! use crashline_engine::prelude::*;
//!
//! let mut engine = FlightEngine::new(FlightConfig::default()).unwrap();
//! engine.attach(RecordingSurface::new(800.0, 600.0));
//! engine.init();
//!
//! let mut recorder = ReplayRecorder::new(engine.capture_snapshot(), 10);
//! recorder.record(&mut engine, FrameInput::StartTakeOff).unwrap();
//! for frame in 0..300 {
//!     let timestamp = frame as f64 * 16.0;
//!     recorder.record(&mut engine, FrameInput::Tick { timestamp }).unwrap();
//! }
//! let log = recorder.finish();
//!
//! let mut other = FlightEngine::new(FlightConfig::default()).unwrap();
//! other.attach(RecordingSurface::new(800.0, 600.0));
//! let result = replay(&mut other, &log).unwrap();
//! assert!(result.completed);
//! assert!(result.first_divergence.is_none());
//! assert_eq!(other.state_hash(), engine.state_hash());
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::{FlightEngine, FrameOutcome};
use crate::snapshot::FlightSnapshot;
use crate::surface::DrawSurface;
use crate::FlightError;

// ---------------------------------------------------------------------------
// FrameInput
// ---------------------------------------------------------------------------

/// One host-side action on the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FrameInput {
    /// A frame callback at the given host time.
    Tick { timestamp: f64 },
    Reset,
    StartTakeOff,
    Resize { width: f64, height: f64 },
}

impl FrameInput {
    /// Apply the input. Returns the frame outcome for ticks.
    pub fn apply<S: DrawSurface>(self, engine: &mut FlightEngine<S>) -> Option<FrameOutcome> {
        match self {
            FrameInput::Tick { timestamp } => Some(engine.tick(timestamp)),
            FrameInput::Reset => {
                engine.reset();
                None
            }
            FrameInput::StartTakeOff => {
                engine.start_take_off();
                None
            }
            FrameInput::Resize { width, height } => {
                engine.update_canvas_size(width, height);
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ReplayLog
// ---------------------------------------------------------------------------

/// An initial snapshot followed by the inputs and checkpoints recorded from
/// it. Serializable to JSON for regression fixtures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayLog {
    /// Replay begins by restoring this snapshot.
    pub initial_snapshot: FlightSnapshot,
    /// Number of `Tick` inputs in `entries`.
    pub total_ticks: u64,
    pub entries: Vec<ReplayEntry>,
}

/// A single entry in a [`ReplayLog`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReplayEntry {
    Input(FrameInput),
    /// State hash after `tick` frames.
    Checkpoint { tick: u64, state_hash: String },
}

/// The outcome of [`replay`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayResult {
    /// Whether every entry was replayed.
    pub completed: bool,
    pub ticks_replayed: u64,
    /// First checkpoint whose hash did not match. `None` if the replay was
    /// deterministic.
    pub first_divergence: Option<ReplayDivergence>,
}

/// A checkpoint mismatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayDivergence {
    pub tick: u64,
    pub expected_hash: String,
    pub actual_hash: String,
}

// ---------------------------------------------------------------------------
// ReplayRecorder
// ---------------------------------------------------------------------------

/// Applies inputs to an engine while building a [`ReplayLog`].
///
/// Tick timestamps must not go backwards.
pub struct ReplayRecorder {
    log: ReplayLog,
    /// Checkpoint every this many ticks. 0 means only explicit checkpoints.
    checkpoint_interval: u64,
    last_timestamp: Option<f64>,
}

impl ReplayRecorder {
    /// Start recording from `snapshot`, which should be the engine's state
    /// before the first recorded input.
    pub fn new(snapshot: FlightSnapshot, checkpoint_interval: u64) -> Self {
        Self {
            log: ReplayLog {
                initial_snapshot: snapshot,
                total_ticks: 0,
                entries: Vec::new(),
            },
            checkpoint_interval,
            last_timestamp: None,
        }
    }

    /// Apply `input` to `engine` and log it.
    ///
    /// # Errors
    ///
    /// [`FlightError::ReplayOutOfOrder`] if a tick is earlier than the
    /// previous one. Nothing is applied in that case.
    pub fn record<S: DrawSurface>(
        &mut self,
        engine: &mut FlightEngine<S>,
        input: FrameInput,
    ) -> Result<Option<FrameOutcome>, FlightError> {
        if let FrameInput::Tick { timestamp } = input {
            if let Some(previous) = self.last_timestamp {
                if timestamp < previous {
                    return Err(FlightError::ReplayOutOfOrder {
                        previous,
                        next: timestamp,
                    });
                }
            }
            self.last_timestamp = Some(timestamp);
        }

        let outcome = input.apply(engine);
        self.log.entries.push(ReplayEntry::Input(input));

        if outcome.is_some() {
            self.log.total_ticks += 1;
            if self.checkpoint_interval > 0 && self.log.total_ticks % self.checkpoint_interval == 0 {
                self.checkpoint(engine);
            }
        }
        Ok(outcome)
    }

    /// Log the engine's current state hash.
    pub fn checkpoint<S: DrawSurface>(&mut self, engine: &FlightEngine<S>) {
        self.log.entries.push(ReplayEntry::Checkpoint {
            tick: self.log.total_ticks,
            state_hash: engine.state_hash(),
        });
    }

    /// Number of ticks recorded so far.
    pub fn ticks_recorded(&self) -> u64 {
        self.log.total_ticks
    }

    pub fn finish(self) -> ReplayLog {
        self.log
    }
}

// ---------------------------------------------------------------------------
// replay
// ---------------------------------------------------------------------------

/// Restore the log's initial snapshot on `engine` and re-apply every input,
/// comparing state hashes at each checkpoint.
///
/// The engine's frame loop is started if it was not running.
///
/// # Errors
///
/// [`FlightError::NotAttached`] if `engine` has no surface (ticks would not
/// run), or any error from
/// [`restore_from_snapshot`](FlightEngine::restore_from_snapshot).
pub fn replay<S: DrawSurface>(
    engine: &mut FlightEngine<S>,
    log: &ReplayLog,
) -> Result<ReplayResult, FlightError> {
    if !engine.is_attached() {
        return Err(FlightError::NotAttached);
    }
    engine.restore_from_snapshot(&log.initial_snapshot)?;
    engine.running = true;

    let mut ticks_replayed = 0;
    let mut first_divergence = None;

    for entry in &log.entries {
        match entry {
            ReplayEntry::Input(input) => {
                if input.apply(engine).is_some() {
                    ticks_replayed += 1;
                }
            }
            ReplayEntry::Checkpoint { tick, state_hash } => {
                let actual = engine.state_hash();
                if first_divergence.is_none() && actual != *state_hash {
                    tracing::warn!(tick, "replay diverged");
                    first_divergence = Some(ReplayDivergence {
                        tick: *tick,
                        expected_hash: state_hash.clone(),
                        actual_hash: actual,
                    });
                }
            }
        }
    }

    Ok(ReplayResult {
        completed: ticks_replayed == log.total_ticks,
        ticks_replayed,
        first_divergence,
    })
}
