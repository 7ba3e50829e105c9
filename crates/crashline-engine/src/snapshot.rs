//! Engine state capture and restore with BLAKE3 hashing.
//!
//! [`FlightSnapshot`] is a serializable copy of everything that determines how
//! the next frames play out: stage, positions, clouds, multiplier, clock,
//! canvas, pending work and the cloud RNG state. Its `hash` is a BLAKE3
//! digest of those fields, so two engines that played the same inputs from
//! the same config agree on [`FlightEngine::state_hash`].
//!
//! ```
//! use crashline_engine::prelude::*;
//!
//! let mut engine = FlightEngine::new(FlightConfig::default()).unwrap();
//! engine.attach(RecordingSurface::new(800.0, 600.0));
//! engine.init();
//! engine.start_take_off();
//! engine.tick(0.0);
//! engine.tick(1000.0);
//!
//! let snapshot = engine.capture_snapshot();
//! assert_eq!(snapshot.hash.len(), 64);
//!
//! engine.tick(2000.0);
//! assert_ne!(engine.state_hash(), snapshot.hash);
//!
//! engine.restore_from_snapshot(&snapshot).unwrap();
//! assert_eq!(engine.state_hash(), snapshot.hash);
//! ```
//!
//! # What Is NOT Captured
//!
//! - the drawing surface and bitmaps, which belong to the host;
//! - event subscriptions;
//! - whether the frame loop is running.

use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::config::FlightConfig;
use crate::engine::{FlightEngine, RoundClock};
use crate::physics::{Cloud, Multiplier, Point, Shake, Size, Travel};
use crate::stage::Stage;
use crate::surface::DrawSurface;
use crate::update::UpdateSet;
use crate::FlightError;

/// Hashed part of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightState {
    pub config: FlightConfig,
    pub stage: Stage,
    pub plane: Point,
    pub shake: Shake,
    pub background_offset: f64,
    pub clouds: Vec<Cloud>,
    pub cloud_size: Size,
    pub multiplier: Multiplier,
    pub clock: RoundClock,
    pub canvas: Size,
    pub resize_to: Option<Size>,
    pub pending: UpdateSet,
    pub travel: Travel,
    pub rng: Pcg64Mcg,
    pub frame_count: u64,
}

/// A serializable snapshot of the engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSnapshot {
    pub state: FlightState,
    /// BLAKE3 hex digest (64 lowercase hex chars) of `state`.
    pub hash: String,
}

fn compute_hash(state: &FlightState) -> String {
    let json_bytes =
        serde_json::to_vec(state).expect("FlightState should always be JSON-serializable");
    blake3::hash(&json_bytes).to_hex().to_string()
}

impl<S: DrawSurface> FlightEngine<S> {
    fn flight_state(&self) -> FlightState {
        FlightState {
            config: self.config.clone(),
            stage: self.stage,
            plane: self.plane,
            shake: self.shake,
            background_offset: self.background_offset,
            clouds: self.clouds.clone(),
            cloud_size: self.cloud_size,
            multiplier: self.multiplier,
            clock: self.clock,
            canvas: self.canvas,
            resize_to: self.resize_to,
            pending: self.pending,
            travel: self.travel,
            rng: self.rng.clone(),
            frame_count: self.frame_count,
        }
    }

    /// Capture the current state with its digest.
    pub fn capture_snapshot(&self) -> FlightSnapshot {
        let state = self.flight_state();
        let hash = compute_hash(&state);
        FlightSnapshot { state, hash }
    }

    /// Digest of the current state, same as `capture_snapshot().hash`.
    pub fn state_hash(&self) -> String {
        compute_hash(&self.flight_state())
    }

    /// Restore a previously captured state.
    ///
    /// The digest is verified first; on mismatch the engine is left
    /// untouched. An attached surface is resized to the snapshot's canvas.
    ///
    /// # Errors
    ///
    /// [`FlightError::SnapshotHashMismatch`] if the snapshot was altered, or
    /// [`FlightError::InvalidConfig`] if its config does not validate.
    pub fn restore_from_snapshot(&mut self, snapshot: &FlightSnapshot) -> Result<(), FlightError> {
        let recomputed = compute_hash(&snapshot.state);
        if recomputed != snapshot.hash {
            return Err(FlightError::SnapshotHashMismatch {
                recorded: snapshot.hash.clone(),
                recomputed,
            });
        }
        snapshot.state.config.validate()?;

        let state = snapshot.state.clone();
        self.config = state.config;
        self.stage = state.stage;
        self.plane = state.plane;
        self.shake = state.shake;
        self.background_offset = state.background_offset;
        self.clouds = state.clouds;
        self.cloud_size = state.cloud_size;
        self.multiplier = state.multiplier;
        self.clock = state.clock;
        self.canvas = state.canvas;
        self.resize_to = state.resize_to;
        self.pending = state.pending;
        self.travel = state.travel;
        self.rng = state.rng;
        self.frame_count = state.frame_count;

        if let Some(surface) = self.surface.as_mut() {
            surface.set_size(self.canvas);
        }
        tracing::debug!(stage = %self.stage, frame = self.frame_count, "state restored");
        Ok(())
    }
}
