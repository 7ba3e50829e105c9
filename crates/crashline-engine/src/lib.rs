//! Crashline Engine -- animation and state engine for a crash-style round.
//!
//! A plane takes off, climbs while a multiplier grows, and explodes once the
//! configured boom time has elapsed. The [`FlightEngine`](engine::FlightEngine)
//! owns simulation time, stage transitions, the plane/background/cloud
//! integrators and the multiplier. It knows nothing about how frames are
//! scheduled or how pixels reach the screen: the host drives it through
//! [`tick`](engine::FlightEngine::tick) and hands it a
//! [`DrawSurface`](surface::DrawSurface).
//!
//! # Quick Start
//!
//! ```
//! use crashline_engine::prelude::*;
//!
//! let mut engine = FlightEngine::new(FlightConfig::default()).unwrap();
//! engine.attach(RecordingSurface::new(800.0, 600.0));
//! engine.init();
//! engine.start_take_off();
//!
//! let mut ts = 0.0;
//! while engine.tick(ts).reschedule && ts < 12_000.0 {
//!     ts += 1000.0 / 60.0;
//! }
//!
//! assert_eq!(engine.stage(), Stage::Finished);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod events;
pub mod physics;
pub mod render;
pub mod replay;
pub mod snapshot;
pub mod stage;
pub mod surface;
pub mod update;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the flight engine.
#[derive(Debug, thiserror::Error)]
pub enum FlightError {
    /// A configuration value is out of its valid range.
    #[error("invalid config field '{field}': {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// Configuration JSON could not be parsed.
    #[error("failed to parse flight config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A snapshot's recorded digest does not match its contents.
    #[error("snapshot hash mismatch: recorded {recorded} but recomputed {recomputed}")]
    SnapshotHashMismatch {
        recorded: String,
        recomputed: String,
    },

    /// The operation needs a bound drawing surface.
    #[error("no drawing surface attached")]
    NotAttached,

    /// A replay frame was recorded with an earlier timestamp than the one
    /// before it.
    #[error("frame at {next} ms recorded after frame at {previous} ms")]
    ReplayOutOfOrder {
        previous: f64,
        next: f64,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::FlightConfig;
    pub use crate::engine::{FlightEngine, FrameOutcome};
    pub use crate::events::{EventBus, EventKind, FlightEvent, SubscriptionId};
    pub use crate::physics::{Cloud, Multiplier, Point, ShakeDirection, Size};
    pub use crate::replay::{
        replay, FrameInput, ReplayDivergence, ReplayEntry, ReplayLog, ReplayRecorder,
        ReplayResult,
    };
    pub use crate::snapshot::FlightSnapshot;
    pub use crate::stage::Stage;
    pub use crate::surface::{
        Bitmap, Color, DrawCall, DrawSurface, ImageHandle, QuadraticCurve, Rect,
        RecordingSurface,
    };
    pub use crate::update::{PendingUpdate, UpdateSet};
    pub use crate::FlightError;
}
