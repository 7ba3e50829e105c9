//! Tunable constants for a flight round.
//!
//! [`FlightConfig`] collects every number the integrators depend on. All
//! durations are milliseconds in the host's frame clock; all sizes are canvas
//! pixels at the size the canvas had when the value was set.
//!
//! Configs can be built in code or loaded from JSON. Missing JSON fields fall
//! back to [`FlightConfig::default`]:
//!
//! ```
//! use crashline_engine::config::FlightConfig;
//!
//! let config = FlightConfig::from_json(r#"{ "boom_time_ms": 5000.0, "seed": 7 }"#).unwrap();
//! assert_eq!(config.boom_time_ms, 5000.0);
//! assert_eq!(config.multiplier_range, (1.0, 10.0));
//! ```

use serde::{Deserialize, Serialize};

use crate::physics::Size;
use crate::FlightError;

/// Configuration for a [`FlightEngine`](crate::engine::FlightEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    /// Round duration after which the plane explodes.
    pub boom_time_ms: f64,
    /// Multiplier at takeoff and at boom time.
    pub multiplier_range: (f64, f64),
    /// Minimum time between two multiplier updates.
    pub multiplier_interval_ms: f64,
    /// Horizontal speed as a fraction of canvas width per millisecond.
    pub speed: f64,
    /// Side of the square plane sprite.
    pub plane_size: f64,
    /// Distance of the flight altitude from the top (and of the flight
    /// corner from the right edge).
    pub fly_offset: f64,
    /// Parallax offset range of the background.
    pub background_range: (f64, f64),
    /// Parallax offset at which clouds start spawning.
    pub clouds_threshold: f64,
    /// Initial cloud sprite size. The height is re-derived from the cloud
    /// bitmap once one is loaded.
    pub cloud_size: Size,
    /// Time between two cloud batches.
    pub cloud_spawn_interval_ms: f64,
    /// Upper bound of the random part of a cloud batch size.
    pub cloud_batch_max: u32,
    /// Time the plane moves in one shake direction.
    pub shake_duration_ms: f64,
    /// Distance covered in one shake direction.
    pub shake_distance: f64,
    /// Seed for cloud placement.
    pub seed: u64,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            boom_time_ms: 10_000.0,
            multiplier_range: (1.0, 10.0),
            multiplier_interval_ms: 200.0,
            // whole canvas width in three seconds
            speed: 1.0 / 3000.0,
            plane_size: 30.0,
            fly_offset: 30.0,
            background_range: (0.2, 1.0),
            clouds_threshold: 0.5,
            cloud_size: Size {
                width: 60.0,
                height: 20.0,
            },
            cloud_spawn_interval_ms: 500.0,
            cloud_batch_max: 10,
            shake_duration_ms: 2000.0,
            shake_distance: 20.0,
            seed: 0x5EED_F11E,
        }
    }
}

impl FlightConfig {
    /// Parse a config from JSON, filling missing fields from the defaults,
    /// and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`FlightError::ConfigParse`] for malformed JSON and
    /// [`FlightError::InvalidConfig`] for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, FlightError> {
        let config: FlightConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is finite and inside its valid range.
    ///
    /// # Errors
    ///
    /// Returns [`FlightError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> Result<(), FlightError> {
        positive("boom_time_ms", self.boom_time_ms)?;
        positive("multiplier_interval_ms", self.multiplier_interval_ms)?;
        positive("speed", self.speed)?;
        positive("cloud_spawn_interval_ms", self.cloud_spawn_interval_ms)?;
        positive("shake_duration_ms", self.shake_duration_ms)?;
        non_negative("plane_size", self.plane_size)?;
        non_negative("fly_offset", self.fly_offset)?;
        non_negative("shake_distance", self.shake_distance)?;
        positive("cloud_size.width", self.cloud_size.width)?;
        positive("cloud_size.height", self.cloud_size.height)?;

        let (min, max) = self.multiplier_range;
        if !(min.is_finite() && max.is_finite() && min >= 1.0 && min <= max) {
            return Err(invalid(
                "multiplier_range",
                format!("expected 1 <= min <= max, got ({min}, {max})"),
            ));
        }

        let (low, high) = self.background_range;
        if !(low.is_finite() && high.is_finite() && low > 0.0 && low <= high) {
            return Err(invalid(
                "background_range",
                format!("expected 0 < low <= high, got ({low}, {high})"),
            ));
        }
        if !self.clouds_threshold.is_finite() {
            return Err(invalid("clouds_threshold", "must be finite".to_owned()));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> FlightError {
    FlightError::InvalidConfig { field, reason }
}

fn positive(field: &'static str, value: f64) -> Result<(), FlightError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive and finite, got {value}")))
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), FlightError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("must be non-negative and finite, got {value}"),
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
