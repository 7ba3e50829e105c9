//! Frame-rate independent integrators for plane, background, clouds and
//! multiplier.
//!
//! Every function here is a pure step over explicit inputs: canvas size,
//! config and the elapsed milliseconds since the previous frame. The engine
//! decides *which* steps run in a frame; this module only decides *how far*
//! things move.
//!
//! # Flight geometry
//!
//! The plane climbs from the bottom-left corner `(0, H - plane_size)` to the
//! flight corner `(W - plane_size - fly_offset, fly_offset)`. Vertical travel
//! is coupled to horizontal travel by the ratio of the available heights and
//! widths, so the climb ends at the corner whatever the canvas aspect ratio.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::FlightConfig;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A width/height pair in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// Ratio of the previous canvas size to the current one, per axis.
///
/// Dividing a coordinate by the scale maps it from the old canvas into the
/// new one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    /// Scale from `old` to `new`. An axis where either size is zero or not
    /// finite gets a factor of 1: there is no meaningful proportion to carry
    /// over.
    pub fn between(old: Size, new: Size) -> Self {
        fn axis(old: f64, new: f64) -> f64 {
            if old > 0.0 && new > 0.0 && old.is_finite() && new.is_finite() {
                old / new
            } else {
                1.0
            }
        }
        Self {
            x: axis(old.width, new.width),
            y: axis(old.height, new.height),
        }
    }

    /// Whether this scale would leave coordinates unchanged.
    pub fn is_identity(&self) -> bool {
        self.x == 1.0 && self.y == 1.0
    }

    /// Map a point from the old canvas into the new one.
    pub fn apply_point(&self, point: Point) -> Point {
        Point {
            x: point.x / self.x,
            y: point.y / self.y,
        }
    }

    /// Map a size from the old canvas into the new one.
    pub fn apply_size(&self, size: Size) -> Size {
        Size {
            width: size.width / self.x,
            height: size.height / self.y,
        }
    }
}

/// Distance covered during one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Travel {
    /// Rightward distance.
    pub dx: f64,
    /// Upward distance (positive means the plane climbs).
    pub dy: f64,
}

/// Available vertical space over available horizontal space.
///
/// Zero when the canvas is too narrow to hold the plane and its margin.
pub fn climb_ratio(config: &FlightConfig, canvas: Size) -> f64 {
    let margin = config.plane_size + config.fly_offset;
    let available_x = canvas.width - margin;
    if available_x <= 0.0 {
        return 0.0;
    }
    (canvas.height - margin) / available_x
}

/// How far the plane travels in `dt_ms`.
pub fn passed_space(config: &FlightConfig, canvas: Size, dt_ms: f64) -> Travel {
    let dx = config.speed * dt_ms * canvas.width;
    Travel {
        dx,
        dy: dx * climb_ratio(config, canvas),
    }
}

/// Where the plane waits before takeoff.
pub fn initial_plane(config: &FlightConfig, canvas: Size) -> Point {
    Point {
        x: 0.0,
        y: canvas.height - config.plane_size,
    }
}

/// Where the climb ends and the plane holds while flying.
pub fn flight_corner(config: &FlightConfig, canvas: Size) -> Point {
    Point {
        x: canvas.width - config.plane_size - config.fly_offset,
        y: config.fly_offset,
    }
}

/// Advance the climbing plane, never rising above the flight altitude nor
/// passing the right margin.
pub fn takeoff_step(config: &FlightConfig, canvas: Size, plane: Point, travel: Travel) -> Point {
    let corner = flight_corner(config, canvas);
    Point {
        x: (plane.x + travel.dx).min(corner.x),
        y: (plane.y - travel.dy).max(corner.y),
    }
}

/// Advance the background parallax offset, clamped at `upper`.
pub fn parallax_step(
    config: &FlightConfig,
    canvas: Size,
    offset: f64,
    travel: Travel,
    upper: f64,
) -> f64 {
    if canvas.height <= 0.0 {
        return offset;
    }
    let next = offset + travel.dy * climb_ratio(config, canvas) / canvas.height;
    next.min(upper)
}

// ---------------------------------------------------------------------------
// Shake
// ---------------------------------------------------------------------------

/// Current vertical direction of the flying plane's wobble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShakeDirection {
    /// Towards the top of the canvas. The first leg of every flight.
    #[default]
    Up,
    /// Towards the bottom of the canvas.
    Down,
}

impl ShakeDirection {
    pub fn flipped(self) -> Self {
        match self {
            ShakeDirection::Up => ShakeDirection::Down,
            ShakeDirection::Down => ShakeDirection::Up,
        }
    }

    fn sign(self) -> f64 {
        match self {
            ShakeDirection::Up => -1.0,
            ShakeDirection::Down => 1.0,
        }
    }
}

/// Vertical wobble of the flying plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shake {
    pub direction: ShakeDirection,
    /// Distance covered in one direction.
    pub distance: f64,
    /// Displacement from the flight altitude, screen-down positive.
    pub offset: f64,
}

impl Shake {
    pub fn new(distance: f64) -> Self {
        Self {
            direction: ShakeDirection::default(),
            distance,
            offset: 0.0,
        }
    }

    /// Move along the current direction for `dt_ms`.
    pub fn step(&mut self, dt_ms: f64, duration_ms: f64) {
        self.offset += self.direction.sign() * dt_ms * self.distance / duration_ms;
    }
}

// ---------------------------------------------------------------------------
// Multiplier
// ---------------------------------------------------------------------------

/// The round multiplier. It can only grow; a new round starts a new value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Multiplier(f64);

impl Multiplier {
    pub const ONE: Multiplier = Multiplier(1.0);

    pub fn value(self) -> f64 {
        self.0
    }

    /// Grow by `delta`, capped at `max`. Negative or non-finite deltas are
    /// ignored.
    pub fn grow(&mut self, delta: f64, max: f64) {
        if delta.is_finite() && delta > 0.0 {
            self.0 = (self.0 + delta).min(max).max(self.0);
        }
    }

    /// The value as shown to players.
    pub fn label(self) -> String {
        format!("x{:.2}", self.0)
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self::ONE
    }
}

/// Multiplier growth accumulated over `elapsed_ms`.
///
/// Linear over the round: the multiplier moves from the bottom of
/// `multiplier_range` to the top in exactly `boom_time_ms`.
pub fn multiplier_growth(config: &FlightConfig, elapsed_ms: f64) -> f64 {
    let (min, max) = config.multiplier_range;
    (max - min) / config.boom_time_ms * elapsed_ms
}

// ---------------------------------------------------------------------------
// Clouds
// ---------------------------------------------------------------------------

/// A cloud sprite position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cloud {
    pub x: f64,
    pub y: f64,
    low: bool,
}

impl Cloud {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, low: false }
    }

    /// Whether the cloud dropped below the midline. Low clouds are no longer
    /// drawn and are removed at the end of the frame.
    pub fn is_low(&self) -> bool {
        self.low
    }

    fn mark_low(&mut self) {
        self.low = true;
    }
}

/// Number of clouds in the next batch: `round(r * max) + 1`.
pub fn cloud_batch_size<R: Rng>(rng: &mut R, max: u32) -> usize {
    let r: f64 = rng.gen();
    (r * max as f64).round() as usize + 1
}

/// Spawn `count` clouds just above the top edge, spread over the right half
/// of the canvas and one canvas width beyond it.
pub fn spawn_clouds<R: Rng>(rng: &mut R, count: usize, canvas: Size, cloud: Size) -> Vec<Cloud> {
    let span = (canvas.width - cloud.width).max(0.0);
    (0..count)
        .map(|_| {
            let r: f64 = rng.gen();
            Cloud::new(canvas.width / 2.0 + r * span, -cloud.height)
        })
        .collect()
}

/// Scroll clouds against the plane's travel and mark the ones that reached
/// the vertical midline.
pub fn move_clouds(clouds: &mut [Cloud], travel: Travel, canvas_height: f64) {
    for cloud in clouds.iter_mut() {
        cloud.x -= travel.dx;
        cloud.y += travel.dy;
        if cloud.y >= canvas_height / 2.0 {
            cloud.mark_low();
        }
    }
}

/// Remove clouds marked low.
pub fn purge_low_clouds(clouds: &mut Vec<Cloud>) {
    clouds.retain(|cloud| !cloud.is_low());
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
