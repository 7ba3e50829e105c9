//! The flight engine and its frame loop.
//!
//! [`FlightEngine`] is driven by the host's frame scheduler. Each call to
//! [`tick`](FlightEngine::tick):
//!
//! 1. Evaluates stage transitions and timers once, collecting the integrators
//!    due this frame into the pending [`UpdateSet`].
//! 2. If anything is pending, runs each integrator once in a fixed order,
//!    clears the surface, draws the frame and empties the set.
//! 3. Purges clouds marked low and records the frame timestamp.
//! 4. Reports whether the host should schedule another frame, which is the
//!    case exactly while a surface is attached.
//!
//! All motion is computed from elapsed host time, not frame count, so the
//! engine behaves the same at 30 Hz, 144 Hz, or with dropped frames.
//!
//! # Example
//!
//! ```
//! use crashline_engine::prelude::*;
//!
//! let mut engine = FlightEngine::new(FlightConfig::default()).unwrap();
//! engine.attach(RecordingSurface::new(800.0, 600.0));
//! engine.init();
//! assert!(engine.start_take_off());
//!
//! engine.tick(0.0);
//! engine.tick(5000.0);
//! assert!(engine.stage().is_in_progress());
//! assert!(engine.multiplier() > 1.0);
//!
//! let surface = engine.detach().unwrap();
//! assert!(surface.clear_count() > 0);
//! assert!(!engine.tick(5016.0).reschedule);
//! ```

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

use crate::config::FlightConfig;
use crate::events::{EventBus, EventKind, FlightEvent, SubscriptionId};
use crate::physics::{self, Cloud, Multiplier, Point, Scale, Shake, Size, Travel};
use crate::render::{draw_frame, Assets, FrameView};
use crate::stage::Stage;
use crate::surface::{Bitmap, DrawSurface};
use crate::update::{PendingUpdate, UpdateSet};
use crate::FlightError;

// ---------------------------------------------------------------------------
// FrameOutcome
// ---------------------------------------------------------------------------

/// What a [`tick`](FlightEngine::tick) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    /// Whether the frame ran integrators and redrew the surface.
    pub redrawn: bool,
    /// Whether the host should schedule another frame.
    pub reschedule: bool,
}

impl FrameOutcome {
    const STOPPED: FrameOutcome = FrameOutcome {
        redrawn: false,
        reschedule: false,
    };
}

// ---------------------------------------------------------------------------
// RoundClock
// ---------------------------------------------------------------------------

/// Timestamps in the host's millisecond clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundClock {
    /// Timestamp of the previous frame.
    pub last_frame: Option<f64>,
    /// First frame of the takeoff. Elapsed round time is measured from here.
    pub takeoff: Option<f64>,
    pub last_multiplier_update: Option<f64>,
    pub last_shake_flip: Option<f64>,
    pub last_cloud_spawn: Option<f64>,
}

impl RoundClock {
    /// Clear everything but the frame timestamp.
    fn reset_round(&mut self) {
        *self = RoundClock {
            last_frame: self.last_frame,
            ..RoundClock::default()
        };
    }
}

/// Whether at least `interval` has passed since `since`.
fn elapsed(since: Option<f64>, now: f64, interval: f64) -> bool {
    since.is_some_and(|since| now - since >= interval)
}

// ---------------------------------------------------------------------------
// FlightEngine
// ---------------------------------------------------------------------------

/// Animation and state engine for one host session.
///
/// The engine owns its drawing surface between [`attach`](Self::attach) and
/// [`detach`](Self::detach). Every positional or drawing operation is a
/// silent no-op while no surface is attached.
pub struct FlightEngine<S: DrawSurface> {
    pub(crate) config: FlightConfig,
    pub(crate) surface: Option<S>,
    /// Set by `init`, cleared by `detach`.
    pub(crate) running: bool,
    pub(crate) canvas: Size,
    /// Size requested by the host, committed by the resize integrator.
    pub(crate) resize_to: Option<Size>,
    pub(crate) stage: Stage,
    pub(crate) plane: Point,
    pub(crate) shake: Shake,
    pub(crate) background_offset: f64,
    pub(crate) clouds: Vec<Cloud>,
    pub(crate) cloud_size: Size,
    pub(crate) multiplier: Multiplier,
    pub(crate) clock: RoundClock,
    pub(crate) pending: UpdateSet,
    /// Distance covered this frame, shared by the plane and cloud steps.
    pub(crate) travel: Travel,
    pub(crate) rng: Pcg64Mcg,
    pub(crate) frame_count: u64,
    assets: Assets<S::Image>,
    events: EventBus<FlightEvent>,
}

impl<S: DrawSurface> FlightEngine<S> {
    /// Create an idle, detached engine.
    ///
    /// # Errors
    ///
    /// Returns [`FlightError::InvalidConfig`] if the config fails
    /// [`FlightConfig::validate`].
    pub fn new(config: FlightConfig) -> Result<Self, FlightError> {
        config.validate()?;
        Ok(Self {
            surface: None,
            running: false,
            canvas: Size::default(),
            resize_to: None,
            stage: Stage::Idle,
            plane: Point::default(),
            shake: Shake::new(config.shake_distance),
            background_offset: config.background_range.0,
            clouds: Vec::new(),
            cloud_size: config.cloud_size,
            multiplier: Multiplier::ONE,
            clock: RoundClock::default(),
            pending: UpdateSet::new(),
            travel: Travel::default(),
            rng: Pcg64Mcg::seed_from_u64(config.seed),
            frame_count: 0,
            assets: Assets::default(),
            events: EventBus::new(),
            config,
        })
    }

    // -- surface binding ----------------------------------------------------

    /// Bind a drawing surface. The canvas size is taken from the surface.
    ///
    /// If a surface is already attached nothing changes and `surface` is
    /// handed back.
    pub fn attach(&mut self, surface: S) -> Option<S> {
        if self.surface.is_some() {
            return Some(surface);
        }
        self.canvas = surface.size();
        self.resize_to = None;
        tracing::debug!(
            width = self.canvas.width,
            height = self.canvas.height,
            "surface attached"
        );
        self.surface = Some(surface);
        None
    }

    /// Unbind the surface, stop the frame loop and drop every subscription.
    ///
    /// Returns the surface, if one was attached.
    pub fn detach(&mut self) -> Option<S> {
        self.running = false;
        self.events.clear();
        let surface = self.surface.take();
        if surface.is_some() {
            tracing::debug!(frames = self.frame_count, "surface detached");
        }
        surface
    }

    /// Reset the round and start the frame loop. Call once per attach.
    ///
    /// The first frame of the new loop has a zero time step, however long
    /// the engine sat idle or detached.
    pub fn init(&mut self) {
        self.clock.last_frame = None;
        self.reset();
        self.running = true;
    }

    // -- round control ------------------------------------------------------

    /// Return to [`Stage::Idle`] from any stage and re-arm the round.
    pub fn reset(&mut self) {
        if self.stage != Stage::Idle {
            tracing::debug!(from = %self.stage, "round reset");
        }
        self.stage = Stage::Idle;
        self.clock.reset_round();
        self.clouds.clear();
        self.shake = Shake::new(self.shake.distance);
        self.travel = Travel::default();
        self.set_multiplier(Multiplier::ONE);

        self.init_background();
        self.init_plane();
        self.pending.insert(PendingUpdate::InitBackground);
        self.pending.insert(PendingUpdate::InitPlane);
    }

    /// Begin the takeoff. Only valid from [`Stage::Idle`]; returns `false`
    /// and changes nothing otherwise.
    pub fn start_take_off(&mut self) -> bool {
        if self.stage != Stage::Idle {
            tracing::debug!(stage = %self.stage, "takeoff ignored, round not idle");
            return false;
        }
        self.stage = Stage::TakingOff;
        tracing::info!("takeoff");
        true
    }

    /// Notify the engine that the canvas changed size. No-op while detached.
    ///
    /// The surface is resized at once. Spatial state is rescaled on the next
    /// frame, after the other integrators ran in the old coordinates. Several
    /// resizes between two frames collapse into one.
    ///
    /// Negative or non-finite dimensions are rejected with a warning and
    /// leave both the surface and the engine untouched.
    pub fn update_canvas_size(&mut self, width: f64, height: f64) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        if !(width.is_finite() && height.is_finite() && width >= 0.0 && height >= 0.0) {
            tracing::warn!(width, height, "invalid canvas size ignored");
            return;
        }
        let new = Size { width, height };
        if !(width > 0.0 && height > 0.0) {
            tracing::warn!(width, height, "degenerate canvas size, positions are not rescaled");
        }
        surface.set_size(new);
        self.resize_to = Some(new);
        self.pending.insert(PendingUpdate::Resize);
    }

    // -- assets -------------------------------------------------------------

    pub fn load_plane_image(&mut self, image: S::Image) {
        self.assets.plane = Some(image);
        self.pending.insert(PendingUpdate::AssetLoaded);
    }

    pub fn load_background(&mut self, image: S::Image) {
        self.assets.background = Some(image);
        self.pending.insert(PendingUpdate::AssetLoaded);
    }

    /// Set the cloud bitmap. The cloud height follows the bitmap's aspect
    /// ratio at the current cloud width.
    pub fn load_cloud_image(&mut self, image: S::Image) {
        let (width, height) = image.dimensions();
        if width > 0 {
            self.cloud_size.height = (self.cloud_size.width * f64::from(height) / f64::from(width)).round();
        }
        self.assets.cloud = Some(image);
        self.pending.insert(PendingUpdate::AssetLoaded);
    }

    pub fn load_boom_image(&mut self, image: S::Image) {
        self.assets.boom = Some(image);
        self.pending.insert(PendingUpdate::AssetLoaded);
    }

    // -- events -------------------------------------------------------------

    /// Register a callback for `kind`. Subscriptions are dropped on detach.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        callback: impl FnMut(&FlightEvent) + 'static,
    ) -> SubscriptionId {
        self.events.subscribe(kind, callback)
    }

    pub fn unsubscribe(&mut self, kind: EventKind, id: SubscriptionId) -> bool {
        self.events.unsubscribe(kind, id)
    }

    // -- frame loop ---------------------------------------------------------

    /// Run one frame at host time `timestamp_ms`.
    pub fn tick(&mut self, timestamp_ms: f64) -> FrameOutcome {
        if self.surface.is_none() || !self.running {
            self.clock.last_frame = Some(timestamp_ms);
            return FrameOutcome::STOPPED;
        }

        let dt = self
            .clock
            .last_frame
            .map_or(0.0, |last| (timestamp_ms - last).max(0.0));
        self.travel = Travel::default();

        // Phase 1: decide what runs this frame.
        self.check_stages(timestamp_ms);

        // Phase 2: integrate and draw.
        let pending = self.pending;
        let redrawn = !pending.is_empty();
        if redrawn {
            for update in pending.iter() {
                self.apply(update, timestamp_ms, dt);
            }
            self.redraw();
            self.pending.clear();
        }

        // Phase 3: cleanup.
        physics::purge_low_clouds(&mut self.clouds);
        self.clock.last_frame = Some(timestamp_ms);
        self.frame_count += 1;

        FrameOutcome {
            redrawn,
            reschedule: self.surface.is_some(),
        }
    }

    fn check_stages(&mut self, now: f64) {
        match self.stage {
            Stage::Finished => {
                self.pending.insert(PendingUpdate::Finish);
                return;
            }
            Stage::Idle => {}
            Stage::TakingOff => {
                if self.clock.takeoff.is_none() {
                    self.clock.takeoff = Some(now);
                    self.clock.last_multiplier_update = Some(now);
                }
                if self.plane.y > self.config.fly_offset {
                    self.pending.insert(PendingUpdate::TakeOff);
                } else {
                    self.stage = Stage::Flying {
                        clouds_active: false,
                    };
                    self.clock.last_shake_flip = Some(now);
                    tracing::debug!(at = now, "reached flight altitude");
                    self.pending.insert(PendingUpdate::Fly);
                }
            }
            Stage::Flying { clouds_active } => {
                if !clouds_active && self.background_offset >= self.config.clouds_threshold {
                    self.stage = Stage::Flying {
                        clouds_active: true,
                    };
                    self.spawn_cloud_batch();
                    self.clock.last_cloud_spawn = Some(now);
                    tracing::debug!(at = now, "clouds active");
                }
                if elapsed(self.clock.last_shake_flip, now, self.config.shake_duration_ms) {
                    self.shake.direction = self.shake.direction.flipped();
                    self.clock.last_shake_flip = Some(now);
                }
                self.pending.insert(PendingUpdate::Fly);
            }
        }

        if self.stage.clouds_active() {
            if elapsed(self.clock.last_cloud_spawn, now, self.config.cloud_spawn_interval_ms) {
                self.spawn_cloud_batch();
                self.clock.last_cloud_spawn = Some(now);
            }
            self.pending.insert(PendingUpdate::MoveClouds);
        }

        if elapsed(self.clock.takeoff, now, self.config.boom_time_ms) {
            self.finish(now);
        }

        if elapsed(
            self.clock.last_multiplier_update,
            now,
            self.config.multiplier_interval_ms,
        ) {
            self.pending.insert(PendingUpdate::Multiplier);
        }
    }

    fn apply(&mut self, update: PendingUpdate, now: f64, dt: f64) {
        match update {
            PendingUpdate::InitBackground => self.init_background(),
            PendingUpdate::InitPlane => self.init_plane(),
            PendingUpdate::Multiplier => self.update_multiplier(now),
            PendingUpdate::TakeOff => {
                self.travel = physics::passed_space(&self.config, self.canvas, dt);
                self.plane = physics::takeoff_step(&self.config, self.canvas, self.plane, self.travel);
            }
            PendingUpdate::Fly => {
                self.travel = physics::passed_space(&self.config, self.canvas, dt);
                self.shake.step(dt, self.config.shake_duration_ms);
                self.plane = self.flying_position();
                self.background_offset = physics::parallax_step(
                    &self.config,
                    self.canvas,
                    self.background_offset,
                    self.travel,
                    self.config.background_range.1,
                );
            }
            PendingUpdate::MoveClouds => {
                physics::move_clouds(&mut self.clouds, self.travel, self.canvas.height);
            }
            PendingUpdate::Resize => self.recalculate_coords(),
            PendingUpdate::AssetLoaded | PendingUpdate::Finish => {}
        }
    }

    fn finish(&mut self, now: f64) {
        self.stage = Stage::Finished;
        self.pending.insert(PendingUpdate::Finish);
        tracing::info!(
            at = now,
            multiplier = self.multiplier.value(),
            "round finished"
        );
        self.events.fire(&FlightEvent::Finish);
    }

    fn update_multiplier(&mut self, now: f64) {
        let Some(last) = self.clock.last_multiplier_update else {
            return;
        };
        let mut next = self.multiplier;
        next.grow(
            physics::multiplier_growth(&self.config, now - last),
            self.config.multiplier_range.1,
        );
        self.set_multiplier(next);
        self.clock.last_multiplier_update = Some(now);
    }

    fn set_multiplier(&mut self, value: Multiplier) {
        self.multiplier = value;
        self.events
            .fire(&FlightEvent::MultiplierUpdate(self.multiplier.value()));
    }

    fn spawn_cloud_batch(&mut self) {
        let count = physics::cloud_batch_size(&mut self.rng, self.config.cloud_batch_max);
        let batch = physics::spawn_clouds(&mut self.rng, count, self.canvas, self.cloud_size);
        tracing::trace!(count, total = self.clouds.len() + count, "clouds spawned");
        self.clouds.extend(batch);
    }

    fn init_background(&mut self) {
        self.background_offset = self.config.background_range.0;
    }

    fn init_plane(&mut self) {
        if self.surface.is_none() {
            return;
        }
        self.plane = physics::initial_plane(&self.config, self.canvas);
    }

    fn flying_position(&self) -> Point {
        let corner = physics::flight_corner(&self.config, self.canvas);
        Point {
            x: corner.x,
            y: corner.y + self.shake.offset,
        }
    }

    fn recalculate_coords(&mut self) {
        if self.surface.is_none() {
            return;
        }
        let Some(new) = self.resize_to.take() else {
            return;
        };
        let scale = Scale::between(self.canvas, new);
        self.canvas = new;
        if !scale.is_identity() {
            tracing::debug!(x = scale.x, y = scale.y, "canvas rescaled");
        }

        self.shake.distance /= scale.y;
        self.shake.offset /= scale.y;
        self.cloud_size = scale.apply_size(self.cloud_size);
        for cloud in &mut self.clouds {
            cloud.x /= scale.x;
            cloud.y /= scale.y;
        }

        match self.stage {
            Stage::TakingOff | Stage::Finished => self.plane = scale.apply_point(self.plane),
            Stage::Flying { .. } => self.plane = self.flying_position(),
            Stage::Idle => self.init_plane(),
        }
    }

    fn redraw(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.clear();
        let view = FrameView {
            stage: self.stage,
            canvas: self.canvas,
            plane: self.plane,
            plane_size: self.config.plane_size,
            background_offset: self.background_offset,
            clouds: &self.clouds,
            cloud_size: self.cloud_size,
            multiplier: self.multiplier,
            assets: &self.assets,
        };
        draw_frame(surface, &view);
    }

    // -- accessors ----------------------------------------------------------

    /// Current multiplier. 1.0 before the first round.
    pub fn multiplier(&self) -> f64 {
        self.multiplier.value()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Whether a round is airborne.
    pub fn is_in_progress(&self) -> bool {
        self.stage.is_in_progress()
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Top-left corner of the plane sprite.
    pub fn plane_position(&self) -> Point {
        self.plane
    }

    pub fn background_offset(&self) -> f64 {
        self.background_offset
    }

    pub fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }

    pub fn cloud_size(&self) -> Size {
        self.cloud_size
    }

    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    /// Host time of the round's first takeoff frame.
    pub fn takeoff_time(&self) -> Option<f64> {
        self.clock.takeoff
    }

    pub fn clock(&self) -> &RoundClock {
        &self.clock
    }

    /// Work queued for the next frame.
    pub fn pending_updates(&self) -> UpdateSet {
        self.pending
    }

    /// Frames processed while attached and running.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{ImageHandle, RecordingSurface};

    fn engine() -> FlightEngine<RecordingSurface> {
        let mut engine = FlightEngine::new(FlightConfig::default()).unwrap();
        engine.attach(RecordingSurface::new(800.0, 600.0));
        engine.init();
        engine
    }

    #[test]
    fn new_engine_is_idle_and_detached() {
        let engine = FlightEngine::<RecordingSurface>::new(FlightConfig::default()).unwrap();
        assert_eq!(engine.stage(), Stage::Idle);
        assert_eq!(engine.multiplier(), 1.0);
        assert!(!engine.is_attached());
        assert_eq!(engine.takeoff_time(), None);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = FlightConfig {
            speed: -1.0,
            ..Default::default()
        };
        assert!(FlightEngine::<RecordingSurface>::new(config).is_err());
    }

    #[test]
    fn second_attach_hands_surface_back() {
        let mut engine = engine();
        let extra = engine.attach(RecordingSurface::new(10.0, 10.0));
        assert!(extra.is_some());
        assert_eq!(engine.canvas_size().width, 800.0);
    }

    #[test]
    fn detach_without_attach_is_safe() {
        let mut engine = FlightEngine::<RecordingSurface>::new(FlightConfig::default()).unwrap();
        assert!(engine.detach().is_none());
        engine.update_canvas_size(100.0, 100.0);
        assert_eq!(engine.canvas_size(), Size::default());
        assert_eq!(engine.tick(0.0), FrameOutcome::STOPPED);
    }

    #[test]
    fn tick_before_init_does_not_run() {
        let mut engine = FlightEngine::new(FlightConfig::default()).unwrap();
        engine.attach(RecordingSurface::new(800.0, 600.0));
        let outcome = engine.tick(0.0);
        assert!(!outcome.reschedule);
        assert_eq!(engine.frame_count(), 0);
    }

    #[test]
    fn reset_places_plane_bottom_left() {
        let engine = engine();
        assert_eq!(engine.plane_position(), Point { x: 0.0, y: 570.0 });
        assert!(engine.pending_updates().contains(PendingUpdate::InitPlane));
    }

    #[test]
    fn idle_frames_redraw_only_when_something_changed() {
        let mut engine = engine();
        assert!(engine.tick(0.0).redrawn);
        assert!(!engine.tick(16.0).redrawn);

        engine.load_plane_image(ImageHandle::new("plane", 30, 30));
        assert!(engine.tick(32.0).redrawn);
        assert_eq!(engine.surface().unwrap().images_named("plane").count(), 1);
    }

    #[test]
    fn cloud_image_sets_cloud_height_from_aspect_ratio() {
        let mut engine = engine();
        engine.load_cloud_image(ImageHandle::new("cloud", 300, 150));
        assert_eq!(engine.cloud_size().height, 30.0);
    }

    #[test]
    fn start_take_off_only_from_idle() {
        let mut engine = engine();
        assert!(engine.start_take_off());
        assert!(!engine.start_take_off());
        assert_eq!(engine.stage(), Stage::TakingOff);
    }

    #[test]
    fn first_takeoff_frame_stamps_the_clock() {
        let mut engine = engine();
        engine.tick(100.0);
        engine.start_take_off();
        engine.tick(116.0);
        assert_eq!(engine.takeoff_time(), Some(116.0));
        assert_eq!(engine.clock().last_multiplier_update, Some(116.0));
    }

    #[test]
    fn reset_clears_round_state() {
        let mut engine = engine();
        engine.start_take_off();
        let mut ts = 0.0;
        while ts < 4000.0 {
            engine.tick(ts);
            ts += 16.0;
        }
        assert!(engine.multiplier() > 1.0);

        engine.reset();
        assert_eq!(engine.stage(), Stage::Idle);
        assert_eq!(engine.multiplier(), 1.0);
        assert_eq!(engine.takeoff_time(), None);
        assert!(engine.clouds().is_empty());
        assert_eq!(engine.background_offset(), 0.2);
    }
}
