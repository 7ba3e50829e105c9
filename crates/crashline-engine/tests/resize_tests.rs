//! Integration tests for canvas resizes: proportional rescaling, resize
//! round-trips, and degenerate sizes.

use crashline_engine::prelude::*;

fn flying_engine(until: f64) -> (FlightEngine<RecordingSurface>, f64) {
    let mut engine = FlightEngine::new(FlightConfig::default()).unwrap();
    engine.attach(RecordingSurface::new(800.0, 600.0));
    engine.load_cloud_image(ImageHandle::new("cloud", 60, 20));
    engine.init();
    engine.start_take_off();
    let mut ts = 0.0;
    let mut last = 0.0;
    while ts <= until {
        engine.tick(ts);
        last = ts;
        ts += 16.0;
    }
    (engine, last)
}

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9 * b.abs().max(1.0), "{a} != {b}");
}

fn assert_point_close(a: Point, b: Point) {
    assert_close(a.x, b.x);
    assert_close(a.y, b.y);
}

// ---------------------------------------------------------------------------
// Round trips
// ---------------------------------------------------------------------------

#[test]
fn takeoff_resize_round_trip_restores_plane() {
    let (mut engine, ts) = flying_engine(1000.0);
    assert_eq!(engine.stage(), Stage::TakingOff);
    let before = engine.plane_position();

    engine.update_canvas_size(400.0, 300.0);
    engine.tick(ts);
    let halved = engine.plane_position();
    assert_close(halved.x, before.x / 2.0);
    assert_close(halved.y, before.y / 2.0);

    engine.update_canvas_size(800.0, 600.0);
    engine.tick(ts);
    assert_point_close(engine.plane_position(), before);
}

#[test]
fn flying_resize_round_trip_restores_plane_and_clouds() {
    let (mut engine, ts) = flying_engine(6000.0);
    assert!(engine.stage().clouds_active());
    assert!(!engine.clouds().is_empty());

    let plane = engine.plane_position();
    let clouds: Vec<Cloud> = engine.clouds().to_vec();
    let cloud_size = engine.cloud_size();

    engine.update_canvas_size(1000.0, 450.0);
    engine.tick(ts);
    let pinned = engine.plane_position();
    assert_close(pinned.x, 1000.0 - 30.0 - 30.0);
    assert_eq!(engine.clouds().len(), clouds.len());

    engine.update_canvas_size(800.0, 600.0);
    engine.tick(ts);

    assert_point_close(engine.plane_position(), plane);
    assert_eq!(engine.clouds().len(), clouds.len());
    for (after, before) in engine.clouds().iter().zip(&clouds) {
        assert_close(after.x, before.x);
        assert_close(after.y, before.y);
    }
    assert_close(engine.cloud_size().width, cloud_size.width);
    assert_close(engine.cloud_size().height, cloud_size.height);
}

#[test]
fn back_to_back_resizes_compose() {
    let (mut engine, ts) = flying_engine(1000.0);
    let before = engine.plane_position();

    engine.update_canvas_size(1600.0, 900.0);
    engine.update_canvas_size(400.0, 300.0);
    engine.tick(ts);

    let after = engine.plane_position();
    assert_close(after.x, before.x / 2.0);
    assert_close(after.y, before.y / 2.0);
}

#[test]
fn flying_resize_scales_shake_with_height() {
    let (mut engine, ts) = flying_engine(4000.0);
    assert!(matches!(engine.stage(), Stage::Flying { .. }));
    let offset = engine.plane_position().y - 30.0;

    engine.update_canvas_size(800.0, 1200.0);
    engine.tick(ts);
    assert_close(engine.plane_position().y - 30.0, offset * 2.0);
}

// ---------------------------------------------------------------------------
// Idle and finished
// ---------------------------------------------------------------------------

#[test]
fn idle_resize_keeps_plane_at_bottom_left() {
    let mut engine = FlightEngine::new(FlightConfig::default()).unwrap();
    engine.attach(RecordingSurface::new(800.0, 600.0));
    engine.init();
    engine.tick(0.0);

    engine.update_canvas_size(1024.0, 768.0);
    engine.tick(16.0);
    assert_eq!(engine.plane_position(), Point { x: 0.0, y: 738.0 });
    assert_eq!(engine.surface().unwrap().size().height, 768.0);
}

#[test]
fn finished_resize_keeps_explosion_in_place() {
    let (mut engine, ts) = flying_engine(10_100.0);
    assert_eq!(engine.stage(), Stage::Finished);
    let before = engine.plane_position();

    engine.update_canvas_size(1600.0, 1200.0);
    engine.tick(ts);
    assert_point_close(engine.plane_position(), Point { x: before.x * 2.0, y: before.y * 2.0 });
}

// ---------------------------------------------------------------------------
// Degenerate input
// ---------------------------------------------------------------------------

#[test]
fn resize_before_attach_is_ignored() {
    let mut engine = FlightEngine::<RecordingSurface>::new(FlightConfig::default()).unwrap();
    engine.update_canvas_size(640.0, 480.0);
    assert_eq!(engine.canvas_size(), Size::default());
    assert!(engine.pending_updates().is_empty());
}

#[test]
fn zero_size_never_produces_non_finite_positions() {
    let (mut engine, mut ts) = flying_engine(6000.0);

    for (width, height) in [(0.0, 0.0), (800.0, 0.0), (0.0, 600.0), (800.0, 600.0)] {
        engine.update_canvas_size(width, height);
        ts += 16.0;
        engine.tick(ts);

        let plane = engine.plane_position();
        assert!(plane.x.is_finite() && plane.y.is_finite(), "plane {plane:?} at {width}x{height}");
        assert!(engine.background_offset().is_finite());
        for cloud in engine.clouds() {
            assert!(cloud.x.is_finite() && cloud.y.is_finite());
        }
        assert!(engine.cloud_size().width.is_finite());
    }
}

#[test]
fn non_finite_and_negative_sizes_are_rejected() {
    let (mut engine, ts) = flying_engine(1000.0);
    assert_eq!(engine.stage(), Stage::TakingOff);
    let before = engine.plane_position();
    let canvas = engine.canvas_size();

    for (width, height) in [
        (f64::INFINITY, 600.0),
        (f64::NAN, 600.0),
        (800.0, f64::NEG_INFINITY),
        (-10.0, 600.0),
    ] {
        engine.update_canvas_size(width, height);
        assert!(!engine.pending_updates().contains(PendingUpdate::Resize));
        assert_eq!(engine.surface().unwrap().size(), canvas);

        engine.tick(ts);
        assert_eq!(engine.canvas_size(), canvas);
        assert_point_close(engine.plane_position(), before);
    }

    engine.update_canvas_size(800.0, 600.0);
    engine.tick(ts + 16.0);
    let plane = engine.plane_position();
    assert!(plane.x.is_finite() && plane.y.is_finite(), "plane {plane:?}");
}

#[test]
fn attach_from_zero_sized_surface_then_resize() {
    let mut engine = FlightEngine::new(FlightConfig::default()).unwrap();
    engine.attach(RecordingSurface::new(0.0, 0.0));
    engine.init();
    engine.update_canvas_size(800.0, 600.0);
    engine.tick(0.0);

    assert_eq!(engine.plane_position(), Point { x: 0.0, y: 570.0 });
    assert_eq!(engine.cloud_size(), FlightConfig::default().cloud_size);
}
