//! Frame loop benchmarks.
//!
//! - a full round at 60 Hz, takeoff to explosion;
//! - a single flying frame with a sky full of clouds;
//! - state hashing, which replay recording pays at every checkpoint.
//!
//! Run with: `cargo bench --bench flight_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use crashline_engine::prelude::*;

const FRAME_MS: f64 = 1000.0 / 60.0;

fn attached_engine(config: FlightConfig) -> FlightEngine<RecordingSurface> {
    let mut engine = FlightEngine::new(config).expect("bench config should validate");
    engine.attach(RecordingSurface::new(1280.0, 720.0));
    engine.load_background(ImageHandle::new("background", 1920, 1080));
    engine.load_cloud_image(ImageHandle::new("cloud", 120, 40));
    engine.init();
    engine
}

/// Engine in the Flying stage with clouds active, and the time of its last
/// frame.
fn cloudy_engine(config: FlightConfig) -> (FlightEngine<RecordingSurface>, f64) {
    let mut engine = attached_engine(config);
    engine.start_take_off();
    let mut now = 0.0;
    while !engine.stage().clouds_active() {
        engine.tick(now);
        now += FRAME_MS;
    }
    (engine, now)
}

// ---------------------------------------------------------------------------
// Benchmark 1: full round
// ---------------------------------------------------------------------------

fn bench_full_round(c: &mut Criterion) {
    c.bench_function("full_round_60hz", |b| {
        let mut engine = attached_engine(FlightConfig::default());
        b.iter(|| {
            engine.reset();
            engine.start_take_off();
            let mut now = 0.0;
            while engine.stage() != Stage::Finished {
                engine.tick(now);
                now += FRAME_MS;
            }
            black_box(engine.multiplier());
        });
    });
}

// ---------------------------------------------------------------------------
// Benchmark 2: one flying frame, by cloud density
// ---------------------------------------------------------------------------

fn bench_flying_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("flying_frame");
    for batch_max in [2u32, 10, 50] {
        let config = FlightConfig {
            cloud_batch_max: batch_max,
            cloud_spawn_interval_ms: 100.0,
            boom_time_ms: 1.0e12,
            ..FlightConfig::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(batch_max), &config, |b, config| {
            let (mut engine, mut now) = cloudy_engine(config.clone());
            b.iter(|| {
                black_box(engine.tick(now));
                now += FRAME_MS;
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark 3: state hash
// ---------------------------------------------------------------------------

fn bench_state_hash(c: &mut Criterion) {
    let (engine, _) = cloudy_engine(FlightConfig::default());
    c.bench_function("state_hash", |b| {
        b.iter(|| black_box(engine.state_hash()));
    });
}

criterion_group!(benches, bench_full_round, bench_flying_frame, bench_state_hash);
criterion_main!(benches);
