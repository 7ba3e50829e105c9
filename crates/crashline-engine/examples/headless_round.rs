//! Headless crash rounds with a betting host.
//!
//! Plays a few rounds against a [`RecordingSurface`] on a simulated 60 Hz
//! clock. The host stakes a bet before each takeoff and cashes out
//! automatically once the multiplier reaches the round's target. A bet still
//! open when the plane explodes is lost.
//!
//! Run with:
//!   cargo run --example headless_round -p crashline-engine -- 1.5 4 12
//!
//! Each argument is the cash-out target of one round. Set `RUST_LOG=debug`
//! to see stage transitions.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Context;
use crashline_engine::prelude::*;

const BET: f64 = 1.0;
const STARTING_BALANCE: f64 = 100.0;
const FRAME_MS: f64 = 1000.0 / 60.0;

// ---------------------------------------------------------------------------
// Host state
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Wallet {
    balance: f64,
    /// Open stake and its cash-out target.
    bet: Option<(f64, f64)>,
    round_over: bool,
}

impl Wallet {
    fn place_bet(&mut self, target: f64) -> bool {
        if self.bet.is_some() || self.balance - BET < 0.0 {
            return false;
        }
        self.balance -= BET;
        self.bet = Some((BET, target));
        true
    }

    fn on_multiplier(&mut self, multiplier: f64) {
        if let Some((stake, target)) = self.bet {
            if multiplier >= target {
                self.balance += stake * multiplier;
                self.bet = None;
                tracing::info!(multiplier, balance = self.balance, "cashed out");
            }
        }
    }

    fn on_finish(&mut self) {
        if let Some((stake, _)) = self.bet.take() {
            tracing::info!(stake, "bet lost");
        }
        self.round_over = true;
    }
}

fn parse_targets() -> anyhow::Result<Vec<f64>> {
    let targets = std::env::args()
        .skip(1)
        .map(|arg| {
            arg.parse::<f64>()
                .with_context(|| format!("invalid cash-out target {arg:?}"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if targets.is_empty() {
        Ok(vec![1.5, 4.0, 12.0])
    } else {
        Ok(targets)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let targets = parse_targets()?;

    let mut engine = FlightEngine::new(FlightConfig::default())?;
    engine.attach(RecordingSurface::new(800.0, 600.0));
    engine.load_plane_image(ImageHandle::new("plane", 30, 30));
    engine.load_background(ImageHandle::new("background", 1920, 1080));
    engine.load_cloud_image(ImageHandle::new("cloud", 120, 40));
    engine.load_boom_image(ImageHandle::new("boom", 30, 30));
    engine.init();

    let wallet = Rc::new(RefCell::new(Wallet {
        balance: STARTING_BALANCE,
        bet: None,
        round_over: false,
    }));
    let on_update = Rc::clone(&wallet);
    engine.subscribe(EventKind::MultiplierUpdate, move |event| {
        if let FlightEvent::MultiplierUpdate(value) = event {
            on_update.borrow_mut().on_multiplier(*value);
        }
    });
    let on_finish = Rc::clone(&wallet);
    engine.subscribe(EventKind::Finish, move |_| on_finish.borrow_mut().on_finish());

    let mut now = 0.0;
    for (round, target) in targets.into_iter().enumerate() {
        engine.reset();
        if !wallet.borrow_mut().place_bet(target) {
            println!("round {}: balance too low to bet", round + 1);
            break;
        }
        wallet.borrow_mut().round_over = false;
        engine.start_take_off();

        while !wallet.borrow().round_over {
            if !engine.tick(now).reschedule {
                anyhow::bail!("frame loop stopped mid-round");
            }
            now += FRAME_MS;
        }

        let surface = engine.surface().context("surface detached")?;
        println!(
            "round {}: target x{target:.2}, crashed at x{:.2}, balance {:.2} ({} frames drawn, {} clouds in the air)",
            round + 1,
            engine.multiplier(),
            wallet.borrow().balance,
            surface.clear_count(),
            engine.clouds().len(),
        );
    }

    let surface = engine.detach().context("surface detached")?;
    println!(
        "final balance {:.2} after {} frames",
        wallet.borrow().balance,
        surface.clear_count()
    );
    Ok(())
}
