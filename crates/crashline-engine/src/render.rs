//! Back-to-front draw pass.
//!
//! The engine hands [`draw_frame`] a read-only [`FrameView`] of its state and
//! the surface to draw into. Draw order:
//!
//! 1. background bitmap, or a flat sky/ground fill when none is loaded;
//! 2. while the plane is airborne: the flight path curve and the multiplier;
//! 3. while clouds are active: every cloud not yet marked low;
//! 4. the explosion sprite once finished, the plane sprite otherwise.
//!
//! A sprite whose bitmap is not loaded is skipped.

use crate::physics::{Cloud, Multiplier, Point, Size};
use crate::stage::Stage;
use crate::surface::{Color, DrawSurface, QuadraticCurve, Rect};

const FLIGHT_PATH_WIDTH: f64 = 4.0;
const MULTIPLIER_FONT_PX: f64 = 24.0;
const MULTIPLIER_AT: Point = Point { x: 10.0, y: 50.0 };
/// Fraction of the canvas covered by sky in the fallback background.
const SKY_FRACTION: f64 = 2.0 / 3.0;

/// Bitmaps the engine draws with. Each slot is independent.
#[derive(Debug, Clone)]
pub struct Assets<I> {
    pub plane: Option<I>,
    pub background: Option<I>,
    pub cloud: Option<I>,
    pub boom: Option<I>,
}

impl<I> Default for Assets<I> {
    fn default() -> Self {
        Self {
            plane: None,
            background: None,
            cloud: None,
            boom: None,
        }
    }
}

/// Everything the draw pass reads.
pub struct FrameView<'a, I> {
    pub stage: Stage,
    pub canvas: Size,
    pub plane: Point,
    pub plane_size: f64,
    pub background_offset: f64,
    pub clouds: &'a [Cloud],
    pub cloud_size: Size,
    pub multiplier: Multiplier,
    pub assets: &'a Assets<I>,
}

/// Draw one frame. The caller clears the surface first.
pub fn draw_frame<S: DrawSurface>(surface: &mut S, view: &FrameView<'_, S::Image>) {
    draw_background(surface, view);

    if view.stage.is_in_progress() {
        surface.stroke_curve(flight_path(view), Color::FLIGHT_PATH, FLIGHT_PATH_WIDTH);
        surface.fill_text(
            &view.multiplier.label(),
            MULTIPLIER_AT,
            MULTIPLIER_FONT_PX,
            Color::FLIGHT_PATH,
        );
    }

    if view.stage.clouds_active() {
        if let Some(image) = &view.assets.cloud {
            for cloud in view.clouds.iter().filter(|c| !c.is_low()) {
                surface.draw_image(image, Rect::new(Point { x: cloud.x, y: cloud.y }, view.cloud_size));
            }
        }
    }

    let sprite = if view.stage == Stage::Finished {
        &view.assets.boom
    } else {
        &view.assets.plane
    };
    if let Some(image) = sprite {
        let size = Size {
            width: view.plane_size,
            height: view.plane_size,
        };
        surface.draw_image(image, Rect::new(view.plane, size));
    }
}

fn draw_background<S: DrawSurface>(surface: &mut S, view: &FrameView<'_, S::Image>) {
    let Size { width, height } = view.canvas;

    match &view.assets.background {
        // The bitmap is stretched to `1 / offset` canvas heights and
        // bottom-aligned, so a growing offset pans it downward.
        Some(image) if view.background_offset > 0.0 => {
            let drawn_height = height / view.background_offset;
            surface.draw_image(
                image,
                Rect {
                    x: 0.0,
                    y: height - drawn_height,
                    width,
                    height: drawn_height,
                },
            );
        }
        _ => {
            let sky = height * SKY_FRACTION;
            surface.fill_rect(
                Rect {
                    x: 0.0,
                    y: 0.0,
                    width,
                    height: sky,
                },
                Color::SKY,
            );
            surface.fill_rect(
                Rect {
                    x: 0.0,
                    y: sky,
                    width,
                    height: height - sky,
                },
                Color::GROUND,
            );
        }
    }
}

/// Curve from the bottom-left corner to the centre of the plane.
fn flight_path<I>(view: &FrameView<'_, I>) -> QuadraticCurve {
    let start = Point {
        x: 0.0,
        y: view.canvas.height,
    };
    let half = (view.plane_size / 2.0).floor();
    let end = Point {
        x: view.plane.x + half,
        y: view.plane.y + half,
    };
    QuadraticCurve {
        start,
        control: Point {
            x: (end.x - start.x) * 0.5,
            y: view.canvas.height - 10.0,
        },
        end,
    }
}
