//! The drawing surface the engine renders into.
//!
//! The engine never touches pixels directly. Everything it draws goes through
//! the [`DrawSurface`] trait: a handful of primitive fill/stroke/image/text
//! calls plus the surface's pixel dimensions. Hosts implement it for whatever
//! backs their canvas.
//!
//! [`RecordingSurface`] is an in-memory implementation that records the calls
//! of the current frame as [`DrawCall`]s. Headless hosts and tests use it to
//! inspect exactly what a frame drew.

use serde::{Deserialize, Serialize};

use crate::physics::{Point, Size};

// ---------------------------------------------------------------------------
// Geometry and colour
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle in canvas pixels (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Rectangle at `origin` with `size`.
    pub fn new(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }
}

/// Quadratic Bezier curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadraticCurve {
    pub start: Point,
    pub control: Point,
    pub end: Point,
}

/// RGBA colour, `0xRRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const SKY: Color = Color(0x0000_FFFF);
    pub const GROUND: Color = Color(0x0080_00FF);
    pub const FLIGHT_PATH: Color = Color(0xFF00_00FF);
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A loaded bitmap handed to the engine by the host's asset loader.
pub trait Bitmap: Clone {
    /// Pixel width and height.
    fn dimensions(&self) -> (u32, u32);
}

/// A 2D surface the engine draws one frame at a time into.
///
/// Coordinates are canvas pixels with the origin at the top-left.
pub trait DrawSurface {
    /// The surface's bitmap handle type.
    type Image: Bitmap;

    /// Current width and height in pixels.
    fn size(&self) -> Size;

    /// Change the pixel dimensions of the surface.
    fn set_size(&mut self, size: Size);

    /// Erase the whole surface.
    fn clear(&mut self);

    /// Fill a rectangle with a flat colour.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draw `image` stretched to `dest`.
    fn draw_image(&mut self, image: &Self::Image, dest: Rect);

    /// Stroke a quadratic curve.
    fn stroke_curve(&mut self, curve: QuadraticCurve, color: Color, line_width: f64);

    /// Draw a line of text with its baseline starting at `at`.
    fn fill_text(&mut self, text: &str, at: Point, font_px: f64, color: Color);
}

// ---------------------------------------------------------------------------
// RecordingSurface
// ---------------------------------------------------------------------------

/// Bitmap handle used with [`RecordingSurface`]. Carries a name and the pixel
/// dimensions of the asset it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHandle {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl ImageHandle {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

impl Bitmap for ImageHandle {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCall {
    FillRect { rect: Rect, color: Color },
    Image { name: String, dest: Rect },
    Curve { curve: QuadraticCurve, color: Color, line_width: f64 },
    Text { text: String, at: Point, font_px: f64, color: Color },
}

/// A [`DrawSurface`] that records the calls made since the last
/// [`clear`](DrawSurface::clear).
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    size: Size,
    calls: Vec<DrawCall>,
    clears: u64,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size { width, height },
            calls: Vec::new(),
            clears: 0,
        }
    }

    /// Calls recorded since the last clear, i.e. the most recent frame.
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// How many times the surface was cleared. Each redrawn frame clears
    /// once.
    pub fn clear_count(&self) -> u64 {
        self.clears
    }

    /// Destination rectangles of every image drawn under `name` this frame.
    pub fn images_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = Rect> + 'a {
        self.calls.iter().filter_map(move |call| match call {
            DrawCall::Image { name: n, dest } if n == name => Some(*dest),
            _ => None,
        })
    }

    /// Text drawn this frame, in draw order.
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DrawCall::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl DrawSurface for RecordingSurface {
    type Image = ImageHandle;

    fn size(&self) -> Size {
        self.size
    }

    fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    fn clear(&mut self) {
        self.calls.clear();
        self.clears += 1;
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.calls.push(DrawCall::FillRect { rect, color });
    }

    fn draw_image(&mut self, image: &ImageHandle, dest: Rect) {
        self.calls.push(DrawCall::Image {
            name: image.name.clone(),
            dest,
        });
    }

    fn stroke_curve(&mut self, curve: QuadraticCurve, color: Color, line_width: f64) {
        self.calls.push(DrawCall::Curve {
            curve,
            color,
            line_width,
        });
    }

    fn fill_text(&mut self, text: &str, at: Point, font_px: f64, color: Color) {
        self.calls.push(DrawCall::Text {
            text: text.to_owned(),
            at,
            font_px,
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_drops_the_previous_frame() {
        let mut surface = RecordingSurface::new(100.0, 50.0);
        surface.fill_text("x1.00", Point { x: 0.0, y: 0.0 }, 24.0, Color::FLIGHT_PATH);
        assert_eq!(surface.calls().len(), 1);

        surface.clear();
        assert!(surface.calls().is_empty());
        assert_eq!(surface.clear_count(), 1);
    }

    #[test]
    fn images_are_filtered_by_name() {
        let mut surface = RecordingSurface::new(100.0, 50.0);
        let plane = ImageHandle::new("plane", 30, 30);
        let cloud = ImageHandle::new("cloud", 60, 20);
        let dest = Rect {
            x: 1.0,
            y: 2.0,
            width: 3.0,
            height: 4.0,
        };
        surface.draw_image(&plane, dest);
        surface.draw_image(&cloud, dest);
        surface.draw_image(&cloud, dest);

        assert_eq!(surface.images_named("plane").count(), 1);
        assert_eq!(surface.images_named("cloud").count(), 2);
        assert_eq!(surface.images_named("boom").count(), 0);
    }
}
