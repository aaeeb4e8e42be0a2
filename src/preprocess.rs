use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::overlay::stamp_number;

/// Device canvas width in pixels
pub const WIDTH: u32 = 32;
/// Device canvas height in pixels
pub const HEIGHT: u32 = 32;

/// A source bitmap: width, height and a row-major RGBA accessor.
pub trait PixelGrid {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// RGBA value at column `x`, row `y`
    fn pixel(&self, x: u32, y: u32) -> [u8; 4];
}

impl PixelGrid for RgbaImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.get_pixel(x, y).0
    }
}

impl PixelGrid for RgbImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let [r, g, b] = self.get_pixel(x, y).0;
        [r, g, b, 0xFF]
    }
}

/// Normalize a source bitmap to the 32x32 RGB canvas and optionally stamp
/// the overlay number in the top-left corner.
///
/// Returns `None` for an empty source; nothing can be drawn from it.
pub fn prepare<G: PixelGrid + ?Sized>(source: &G, overlay: Option<u32>) -> Option<RgbImage> {
    let (w, h) = (source.width(), source.height());
    if w == 0 || h == 0 {
        warn!("Ignoring empty {}x{} bitmap", w, h);
        return None;
    }

    let rgba = RgbaImage::from_fn(w, h, |x, y| Rgba(source.pixel(x, y)));
    let scaled = if (w, h) == (WIDTH, HEIGHT) {
        rgba
    } else {
        debug!("Scaling {}x{} bitmap to {}x{}", w, h, WIDTH, HEIGHT);
        imageops::resize(&rgba, WIDTH, HEIGHT, FilterType::Triangle)
    };

    // Alpha is dropped, not composited
    let mut canvas = RgbImage::from_fn(WIDTH, HEIGHT, |x, y| {
        let [r, g, b, _] = scaled.get_pixel(x, y).0;
        Rgb([r, g, b])
    });

    if let Some(value) = overlay {
        stamp_number(&mut canvas, value);
    }

    Some(canvas)
}
