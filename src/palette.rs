use std::collections::HashMap;

use image::RgbImage;
use tracing::debug;

use crate::color::Color;

/// Largest palette the display-image command can address
pub const MAX_COLORS: usize = 256;

/// Unique colors in first-seen order; a color's position is its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// 3 bytes per color, R,G,B, in index order
    pub fn to_bytes(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| c.to_bytes()).collect()
    }
}

/// Per-pixel palette indices in row-major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedImage {
    pub width: u32,
    pub height: u32,
    pub indices: Vec<u16>,
}

impl IndexedImage {
    pub fn pixel_count(&self) -> usize {
        self.indices.len()
    }
}

/// Build the palette and index grid for a canvas.
///
/// When the exact scan finds more than [`MAX_COLORS`] colors the canvas is
/// reduced to 3-3-2 bits per channel and scanned again, which can yield at
/// most 256 colors.
pub fn quantize(canvas: &RgbImage) -> (Palette, IndexedImage) {
    let (palette, indexed) = scan(canvas, |c| c);
    if palette.len() <= MAX_COLORS {
        return (palette, indexed);
    }

    debug!(
        "{} colors exceed palette limit of {}, reducing color depth",
        palette.len(),
        MAX_COLORS
    );
    scan(canvas, Color::reduced)
}

fn scan(canvas: &RgbImage, map: impl Fn(Color) -> Color) -> (Palette, IndexedImage) {
    let (width, height) = canvas.dimensions();
    let mut lookup: HashMap<Color, u16> = HashMap::new();
    let mut colors = Vec::new();
    let mut indices = Vec::with_capacity((width * height) as usize);

    // `pixels()` walks rows top to bottom, left to right
    for px in canvas.pixels() {
        let color = map(Color::from(*px));
        let index = *lookup.entry(color).or_insert_with(|| {
            colors.push(color);
            (colors.len() - 1) as u16
        });
        indices.push(index);
    }

    (Palette { colors }, IndexedImage { width, height, indices })
}
