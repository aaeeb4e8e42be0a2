//! Built-in test images for checking a display without any image files.

use image::{Rgba, RgbaImage};

use crate::preprocess::{HEIGHT, WIDTH};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const GREEN: Rgba<u8> = Rgba([0, 255, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Pattern {
    /// Red rises left to right, green top to bottom
    Gradient,
    /// 4x4 blue and white checkerboard
    Squares,
    Red,
    Blue,
    /// Red with the first pixel green
    PixelTest,
    /// Red with the second pixel green
    PixelTest2,
}

impl Pattern {
    pub fn render(self) -> RgbaImage {
        match self {
            Pattern::Gradient => gradient(),
            Pattern::Squares => squares(),
            Pattern::Red => RgbaImage::from_pixel(WIDTH, HEIGHT, RED),
            Pattern::Blue => RgbaImage::from_pixel(WIDTH, HEIGHT, BLUE),
            Pattern::PixelTest => marked(0),
            Pattern::PixelTest2 => marked(1),
        }
    }
}

fn gradient() -> RgbaImage {
    RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| Rgba([(x * 8) as u8, (y * 8) as u8, 0, 255]))
}

fn squares() -> RgbaImage {
    let square = WIDTH / 4;
    RgbaImage::from_fn(WIDTH, HEIGHT, |x, y| {
        if (x / square + y / square) % 2 == 0 {
            BLUE
        } else {
            WHITE
        }
    })
}

fn marked(x: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(WIDTH, HEIGHT, RED);
    img.put_pixel(x, 0, GREEN);
    img
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::quantize;
    use crate::preprocess::prepare;

    #[test]
    fn test_squares_has_two_colors() {
        let canvas = prepare(&Pattern::Squares.render(), None).unwrap();
        let (palette, indexed) = quantize(&canvas);
        assert_eq!(palette.len(), 2);
        // Top-left square is blue, next square along is white
        assert_eq!(indexed.indices[0], 0);
        assert_eq!(indexed.indices[8], 1);
    }

    #[test]
    fn test_gradient_corners() {
        let img = Pattern::Gradient.render();
        assert_eq!(img.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(img.get_pixel(31, 31).0, [248, 248, 0, 255]);
    }

    #[test]
    fn test_pixel_tests_mark_one_pixel() {
        for (pattern, x) in [(Pattern::PixelTest, 0), (Pattern::PixelTest2, 1)] {
            let img = pattern.render();
            let green: Vec<_> = img
                .enumerate_pixels()
                .filter(|(_, _, p)| **p == GREEN)
                .map(|(px, py, _)| (px, py))
                .collect();
            assert_eq!(green, vec![(x, 0)]);
        }
    }
}
