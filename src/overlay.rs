use image::{Rgb, RgbImage};

const GLYPH_WIDTH: u32 = 3;
const GLYPH_HEIGHT: u32 = 5;
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

// 3x5 digits, one row per byte, bit 2 is the leftmost column
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111], // 0
    [0b010, 0b110, 0b010, 0b010, 0b111], // 1
    [0b111, 0b001, 0b111, 0b100, 0b111], // 2
    [0b111, 0b001, 0b111, 0b001, 0b111], // 3
    [0b101, 0b101, 0b111, 0b001, 0b001], // 4
    [0b111, 0b100, 0b111, 0b001, 0b111], // 5
    [0b111, 0b100, 0b111, 0b101, 0b111], // 6
    [0b111, 0b001, 0b010, 0b010, 0b010], // 7
    [0b111, 0b101, 0b111, 0b101, 0b111], // 8
    [0b111, 0b101, 0b111, 0b001, 0b111], // 9
];

/// Draw `value` in black starting at the top-left corner.
/// Only set glyph pixels are written; digits past the right edge are clipped.
pub fn stamp_number(canvas: &mut RgbImage, value: u32) {
    let (width, height) = canvas.dimensions();
    let black = Rgb([0, 0, 0]);

    for (pos, ch) in value.to_string().bytes().enumerate() {
        let glyph = &DIGITS[(ch - b'0') as usize];
        let origin_x = pos as u32 * GLYPH_ADVANCE;

        for (row, &bits) in glyph.iter().enumerate() {
            let y = row as u32;
            if y >= height {
                break;
            }
            for col in 0..GLYPH_WIDTH {
                let x = origin_x + col;
                if x < width && bits & (0b100u8 >> col) != 0 {
                    canvas.put_pixel(x, y, black);
                }
            }
        }
    }
}
