/// 24-bit RGB color. Any alpha channel is dropped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b }
    }

    /// Reduce to 3-3-2 bits (top 3 of red, top 3 of green, top 2 of blue).
    /// At most 256 distinct results exist; applying it twice changes nothing.
    pub fn reduced(self) -> Self {
        Color {
            r: self.r & 0xE0,
            g: self.g & 0xE0,
            b: self.b & 0xC0,
        }
    }

    /// Wire order is R, G, B
    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<image::Rgb<u8>> for Color {
    fn from(px: image::Rgb<u8>) -> Self {
        Color::rgb(px[0], px[1], px[2])
    }
}

impl From<image::Rgba<u8>> for Color {
    fn from(px: image::Rgba<u8>) -> Self {
        Color::rgb(px[0], px[1], px[2])
    }
}

impl From<Color> for image::Rgb<u8> {
    fn from(c: Color) -> Self {
        image::Rgb([c.r, c.g, c.b])
    }
}
