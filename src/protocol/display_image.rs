use image::RgbImage;
use tracing::debug;

use crate::error::FrameError;
use crate::packer::{bit_width, pack};
use crate::palette::{quantize, Palette};
use crate::preprocess::{prepare, PixelGrid};
use crate::protocol::frame::{frame, Framing};

/// Display-image command
pub const CMD_DISPLAY_IMAGE: u8 = 0x44;

/// Fixed sub-header length that precedes palette and pixel data
pub const SUB_HEADER_LEN: usize = 12;

/// Build the 12-byte sub-header for an image with `color_count` palette
/// entries and `packed_len` bytes of pixel data.
pub fn sub_header(color_count: usize, packed_len: usize) -> Result<[u8; SUB_HEADER_LEN], FrameError> {
    // Counts the last 7 header bytes plus pixel data
    let len = 8 + packed_len;
    let [len_lo, len_hi] = u16::try_from(len)
        .map_err(|_| FrameError::FieldOverflow { field: "image length", value: len })?
        .to_le_bytes();
    let [count_lo, count_hi] = u16::try_from(color_count)
        .map_err(|_| FrameError::FieldOverflow { field: "color count", value: color_count })?
        .to_le_bytes();

    Ok([
        0x00, 0x0A, 0x0A, 0x04, 0xAA, len_lo, len_hi, 0x00, 0x00, 0x03, count_lo, count_hi,
    ])
}

/// Payload of the display-image command: sub-header, palette, packed pixels
pub fn image_payload(canvas: &RgbImage) -> Result<Vec<u8>, FrameError> {
    let (palette, indexed) = quantize(canvas);
    let width = bit_width(palette.len());
    let pixels = pack(&indexed.indices, width);

    debug!(
        "Encoded {} pixels: {} colors, {} bits/pixel, {} bytes packed",
        indexed.pixel_count(),
        palette.len(),
        width,
        pixels.len()
    );

    assemble(&palette, &pixels)
}

fn assemble(palette: &Palette, pixels: &[u8]) -> Result<Vec<u8>, FrameError> {
    let header = sub_header(palette.len(), pixels.len())?;
    let mut payload = Vec::with_capacity(SUB_HEADER_LEN + palette.len() * 3 + pixels.len());
    payload.extend_from_slice(&header);
    payload.extend_from_slice(&palette.to_bytes());
    payload.extend_from_slice(pixels);
    Ok(payload)
}

/// Run the whole pipeline: normalize, quantize, pack and frame.
///
/// Returns `Ok(None)` when the bitmap has no pixels to draw.
pub fn encode_image<G: PixelGrid + ?Sized>(
    bitmap: &G,
    overlay: Option<u32>,
    framing: Framing,
) -> Result<Option<Vec<u8>>, FrameError> {
    let Some(canvas) = prepare(bitmap, overlay) else {
        return Ok(None);
    };
    let payload = image_payload(&canvas)?;
    frame(CMD_DISPLAY_IMAGE, &payload, framing).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packer::unpack;
    use crate::protocol::frame::unescape;
    use image::{Rgb, Rgba, RgbaImage};

    #[test]
    fn test_sub_header_layout() {
        let header = sub_header(256, 1024).unwrap();
        // 8 + 1024 = 0x0408
        assert_eq!(
            header,
            [0x00, 0x0A, 0x0A, 0x04, 0xAA, 0x08, 0x04, 0x00, 0x00, 0x03, 0x00, 0x01]
        );
    }

    #[test]
    fn test_sub_header_rejects_oversized_fields() {
        // 8 + 65527 is the largest length that fits
        assert!(sub_header(1, 65527).is_ok());
        assert!(matches!(
            sub_header(1, 65528),
            Err(FrameError::FieldOverflow { field: "image length", value: 65536 })
        ));
        assert!(matches!(
            sub_header(65536, 0),
            Err(FrameError::FieldOverflow { field: "color count", value: 65536 })
        ));
    }

    #[test]
    fn test_uniform_canvas_payload() {
        let canvas = RgbImage::from_pixel(32, 32, Rgb([0x11, 0x22, 0x33]));
        let payload = image_payload(&canvas).unwrap();
        assert_eq!(payload.len(), SUB_HEADER_LEN + 3 + 128);
        // len = 8 + 128
        assert_eq!(&payload[5..7], &[136, 0x00]);
        // colorCount = 1
        assert_eq!(&payload[10..12], &[0x01, 0x00]);
        assert_eq!(&payload[12..15], &[0x11, 0x22, 0x33]);
        assert!(payload[15..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_two_color_payload_bits() {
        let mut canvas = RgbImage::from_pixel(32, 32, Rgb([255, 0, 0]));
        canvas.put_pixel(1, 0, Rgb([0, 255, 0]));
        let payload = image_payload(&canvas).unwrap();
        let palette = &payload[12..18];
        assert_eq!(palette, &[255, 0, 0, 0, 255, 0]);
        // Second pixel is index 1 at bit 1 of the first data byte
        assert_eq!(payload[18], 0x02);
        assert_eq!(payload.len(), 18 + 128);
    }

    #[test]
    fn test_payload_decodes_back_to_canvas() {
        let canvas = RgbImage::from_fn(32, 32, |x, y| Rgb([(x * 8) as u8, (y * 8) as u8, 0]));
        let payload = image_payload(&canvas).unwrap();
        let count = u16::from_le_bytes([payload[10], payload[11]]) as usize;
        let palette_end = SUB_HEADER_LEN + count * 3;
        let colors: Vec<[u8; 3]> = payload[SUB_HEADER_LEN..palette_end]
            .chunks(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        let width = bit_width(count);
        let indices = unpack(&payload[palette_end..], width, 1024);

        // 1024 distinct gradient colors go through depth reduction
        assert!(count <= 256);
        for (i, &index) in indices.iter().enumerate() {
            let (x, y) = ((i % 32) as u32, (i / 32) as u32);
            let px = canvas.get_pixel(x, y).0;
            let expected = [px[0] & 0xE0, px[1] & 0xE0, px[2] & 0xC0];
            assert_eq!(colors[index as usize], expected);
        }
    }

    #[test]
    fn test_encode_image_frame() {
        let bitmap = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 255, 255]));
        let out = encode_image(&bitmap, None, Framing::Escaped).unwrap().unwrap();
        let inner = unescape(&out[1..out.len() - 1]).unwrap();
        // len(2) cmd(1) payload(12 + 3 + 128) sum(2)
        assert_eq!(inner.len(), 2 + 1 + 143 + 2);
        assert_eq!(u16::from_le_bytes([inner[0], inner[1]]), 1 + 143 + 2);
        assert_eq!(inner[2], CMD_DISPLAY_IMAGE);
    }

    #[test]
    fn test_encode_empty_bitmap_is_none() {
        let bitmap = RgbaImage::new(0, 0);
        assert!(encode_image(&bitmap, Some(1), Framing::Raw).unwrap().is_none());
    }
}
