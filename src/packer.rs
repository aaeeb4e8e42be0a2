/// Bits needed per pixel to address `palette_len` colors; never below 1
pub fn bit_width(palette_len: usize) -> u32 {
    if palette_len <= 1 {
        1
    } else {
        usize::BITS - (palette_len - 1).leading_zeros()
    }
}

/// Pack `indices` at `width` bits each, LSB-first, continuous across byte
/// boundaries. The last byte is zero-filled in its unused high bits.
pub fn pack(indices: &[u16], width: u32) -> Vec<u8> {
    debug_assert!((1..=16).contains(&width));
    let mask = (1u32 << width) - 1;
    let mut out = Vec::with_capacity(packed_len(indices.len(), width));
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for &index in indices {
        acc |= (index as u32 & mask) << bits;
        bits += width;
        while bits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push(acc as u8);
    }

    out
}

/// Inverse of [`pack`]: read `count` indices of `width` bits each
pub fn unpack(packed: &[u8], width: u32, count: usize) -> Vec<u16> {
    let mask = (1u32 << width) - 1;
    let mut out = Vec::with_capacity(count);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut bytes = packed.iter();

    while out.len() < count {
        while bits < width {
            let Some(&b) = bytes.next() else {
                return out;
            };
            acc |= (b as u32) << bits;
            bits += 8;
        }
        out.push((acc & mask) as u16);
        acc >>= width;
        bits -= width;
    }

    out
}

/// ceil(width * count / 8)
pub fn packed_len(count: usize, width: u32) -> usize {
    (count * width as usize).div_ceil(8)
}
