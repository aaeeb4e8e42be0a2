use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Marks the start of a frame on the wire
pub const START: u8 = 0x01;
/// Marks the end of a frame on the wire
pub const END: u8 = 0x02;
/// Escape prefix used when byte-stuffing is on
pub const ESCAPE: u8 = 0x03;

/// How the inner buffer is put on the wire.
///
/// Older firmware expects `0x01`, `0x02` and `0x03` inside a frame to be
/// escaped as `0x03 0x04`, `0x03 0x05` and `0x03 0x06`. Newer firmware takes
/// the inner buffer verbatim. There is no default; pick one per device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    Escaped,
    Raw,
}

/// Build `[len LE][cmd][payload][sum LE]`, where `len` counts the command,
/// the payload and the checksum, and `sum` is the 16-bit sum of everything
/// before it.
pub fn inner_buffer(cmd: u8, payload: &[u8]) -> Result<Vec<u8>, FrameError> {
    let inner_len = 1 + payload.len() + 2;
    let len = u16::try_from(inner_len).map_err(|_| FrameError::PayloadTooLarge(payload.len()))?;

    let mut buf = Vec::with_capacity(inner_len + 2);
    buf.extend_from_slice(&len.to_le_bytes());
    buf.push(cmd);
    buf.extend_from_slice(payload);

    let sum = checksum(&buf);
    buf.extend_from_slice(&sum.to_le_bytes());

    Ok(buf)
}

/// Sum of all bytes modulo 65536
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u16, |acc, &b| acc.wrapping_add(b as u16))
}

/// Wrap a command and payload into a delimited frame
pub fn frame(cmd: u8, payload: &[u8], framing: Framing) -> Result<Vec<u8>, FrameError> {
    let inner = inner_buffer(cmd, payload)?;

    let mut out = Vec::with_capacity(inner.len() + 2);
    out.push(START);
    match framing {
        Framing::Escaped => escape_into(&inner, &mut out),
        Framing::Raw => out.extend_from_slice(&inner),
    }
    out.push(END);

    Ok(out)
}

fn escape_into(bytes: &[u8], out: &mut Vec<u8>) {
    for &b in bytes {
        match b {
            0x01..=0x03 => {
                out.push(ESCAPE);
                out.push(b + 0x03);
            }
            _ => out.push(b),
        }
    }
}

/// Byte-stuff a buffer (delimiters excluded)
pub fn escape(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    escape_into(bytes, &mut out);
    out
}

/// Undo [`escape`]. Returns `None` on a dangling or unknown escape sequence.
pub fn unescape(bytes: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter();

    while let Some(&b) = iter.next() {
        if b == ESCAPE {
            match iter.next() {
                Some(&code @ 0x04..=0x06) => out.push(code - 0x03),
                _ => return None,
            }
        } else {
            out.push(b);
        }
    }

    Some(out)
}
