mod display_image;
mod frame;

pub use display_image::{encode_image, image_payload, sub_header, CMD_DISPLAY_IMAGE, SUB_HEADER_LEN};
pub use frame::{checksum, escape, frame, inner_buffer, unescape, Framing, END, ESCAPE, START};
