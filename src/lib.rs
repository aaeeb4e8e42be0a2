//! Encode bitmaps into the palette image format of Divoom Pixoo style LED
//! matrices and push them over a Bluetooth serial link.
//!
//! Pipeline: [`preprocess::prepare`] -> [`palette::quantize`] ->
//! [`packer::pack`] -> [`protocol::frame`] -> [`transport::Connection::send`].

pub mod color;
pub mod config;
pub mod display;
pub mod error;
pub mod overlay;
pub mod packer;
pub mod palette;
pub mod patterns;
pub mod playlist;
pub mod preprocess;
pub mod protocol;
pub mod transport;

pub use config::Config;
pub use display::Pixoo;
pub use error::{ConnectError, FrameError};
pub use preprocess::PixelGrid;
pub use protocol::{encode_image, Framing};
pub use transport::{Connection, Sent, Status};
