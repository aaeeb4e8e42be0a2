use tracing::{debug, enabled, trace, warn, Level};

use crate::config::{Config, DeviceConfig};
use crate::error::ConnectError;
use crate::preprocess::PixelGrid;
use crate::protocol::{encode_image, Framing};
use crate::transport::{Connection, Sent, Status};

/// A palette LED display reached over one serial link
pub struct Pixoo {
    device: DeviceConfig,
    framing: Framing,
    connection: Connection,
}

impl Pixoo {
    pub fn new(device: DeviceConfig, framing: Framing, connection: Connection) -> Self {
        Pixoo {
            device,
            framing,
            connection,
        }
    }

    /// Build from configuration with the default RFCOMM strategies
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.device.clone(),
            config.framing,
            Connection::with_defaults(&config.transport),
        )
    }

    pub fn device(&self) -> &DeviceConfig {
        &self.device
    }

    pub fn status(&self) -> Status {
        self.connection.status()
    }

    pub fn connect(&mut self) -> Result<(), ConnectError> {
        self.connection.connect(&self.device)
    }

    pub fn close(&mut self) {
        self.connection.close();
    }

    /// Reconnect unless a link is already open. Returns whether one is open
    /// afterwards; a failed attempt is logged and left for the next call.
    pub fn ensure_connected(&mut self) -> bool {
        if self.connection.status() == Status::Connected {
            return true;
        }
        match self.connection.connect(&self.device) {
            Ok(()) => true,
            Err(e) => {
                warn!("✗ Reconnect to {} failed: {}", self.device.name, e);
                false
            }
        }
    }

    /// Encode and send a bitmap with an optional number stamped on it.
    ///
    /// An absent bitmap, or one with no pixels, sends nothing.
    pub fn show_image<G: PixelGrid + ?Sized>(&mut self, bitmap: Option<&G>, overlay: Option<u32>) -> Sent {
        let Some(bitmap) = bitmap else {
            debug!("No bitmap to show");
            return Sent::Skipped;
        };
        if !self.connection.is_connected() {
            return Sent::Skipped;
        }

        let frame = match encode_image(bitmap, overlay, self.framing) {
            Ok(Some(frame)) => frame,
            Ok(None) => return Sent::Skipped,
            Err(e) => {
                warn!("Could not frame image: {}", e);
                return Sent::Skipped;
            }
        };

        debug!("Sending image packet ({} bytes) to {}", frame.len(), self.device.name);
        if enabled!(Level::TRACE) {
            trace!("Complete frame: {}", hex_dump(&frame));
        }

        self.connection.send(&frame)
    }
}

/// Space-separated lowercase hex
pub fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransportConfig;
    use crate::protocol::unescape;
    use crate::transport::{ConnectStrategy, Link, Pacer};
    use image::{Rgba, RgbaImage};
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Loopback(Capture);

    impl ConnectStrategy for Loopback {
        fn name(&self) -> &'static str {
            "loopback"
        }

        fn connect(&self, _device: &DeviceConfig) -> Result<Link, ConnectError> {
            Ok(Box::new(self.0.clone()))
        }
    }

    struct NoPause;

    impl Pacer for NoPause {
        fn pause(&mut self, _delay: Duration) {}
    }

    fn pixoo(capture: &Capture, framing: Framing) -> Pixoo {
        let device = DeviceConfig {
            name: "Pixoo".to_string(),
            address: "11:75:58:00:00:01".to_string(),
            port: "loop".to_string(),
            baud_rate: 115200,
            bonded: true,
        };
        let conn = Connection::new(
            vec![Box::new(Loopback(capture.clone()))],
            Box::new(NoPause),
            &TransportConfig::default(),
        );
        Pixoo::new(device, framing, conn)
    }

    #[test]
    fn test_show_uniform_image() {
        let capture = Capture::default();
        let mut display = pixoo(&capture, Framing::Raw);
        display.connect().unwrap();

        let bitmap = RgbaImage::from_pixel(32, 32, Rgba([255, 0, 0, 255]));
        // 7 framing bytes + 12 header + 3 palette + 128 pixels
        assert_eq!(display.show_image(Some(&bitmap), None), Sent::Delivered { chunks: 1 });

        let wire = capture.0.lock().unwrap().clone();
        assert_eq!(wire.len(), 150);
        assert_eq!(wire[0], 0x01);
        assert_eq!(wire[3], 0x44);
        assert_eq!(&wire[3 + 11..3 + 13], &[0x01, 0x00]);
        assert_eq!(*wire.last().unwrap(), 0x02);
    }

    #[test]
    fn test_overlay_adds_black() {
        let capture = Capture::default();
        let mut display = pixoo(&capture, Framing::Escaped);
        display.connect().unwrap();

        let bitmap = RgbaImage::from_pixel(32, 32, Rgba([255, 255, 255, 255]));
        display.show_image(Some(&bitmap), Some(1));

        let wire = capture.0.lock().unwrap().clone();
        let inner = unescape(&wire[1..wire.len() - 1]).unwrap();
        // colorCount = 2; the top-left pixel of "1" is still white
        assert_eq!(&inner[3 + 10..3 + 12], &[0x02, 0x00]);
        assert_eq!(&inner[3 + 12..3 + 18], &[255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn test_absent_bitmap_sends_nothing() {
        let capture = Capture::default();
        let mut display = pixoo(&capture, Framing::Raw);
        display.connect().unwrap();

        assert_eq!(display.show_image::<RgbaImage>(None, Some(1)), Sent::Skipped);
        assert!(capture.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_not_connected_sends_nothing() {
        let capture = Capture::default();
        let mut display = pixoo(&capture, Framing::Raw);
        let bitmap = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]));
        assert_eq!(display.show_image(Some(&bitmap), None), Sent::Skipped);
        assert_eq!(display.status(), Status::Disconnected);
    }

    /// Fails for the first `failures` connects, then hands out the capture
    struct Flaky {
        capture: Capture,
        failures: Mutex<usize>,
        calls: Arc<Mutex<usize>>,
    }

    impl ConnectStrategy for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn connect(&self, device: &DeviceConfig) -> Result<Link, ConnectError> {
            *self.calls.lock().unwrap() += 1;
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(ConnectError::NotBonded(device.name.clone()));
            }
            Ok(Box::new(self.capture.clone()))
        }
    }

    #[test]
    fn test_ensure_connected_retries_after_failed_reconnect() {
        let capture = Capture::default();
        let calls = Arc::new(Mutex::new(0));
        let strategy = Flaky {
            capture: capture.clone(),
            failures: Mutex::new(2),
            calls: Arc::clone(&calls),
        };
        let mut display = pixoo(&capture, Framing::Raw);
        display.connection = Connection::new(
            vec![Box::new(strategy)],
            Box::new(NoPause),
            &TransportConfig::default(),
        );
        let bitmap = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 255, 255]));

        // Two failed passes leave the display Failed and sending nothing
        for _ in 0..2 {
            assert!(!display.ensure_connected());
            assert_eq!(display.status(), Status::Failed);
            assert_eq!(display.show_image(Some(&bitmap), Some(1)), Sent::Skipped);
        }

        // Each pass keeps retrying until the link comes back
        assert!(display.ensure_connected());
        assert_eq!(display.status(), Status::Connected);
        assert!(matches!(display.show_image(Some(&bitmap), Some(1)), Sent::Delivered { .. }));
        assert!(!capture.0.lock().unwrap().is_empty());

        // An open link is left alone
        assert!(display.ensure_connected());
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[test]
    fn test_hex_dump() {
        assert_eq!(hex_dump(&[0x01, 0xab, 0x00]), "01 ab 00");
    }
}
