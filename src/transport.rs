use std::io::Write;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::config::{DeviceConfig, TransportConfig};
use crate::error::ConnectError;

/// Serial Port Profile service class UUID
pub const SPP_UUID: &str = "00001101-0000-1000-8000-00805F9B34FB";

/// An open byte stream to the device
pub type Link = Box<dyn Write + Send>;

/// One way of opening a link to a device. Strategies are tried in order.
pub trait ConnectStrategy: Send {
    fn name(&self) -> &'static str;
    fn connect(&self, device: &DeviceConfig) -> Result<Link, ConnectError>;
}

/// RFCOMM link exposed by the OS as a serial port.
pub struct RfcommStrategy {
    secure: bool,
    timeout: Duration,
}

impl RfcommStrategy {
    /// Only attempted for bonded devices. The port is opened exactly like
    /// [`insecure`](Self::insecure); whether the link is authenticated is
    /// decided by the OS RFCOMM binding, not here.
    pub fn secure(timeout: Duration) -> Self {
        RfcommStrategy { secure: true, timeout }
    }

    /// Unauthenticated link; attempted regardless of bond state
    pub fn insecure(timeout: Duration) -> Self {
        RfcommStrategy { secure: false, timeout }
    }
}

impl ConnectStrategy for RfcommStrategy {
    fn name(&self) -> &'static str {
        if self.secure {
            "secure"
        } else {
            "insecure"
        }
    }

    fn connect(&self, device: &DeviceConfig) -> Result<Link, ConnectError> {
        if self.secure && !device.bonded {
            return Err(ConnectError::NotBonded(device.name.clone()));
        }

        let mut port = serialport::new(&device.port, device.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(self.timeout)
            .open()
            .map_err(|source| ConnectError::Open {
                port: device.port.clone(),
                source,
            })?;

        if let Err(e) = port.write_data_terminal_ready(true) {
            warn!("Failed to set DTR on {}: {}", device.port, e);
        }

        Ok(Box::new(port))
    }
}

/// Waits between chunks so the device's receive buffer can drain
pub trait Pacer: Send {
    fn pause(&mut self, delay: Duration);
}

/// Blocks the calling thread for the delay
pub struct ThreadSleep;

impl Pacer for ThreadSleep {
    fn pause(&mut self, delay: Duration) {
        thread::sleep(delay);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Disconnected,
    Connected,
    /// Last connect or write failed; sends are skipped until reconnected
    Failed,
}

/// Outcome of [`Connection::send`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sent {
    Delivered { chunks: usize },
    /// No open link; nothing was written
    Skipped,
    /// A write failed and the link was torn down
    Aborted,
}

/// Owned connection handle. Callers serialize access; there is one writer.
pub struct Connection {
    strategies: Vec<Box<dyn ConnectStrategy>>,
    pacer: Box<dyn Pacer>,
    chunk_size: usize,
    chunk_delay: Duration,
    link: Option<Link>,
    status: Status,
}

impl Connection {
    pub fn new(
        strategies: Vec<Box<dyn ConnectStrategy>>,
        pacer: Box<dyn Pacer>,
        settings: &TransportConfig,
    ) -> Self {
        Connection {
            strategies,
            pacer,
            chunk_size: settings.chunk_size.max(1),
            chunk_delay: Duration::from_millis(settings.chunk_delay_ms),
            link: None,
            status: Status::Disconnected,
        }
    }

    /// Secure then insecure RFCOMM, pausing with a thread sleep
    pub fn with_defaults(settings: &TransportConfig) -> Self {
        let timeout = Duration::from_millis(settings.timeout_ms);
        Self::new(
            vec![
                Box::new(RfcommStrategy::secure(timeout)),
                Box::new(RfcommStrategy::insecure(timeout)),
            ],
            Box::new(ThreadSleep),
            settings,
        )
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    /// Drop any existing link, then try each strategy until one succeeds
    pub fn connect(&mut self, device: &DeviceConfig) -> Result<(), ConnectError> {
        self.close();
        info!(
            "Connecting to {} ({}) on {}, service {}",
            device.name, device.address, device.port, SPP_UUID
        );

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for (i, strategy) in self.strategies.iter().enumerate() {
            debug!("Attempt {}: {} link", i + 1, strategy.name());
            match strategy.connect(device) {
                Ok(link) => {
                    self.link = Some(link);
                    self.status = Status::Connected;
                    info!("✓ Connected to {} ({} link)", device.name, strategy.name());
                    return Ok(());
                }
                Err(e) => {
                    warn!("{} connect to {} failed: {}", strategy.name(), device.name, e);
                    attempts.push((strategy.name(), e.to_string()));
                }
            }
        }

        self.status = Status::Failed;
        Err(ConnectError::Exhausted {
            device: device.name.clone(),
            attempts,
        })
    }

    /// Tear down the link; safe to call repeatedly
    pub fn close(&mut self) {
        if self.link.take().is_some() {
            debug!("Link closed");
        }
        self.status = Status::Disconnected;
    }

    /// Write `frame` in chunks, flushing and pausing after each one.
    /// A failed write drops the link; later sends are skipped until a
    /// successful [`connect`](Self::connect).
    pub fn send(&mut self, frame: &[u8]) -> Sent {
        let Some(link) = self.link.as_mut() else {
            trace!("No link, dropping {} byte frame", frame.len());
            return Sent::Skipped;
        };

        let total = frame.len().div_ceil(self.chunk_size);
        let mut chunks = 0;
        for chunk in frame.chunks(self.chunk_size) {
            if let Err(e) = link.write_all(chunk).and_then(|_| link.flush()) {
                error!("✗ Write failed on chunk {} of {}: {}", chunks + 1, total, e);
                self.link = None;
                self.status = Status::Failed;
                return Sent::Aborted;
            }
            chunks += 1;
            self.pacer.pause(self.chunk_delay);
        }

        debug!(">> TX: {} bytes in {} chunks", frame.len(), chunks);
        Sent::Delivered { chunks }
    }
}
