use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("payload of {0} bytes does not fit the 16-bit length field")]
    PayloadTooLarge(usize),

    #[error("{field} of {value} does not fit a 16-bit header field")]
    FieldOverflow { field: &'static str, value: usize },
}

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("{0} is not bonded")]
    NotBonded(String),

    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("all connection attempts to {device} failed: {}", summarize(.attempts))]
    Exhausted {
        device: String,
        attempts: Vec<(&'static str, String)>,
    },
}

fn summarize(attempts: &[(&'static str, String)]) -> String {
    attempts
        .iter()
        .map(|(name, err)| format!("{}: {}", name, err))
        .collect::<Vec<_>>()
        .join("; ")
}
