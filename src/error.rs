use std::time::Duration;

use crate::device::DeviceId;

/// Errors raised on the wire path: transports, frame handling, decoding and
/// the per-device lock. Application plumbing (config, database, redis) uses
/// `anyhow` instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Socket level failure: refused/closed connection, write error, EOF.
    #[error("connection failed: {0}")]
    Connectivity(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// CRC failure, echo mismatch or an otherwise malformed frame.
    #[error("bad frame: {0}")]
    Frame(String),

    #[error("modbus exception for function 0x{function:02x}: {}", exception_text(.code))]
    Exception { function: u8, code: u8 },

    #[error("register index {index} out of range for block of {len}")]
    Decode { index: usize, len: usize },

    #[error("no data received")]
    NoData,

    #[error("device {device_id} busy (lock not acquired within {waited:?}), retry later")]
    Busy { device_id: DeviceId, waited: Duration },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    /// Wire-level failures. A command that hits one drops its socket.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Connectivity(_) | Self::Timeout { .. } | Self::Frame(_) | Self::Exception { .. }
        )
    }

    /// The reply stream can no longer be trusted, so the socket has to go
    /// before the next transaction.
    pub fn needs_reconnect(&self) -> bool {
        matches!(
            self,
            Self::Connectivity(_) | Self::Timeout { .. } | Self::Frame(_)
        )
    }

    /// The link itself is gone; no point trying the remaining blocks.
    pub fn aborts_cycle(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Connectivity(err.to_string())
    }
}

fn exception_text(code: &u8) -> &'static str {
    crate::modbus::frame::describe_exception(*code)
}
