pub mod rtu_over_tcp;
pub mod tcp;

use crate::prelude::*;
use crate::error::Error;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use rtu_over_tcp::RtuOverTcpTransport;
pub use tcp::TcpTransport;

/// Wire access to one controller. Implementations are not synchronised;
/// the owning [`crate::reader::Reader`] serialises every call.
#[async_trait]
pub trait Transport: Send {
    async fn connect(&mut self) -> Result<(), Error>;

    /// Drops the socket. Never fails; errors while closing are ignored.
    async fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, Error>;

    async fn write_coil(&mut self, address: u16, value: bool) -> Result<(), Error>;

    async fn write_register(&mut self, address: u16, value: u16) -> Result<(), Error>;

    /// Called at the start of every poll cycle, before any block is read.
    async fn begin_cycle(&mut self) {}

    /// Pause between consecutive block reads of one cycle.
    fn inter_block_delay(&self) -> Duration {
        Duration::ZERO
    }
}

/// Builds the transport for a device; swapped out in tests.
pub type Connector = Arc<dyn Fn(&Device) -> Box<dyn Transport> + Send + Sync>;

/// Picks the transport implementation from the device's protocol.
pub fn network_connector(config: ConfigWrapper) -> Connector {
    Arc::new(move |device: &Device| -> Box<dyn Transport> {
        let poller = config.poller();
        match device.protocol {
            Protocol::Tcp => Box::new(TcpTransport::new(device, poller.tcp_reconnect_cycles())),
            Protocol::RtuOverTcp => Box::new(RtuOverTcpTransport::new(device, &poller)),
        }
    })
}
