use crate::prelude::*;
use crate::error::Error;
use crate::modbus::{frame, Expect, FrameDecoder};
use crate::transport::Transport;

use {
    async_trait::async_trait,
    bytes::{Bytes, BytesMut},
    net2::TcpStreamExt,
    std::time::Duration,
    tokio::io::{AsyncReadExt, AsyncWriteExt},
    tokio::net::TcpStream,
    tokio::time::Instant,
    tokio_util::codec::Decoder,
};

const TCP_KEEPALIVE_SECS: u64 = 60;
const MAX_BUFFER_SIZE: usize = 1024;

/// Raw Modbus RTU frames over a plain TCP socket to an RS485 converter.
///
/// The converter is slow and bursty: replies arrive fragmented, late, or
/// glued to the tail of a previous reply. Every transaction therefore drains
/// the socket first, waits out the RS485 turnaround, then scans the incoming
/// bytes for the expected frame instead of trusting byte 0.
pub struct RtuOverTcpTransport {
    device_id: DeviceId,
    host: String,
    port: u16,
    unit: u8,
    timeout: Duration,
    inter_frame_delay: Duration,
    inter_block_delay: Duration,
    quiet_period: Duration,
    stream: Option<TcpStream>,
    buf: BytesMut,
}

impl RtuOverTcpTransport {
    pub fn new(device: &Device, poller: &config::Poller) -> Self {
        Self {
            device_id: device.id,
            host: device.host.clone(),
            port: device.port,
            unit: device.unit,
            timeout: device.timeout,
            inter_frame_delay: poller.inter_frame_delay(),
            inter_block_delay: poller.inter_block_delay(),
            quiet_period: poller.quiet_period(),
            stream: None,
            buf: BytesMut::with_capacity(MAX_BUFFER_SIZE),
        }
    }

    fn stream(&mut self) -> Result<&mut TcpStream, Error> {
        self.stream
            .as_mut()
            .ok_or_else(|| Error::Connectivity("not connected".to_string()))
    }

    /// Reads and throws away anything the converter sends until it has been
    /// quiet for `quiet_period`. Gives up after the device timeout on a
    /// link that never goes quiet.
    async fn drain(&mut self) -> Result<(), Error> {
        let quiet = self.quiet_period;
        let limit = self.timeout;
        let device_id = self.device_id;
        let stream = self.stream()?;

        let started = Instant::now();
        let mut scratch = [0u8; 256];
        let mut discarded = 0;

        while started.elapsed() < limit {
            match tokio::time::timeout(quiet, stream.read(&mut scratch)).await {
                Err(_) => break,
                Ok(Ok(0)) => {
                    return Err(Error::Connectivity(
                        "connection closed by peer while draining".to_string(),
                    ))
                }
                Ok(Ok(n)) => discarded += n,
                Ok(Err(e)) => return Err(e.into()),
            }
        }

        if discarded > 0 {
            debug!("device {}: flushed {} stale bytes", device_id, discarded);
        }

        Ok(())
    }

    /// Sends `request` and returns the first frame matching `expect`.
    async fn transact(&mut self, request: &[u8], expect: Expect) -> Result<Bytes, Error> {
        self.drain().await?;

        self.stream()?.write_all(request).await?;
        trace!("device {}: tx {}", self.device_id, frame::hex(request));

        tokio::time::sleep(self.inter_frame_delay).await;

        self.buf.clear();
        let mut decoder = FrameDecoder::new(expect);
        let deadline = Instant::now() + self.timeout;

        loop {
            if let Some(reply) = decoder.decode(&mut self.buf)? {
                trace!("device {}: rx {}", self.device_id, frame::hex(&reply));
                return Ok(reply);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            let stream = self
                .stream
                .as_mut()
                .ok_or_else(|| Error::Connectivity("not connected".to_string()))?;

            match tokio::time::timeout(remaining, stream.read_buf(&mut self.buf)).await {
                Err(_) => {
                    warn!(
                        "device {}: no valid frame within {:?}, buffered: {}",
                        self.device_id,
                        self.timeout,
                        if self.buf.is_empty() {
                            "empty".to_string()
                        } else {
                            frame::hex(&self.buf)
                        }
                    );
                    return Err(Error::Timeout {
                        operation: "rtu response",
                        after: self.timeout,
                    });
                }
                Ok(Ok(0)) => {
                    return Err(Error::Connectivity(
                        "connection closed by peer".to_string(),
                    ))
                }
                Ok(Ok(_)) => continue,
                Ok(Err(e)) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl Transport for RtuOverTcpTransport {
    async fn connect(&mut self) -> Result<(), Error> {
        self.disconnect().await;

        let stream = tokio::time::timeout(
            self.timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        .map_err(|_| Error::Timeout {
            operation: "connect",
            after: self.timeout,
        })?
        .map_err(|e| Error::Connectivity(format!("{}:{}: {}", self.host, self.port, e)))?;

        let std_stream = stream.into_std()?;
        if let Err(e) = std_stream.set_keepalive(Some(Duration::from_secs(TCP_KEEPALIVE_SECS))) {
            warn!("device {}: failed to set TCP keepalive: {}", self.device_id, e);
        }
        let stream = TcpStream::from_std(std_stream)?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!("device {}: failed to set TCP_NODELAY: {}", self.device_id, e);
        }

        info!(
            "device {}: rtu over tcp connected to {}:{} unit {}",
            self.device_id, self.host, self.port, self.unit
        );
        self.stream = Some(stream);
        self.buf.clear();
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("device {}: closing rtu socket", self.device_id);
            let _ = stream.shutdown().await;
        }
        self.buf.clear();
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, Error> {
        let request = frame::build_read_request(self.unit, address, count);
        let reply = self
            .transact(&request, Expect::registers(self.unit, count))
            .await?;
        frame::parse_read_response(&reply, self.unit, count)
    }

    async fn write_coil(&mut self, address: u16, value: bool) -> Result<(), Error> {
        let request = frame::build_write_coil(self.unit, address, value);
        let reply = self.transact(&request, Expect::echo_of(&request)).await?;
        frame::validate_echo(&request, &reply)
    }

    async fn write_register(&mut self, address: u16, value: u16) -> Result<(), Error> {
        let request = frame::build_write_register(self.unit, address, value);
        let reply = self.transact(&request, Expect::echo_of(&request)).await?;
        frame::validate_echo(&request, &reply)
    }

    fn inter_block_delay(&self) -> Duration {
        self.inter_block_delay
    }
}
