use crate::prelude::*;
use crate::error::Error;
use crate::register_map::Fields;
use crate::transport::Transport;

use serde::Serialize;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

/// Spacing inside [`Reader::pulse_coil`].
pub const PULSE_SETTLE: Duration = Duration::from_millis(100);
pub const PULSE_HOLD: Duration = Duration::from_millis(600);

/// Outcome of reading back one register after a batch write.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WriteVerification {
    pub address: u16,
    pub wrote: u16,
    /// None when the read-back itself failed.
    pub read_back: Option<u16>,
}

impl WriteVerification {
    pub fn verified(&self) -> bool {
        self.read_back == Some(self.wrote)
    }
}

/// Owns the transport of one device. The poll cycle and every command take
/// the same lock, so at most one transaction is on the wire per device and a
/// batch is never interleaved with a poll.
pub struct Reader {
    device: Device,
    map: &'static RegisterMap,
    transport: Mutex<Box<dyn Transport>>,
    lock_timeout: Duration,
    block_retries: u32,
}

impl Reader {
    pub fn new(
        device: Device,
        transport: Box<dyn Transport>,
        lock_timeout: Duration,
        block_retries: u32,
    ) -> Self {
        Self {
            map: device.family().register_map(),
            device,
            transport: Mutex::new(transport),
            lock_timeout,
            block_retries,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    async fn lock(&self) -> Result<MutexGuard<'_, Box<dyn Transport>>, Error> {
        tokio::time::timeout(self.lock_timeout, self.transport.lock())
            .await
            .map_err(|_| Error::Busy {
                device_id: self.device.id,
                waited: self.lock_timeout,
            })
    }

    async fn ensure_connected(transport: &mut Box<dyn Transport>) -> Result<(), Error> {
        if !transport.is_connected() {
            transport.connect().await?;
        }
        Ok(())
    }

    /// Runs a command body under the lock with a live connection. A
    /// connectivity failure drops the socket before the error is returned.
    async fn command<T, F>(&self, body: F) -> Result<T, Error>
    where
        T: Send,
        F: for<'a> FnOnce(
                &'a mut Box<dyn Transport>,
            ) -> futures::future::BoxFuture<'a, Result<T, Error>>
            + Send,
    {
        let mut transport = self.lock().await?;

        let result = match Self::ensure_connected(&mut *transport).await {
            Ok(()) => body(&mut *transport).await,
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            if err.is_connectivity() {
                warn!("{}: command failed, disconnecting: {}", self.device, err);
                transport.disconnect().await;
            }
        }

        result
    }

    // poll cycle {{{
    /// Reads and decodes every block of the register map.
    ///
    /// A block that keeps failing after `block_retries` extra attempts is
    /// skipped for this cycle; its fields are simply absent. A timeout or a
    /// garbled reply drops the socket and the next attempt starts on a fresh
    /// one. The cycle is
    /// abandoned on a dead link, and fails with [`Error::NoData`] when not a
    /// single block could be read.
    pub async fn read_all(&self) -> Result<Fields, Error> {
        let mut transport = self.transport.lock().await;

        transport.begin_cycle().await;

        let delay = transport.inter_block_delay();
        let mut fields = Fields::new();
        let mut read = 0;

        for (i, block) in self.map.blocks.iter().enumerate() {
            if i > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let mut attempt = 0;
            loop {
                Self::ensure_connected(&mut *transport).await?;

                match transport.read_registers(block.address, block.count).await {
                    Ok(regs) => {
                        block.decode_into(&regs, &mut fields);
                        read += 1;
                        break;
                    }
                    Err(err) if err.aborts_cycle() => {
                        transport.disconnect().await;
                        return Err(err);
                    }
                    Err(err) => {
                        if err.needs_reconnect() {
                            transport.disconnect().await;
                        }
                        let retry = attempt < self.block_retries
                            && !matches!(err, Error::Exception { .. });
                        warn!(
                            "{}: block {} @{}x{}: {}{}",
                            self.device,
                            block.name,
                            block.address,
                            block.count,
                            err,
                            if retry { ", retrying" } else { "" }
                        );
                        if !retry {
                            break;
                        }
                        attempt += 1;
                    }
                }
            }
        }

        if read == 0 {
            warn!("{}: all blocks failed", self.device);
            if transport.is_connected() {
                transport.disconnect().await;
            }
            return Err(Error::NoData);
        }

        self.map.apply_labels(&mut fields);
        Ok(fields)
    } // }}}

    // commands {{{
    pub async fn read_registers(&self, address: u16, count: u16) -> Result<Vec<u16>, Error> {
        check_count(count)?;
        self.command(|t| Box::pin(async move { t.read_registers(address, count).await }))
            .await
    }

    /// Several ranges under one lock acquisition.
    pub async fn read_registers_batch(
        &self,
        ranges: &[(u16, u16)],
    ) -> Result<Vec<Vec<u16>>, Error> {
        for (_, count) in ranges {
            check_count(*count)?;
        }
        let ranges = ranges.to_vec();

        self.command(|t| {
            Box::pin(async move {
                let mut out = Vec::with_capacity(ranges.len());
                for (address, count) in ranges {
                    out.push(t.read_registers(address, count).await?);
                }
                Ok(out)
            })
        })
        .await
    }

    pub async fn write_coil(&self, address: u16, value: bool) -> Result<(), Error> {
        info!("{}: write coil {} = {}", self.device, address, value);
        self.command(|t| Box::pin(async move { t.write_coil(address, value).await }))
            .await
    }

    /// OFF, ON, OFF on one coil without releasing the lock, for controller
    /// inputs that react to an edge.
    pub async fn pulse_coil(&self, address: u16) -> Result<(), Error> {
        info!("{}: pulse coil {}", self.device, address);
        self.command(|t| {
            Box::pin(async move {
                t.write_coil(address, false).await?;
                tokio::time::sleep(PULSE_SETTLE).await;
                t.write_coil(address, true).await?;
                tokio::time::sleep(PULSE_HOLD).await;
                t.write_coil(address, false).await
            })
        })
        .await
    }

    pub async fn write_register(&self, address: u16, value: u16) -> Result<(), Error> {
        info!("{}: write register {} = {}", self.device, address, value);
        self.command(|t| Box::pin(async move { t.write_register(address, value).await }))
            .await
    }

    /// Writes every `(address, value)` pair, optionally preceded by an unlock
    /// write, then reads each address back.
    ///
    /// A failed write aborts the batch. Read-back mismatches and read-back
    /// failures do not; they are reported per address.
    pub async fn write_registers_batch(
        &self,
        writes: &[(u16, u16)],
        unlock: Option<(u16, u16)>,
    ) -> Result<Vec<WriteVerification>, Error> {
        if writes.is_empty() {
            return Err(Error::InvalidRequest("empty write batch".to_string()));
        }
        let writes = writes.to_vec();
        let device = self.device.to_string();

        self.command(|t| {
            Box::pin(async move {
                if let Some((address, value)) = unlock {
                    debug!("{}: unlock {} = {}", device, address, value);
                    t.write_register(address, value).await?;
                }

                for (address, value) in &writes {
                    debug!("{}: write {} = {}", device, address, value);
                    t.write_register(*address, *value).await?;
                }

                let mut results = Vec::with_capacity(writes.len());
                for (address, value) in writes {
                    let read_back = match t.read_registers(address, 1).await {
                        Ok(regs) => regs.first().copied(),
                        Err(err) => {
                            warn!("{}: read back {} failed: {}", device, address, err);
                            None
                        }
                    };
                    if read_back != Some(value) {
                        warn!(
                            "{}: register {} wrote {} read back {:?}",
                            device, address, value, read_back
                        );
                    }
                    results.push(WriteVerification {
                        address,
                        wrote: value,
                        read_back,
                    });
                }

                Ok(results)
            })
        })
        .await
    } // }}}

    /// Drops the connection; waits for any transaction in flight.
    pub async fn disconnect(&self) {
        self.transport.lock().await.disconnect().await;
    }
}

fn check_count(count: u16) -> Result<(), Error> {
    if count == 0 || count > crate::modbus::frame::MAX_READ_REGISTERS {
        return Err(Error::InvalidRequest(format!(
            "register count {} outside 1..={}",
            count,
            crate::modbus::frame::MAX_READ_REGISTERS
        )));
    }
    Ok(())
}
