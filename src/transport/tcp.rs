use crate::prelude::*;
use crate::error::Error;
use crate::modbus::FunctionCode;
use crate::transport::Transport;

use async_trait::async_trait;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_modbus::client::{tcp, Client, Context, Reader, Writer};
use tokio_modbus::slave::Slave;

/// Modbus TCP client for controllers with a native ethernet port.
///
/// Framing, transaction ids and echo checks are left to tokio-modbus. The
/// connection is recycled every `reconnect_cycles` poll cycles so a socket
/// wedged on the controller side cannot survive indefinitely.
pub struct TcpTransport {
    device_id: DeviceId,
    host: String,
    port: u16,
    unit: u8,
    timeout: Duration,
    reconnect_cycles: u32,
    cycles: u32,
    ctx: Option<Context>,
}

impl TcpTransport {
    pub fn new(device: &Device, reconnect_cycles: u32) -> Self {
        Self {
            device_id: device.id,
            host: device.host.clone(),
            port: device.port,
            unit: device.unit,
            timeout: device.timeout,
            reconnect_cycles,
            cycles: 0,
            ctx: None,
        }
    }

    fn context(&mut self) -> Result<&mut Context, Error> {
        self.ctx
            .as_mut()
            .ok_or_else(|| Error::Connectivity("not connected".to_string()))
    }
}

async fn resolve(host: String, port: u16) -> Result<SocketAddr, Error> {
    tokio::net::lookup_host((host.as_str(), port))
        .await?
        .next()
        .ok_or_else(|| Error::Connectivity(format!("cannot resolve {}", host)))
}

fn protocol_error(err: tokio_modbus::Error) -> Error {
    Error::Connectivity(err.to_string())
}

fn exception(function: FunctionCode, code: tokio_modbus::ExceptionCode) -> Error {
    Error::Exception {
        function: function.into(),
        code: code.into(),
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> Result<(), Error> {
        self.disconnect().await;

        let addr = resolve(self.host.clone(), self.port).await?;
        let ctx = tokio::time::timeout(self.timeout, tcp::connect_slave(addr, Slave(self.unit)))
            .await
            .map_err(|_| Error::Timeout {
                operation: "connect",
                after: self.timeout,
            })?
            .map_err(|e| Error::Connectivity(format!("{}: {}", addr, e)))?;

        info!(
            "device {}: modbus tcp connected to {} unit {}",
            self.device_id, addr, self.unit
        );
        self.ctx = Some(ctx);
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            debug!("device {}: closing modbus tcp connection", self.device_id);
            let _ = ctx.disconnect().await;
        }
    }

    fn is_connected(&self) -> bool {
        self.ctx.is_some()
    }

    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, Error> {
        let timeout = self.timeout;
        let ctx = self.context()?;
        tokio::time::timeout(timeout, ctx.read_holding_registers(address, count))
            .await
            .map_err(|_| Error::Timeout {
                operation: "read holding registers",
                after: timeout,
            })?
            .map_err(protocol_error)?
            .map_err(|code| exception(FunctionCode::ReadHoldingRegisters, code))
    }

    async fn write_coil(&mut self, address: u16, value: bool) -> Result<(), Error> {
        let timeout = self.timeout;
        let ctx = self.context()?;
        tokio::time::timeout(timeout, ctx.write_single_coil(address, value))
            .await
            .map_err(|_| Error::Timeout {
                operation: "write single coil",
                after: timeout,
            })?
            .map_err(protocol_error)?
            .map_err(|code| exception(FunctionCode::WriteSingleCoil, code))
    }

    async fn write_register(&mut self, address: u16, value: u16) -> Result<(), Error> {
        let timeout = self.timeout;
        let ctx = self.context()?;
        tokio::time::timeout(timeout, ctx.write_single_register(address, value))
            .await
            .map_err(|_| Error::Timeout {
                operation: "write single register",
                after: timeout,
            })?
            .map_err(protocol_error)?
            .map_err(|code| exception(FunctionCode::WriteSingleRegister, code))
    }

    async fn begin_cycle(&mut self) {
        if self.reconnect_cycles == 0 {
            return;
        }

        self.cycles += 1;
        if self.cycles >= self.reconnect_cycles {
            self.cycles = 0;
            if self.is_connected() {
                debug!(
                    "device {}: recycling connection after {} cycles",
                    self.device_id, self.reconnect_cycles
                );
                self.disconnect().await;
            }
        }
    }
}
