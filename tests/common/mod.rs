#![allow(dead_code)]

pub use smartgen_bridge::prelude::*;
pub use smartgen_bridge::error::Error;
pub use smartgen_bridge::register_map::Fields;
pub use smartgen_bridge::transport::{Connector, Transport};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn common_setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// FakeTransport {{{
/// What the fake controller holds and what it saw.
#[derive(Default)]
pub struct FakeState {
    pub registers: HashMap<u16, u16>,
    /// Reads at these addresses fail with the given error.
    pub failing: HashMap<u16, Error>,
    /// Writes here are acknowledged but not stored.
    pub ignore_writes: HashSet<u16>,
    pub connect_error: Option<Error>,
    pub delay: Duration,

    pub ops: Vec<String>,
    /// `ops` interleaved with "connect" and "disconnect".
    pub log: Vec<String>,
    pub connects: usize,
    pub disconnects: usize,
    pub cycles: usize,
    pub in_flight: usize,
    pub max_in_flight: usize,
}

#[derive(Clone, Default)]
pub struct Fake {
    pub state: Arc<Mutex<FakeState>>,
}

impl Fake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn set(&self, address: u16, values: &[u16]) {
        self.with(|s| {
            for (i, v) in values.iter().enumerate() {
                s.registers.insert(address + i as u16, *v);
            }
        })
    }

    pub fn get(&self, address: u16) -> u16 {
        self.with(|s| s.registers.get(&address).copied().unwrap_or(0))
    }

    pub fn ops(&self) -> Vec<String> {
        self.with(|s| s.ops.clone())
    }

    pub fn log(&self) -> Vec<String> {
        self.with(|s| s.log.clone())
    }

    pub fn transport(&self) -> Box<dyn Transport> {
        Box::new(FakeTransport {
            fake: self.clone(),
            connected: false,
        })
    }

    /// Every device built by this connector talks to this fake.
    pub fn connector(&self) -> Connector {
        let fake = self.clone();
        Arc::new(move |_device: &Device| fake.transport())
    }
}

pub struct FakeTransport {
    fake: Fake,
    connected: bool,
}

impl FakeTransport {
    async fn op<R>(&self, name: String, f: impl FnOnce(&mut FakeState) -> R) -> R {
        let delay = self.fake.with(|s| {
            s.in_flight += 1;
            s.max_in_flight = s.max_in_flight.max(s.in_flight);
            s.log.push(name.clone());
            s.ops.push(name);
            s.delay
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.fake.with(|s| {
            s.in_flight -= 1;
            f(s)
        })
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn connect(&mut self) -> Result<(), Error> {
        let result = self.fake.with(|s| {
            s.connects += 1;
            s.log.push("connect".to_string());
            match &s.connect_error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        });
        self.connected = result.is_ok();
        result
    }

    async fn disconnect(&mut self) {
        self.connected = false;
        self.fake.with(|s| {
            s.disconnects += 1;
            s.log.push("disconnect".to_string());
        });
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u16>, Error> {
        self.op(format!("read {} {}", address, count), |s| {
            if let Some(err) = s.failing.get(&address) {
                return Err(err.clone());
            }
            Ok((0..count)
                .map(|i| s.registers.get(&(address + i)).copied().unwrap_or(0))
                .collect())
        })
        .await
    }

    async fn write_coil(&mut self, address: u16, value: bool) -> Result<(), Error> {
        self.op(format!("coil {} {}", address, value), |_| Ok(())).await
    }

    async fn write_register(&mut self, address: u16, value: u16) -> Result<(), Error> {
        self.op(format!("write {} {}", address, value), |s| {
            if !s.ignore_writes.contains(&address) {
                s.registers.insert(address, value);
            }
            Ok(())
        })
        .await
    }

    async fn begin_cycle(&mut self) {
        self.fake.with(|s| s.cycles += 1);
    }
} // }}}

// MemorySource {{{
/// Device list the tests can swap between reloads.
#[derive(Clone, Default)]
pub struct MemorySource {
    pub devices: Arc<Mutex<Vec<Device>>>,
}

impl MemorySource {
    pub fn new(devices: Vec<Device>) -> Self {
        Self {
            devices: Arc::new(Mutex::new(devices)),
        }
    }

    pub fn replace(&self, devices: Vec<Device>) {
        *self.devices.lock().unwrap() = devices;
    }
}

#[async_trait]
impl smartgen_bridge::poller::DeviceSource for MemorySource {
    async fn load_devices(&self) -> Result<Vec<Device>> {
        Ok(self.devices.lock().unwrap().clone())
    }
} // }}}

pub struct Factory();
impl Factory {
    pub fn device(id: DeviceId, device_type: DeviceType) -> Device {
        Device {
            id,
            name: format!("device-{}", id),
            device_type,
            host: "127.0.0.1".to_string(),
            port: 502,
            unit: 1,
            protocol: match device_type {
                DeviceType::Generator => Protocol::Tcp,
                DeviceType::Ats => Protocol::RtuOverTcp,
            },
            site_code: Some("SITE-1".to_string()),
            timeout: Duration::from_millis(500),
            retry_delay: Duration::from_millis(50),
            poll_interval: Duration::from_millis(20),
        }
    }

    pub fn generator() -> Device {
        Self::device(1, DeviceType::Generator)
    }

    pub fn ats() -> Device {
        Self::device(2, DeviceType::Ats)
    }

    pub fn config() -> ConfigWrapper {
        ConfigWrapper::from_config(
            Config::from_yaml("redis:\n  enabled: false\n").unwrap(),
        )
    }

    pub fn reader(device: Device, fake: &Fake) -> Arc<smartgen_bridge::reader::Reader> {
        Arc::new(smartgen_bridge::reader::Reader::new(
            device,
            fake.transport(),
            Duration::from_secs(5),
            1,
        ))
    }

    pub fn snapshot(device: &Device, fields: &[(&str, Value)]) -> Snapshot {
        Snapshot::online(
            device,
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }
}
