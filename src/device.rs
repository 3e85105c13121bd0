use crate::prelude::*;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub type DeviceId = i64;

// DeviceType {{{
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// HGM9520N genset controller
    Generator,
    /// HGM9560 transfer switch panel
    Ats,
}

impl DeviceType {
    pub fn family(&self) -> Family {
        match self {
            Self::Generator => Family::Hgm9520n,
            Self::Ats => Family::Hgm9560,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generator => "generator",
            Self::Ats => "ats",
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "generator" => Ok(Self::Generator),
            "ats" => Ok(Self::Ats),
            _ => bail!("unknown device type {}", s),
        }
    }
} // }}}

// Protocol {{{
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Modbus TCP, MBAP framed
    Tcp,
    /// Modbus RTU frames tunnelled through a serial-to-ethernet converter
    RtuOverTcp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::RtuOverTcp => write!(f, "rtu_over_tcp"),
        }
    }
}

impl FromStr for Protocol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tcp" => Ok(Self::Tcp),
            "rtu_over_tcp" => Ok(Self::RtuOverTcp),
            _ => bail!("unknown protocol {}", s),
        }
    }
} // }}}

// Family {{{
/// Controller family; selects the register map and the alarm table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Hgm9520n,
    Hgm9560,
}

impl Family {
    pub fn register_map(&self) -> &'static RegisterMap {
        match self {
            Self::Hgm9520n => &register_map::hgm9520n::MAP,
            Self::Hgm9560 => &register_map::hgm9560::MAP,
        }
    }

    pub fn alarm_table(&self) -> &'static alarms::AlarmTable {
        match self {
            Self::Hgm9520n => &alarms::definitions::HGM9520N,
            Self::Hgm9560 => &alarms::definitions::HGM9560,
        }
    }
} // }}}

/// A polled controller. Never mutated while a reader uses it; a changed
/// device replaces its reader.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub device_type: DeviceType,
    pub host: String,
    pub port: u16,
    pub unit: u8,
    pub protocol: Protocol,
    pub site_code: Option<String>,
    pub timeout: Duration,
    pub retry_delay: Duration,
    pub poll_interval: Duration,
}

impl Device {
    pub fn family(&self) -> Family {
        self.device_type.family()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connection_changed(&self, other: &Device) -> bool {
        self.host != other.host
            || self.port != other.port
            || self.unit != other.unit
            || self.protocol != other.protocol
    }

    /// Anything but a rename needs the reader rebuilt.
    pub fn requires_restart(&self, other: &Device) -> bool {
        self.connection_changed(other)
            || self.device_type != other.device_type
            || self.site_code != other.site_code
            || self.timeout != other.timeout
            || self.retry_delay != other.retry_delay
            || self.poll_interval != other.poll_interval
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "device {} ({}, {}) at {} unit {} [{}]",
            self.id,
            self.name,
            self.device_type,
            self.address(),
            self.unit,
            self.protocol
        )
    }
}
