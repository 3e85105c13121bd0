pub use anyhow::{anyhow, bail, Result};
pub use log::{debug, error, info, trace, warn};
pub use std::str::FromStr;
pub use tokio::sync::broadcast;

pub use crate::alarms;
pub use crate::channels::Channels;
pub use crate::config::{self, Config, ConfigWrapper};
pub use crate::device::{Device, DeviceId, DeviceType, Family, Protocol};
pub use crate::options::Options;
pub use crate::register_map::{self, RegisterMap, Value};
pub use crate::snapshot::Snapshot;
