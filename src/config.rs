use crate::prelude::*;

use serde::Deserialize;
use serde_with::{serde_as, DurationMilliSeconds};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,

    #[serde(default)]
    pub redis: Redis,
    pub database: Option<Database>,
    #[serde(default)]
    pub poller: Poller,
    #[serde(default)]
    pub commands: Commands,

    /// Used when no database is enabled.
    #[serde(default = "Vec::new")]
    pub devices: Vec<DeviceConfig>,
}

// Redis {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Redis {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    #[serde(default = "Config::default_redis_url")]
    pub url: String,

    /// Seconds a published snapshot stays readable without a refresh.
    pub snapshot_ttl: Option<u64>,
}

impl Default for Redis {
    fn default() -> Self {
        Self {
            enabled: Config::default_enabled(),
            url: Config::default_redis_url(),
            snapshot_ttl: None,
        }
    }
}

impl Redis {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn snapshot_ttl(&self) -> u64 {
        self.snapshot_ttl.unwrap_or(30)
    }
} // }}}

// Database {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Database {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    pub url: String,
}

impl Database {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn url(&self) -> &str {
        &self.url
    }
} // }}}

// Poller {{{
#[serde_as]
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Poller {
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default, rename = "poll_interval_ms")]
    pub poll_interval: Option<Duration>,

    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default, rename = "timeout_ms")]
    pub timeout: Option<Duration>,

    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default, rename = "retry_delay_ms")]
    pub retry_delay: Option<Duration>,

    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default, rename = "lock_timeout_ms")]
    pub lock_timeout: Option<Duration>,

    pub block_retries: Option<u32>,
    pub tcp_reconnect_cycles: Option<u32>,

    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default, rename = "inter_frame_delay_ms")]
    pub inter_frame_delay: Option<Duration>,

    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default, rename = "inter_block_delay_ms")]
    pub inter_block_delay: Option<Duration>,

    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default, rename = "quiet_period_ms")]
    pub quiet_period: Option<Duration>,
}

impl Poller {
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval.unwrap_or(Duration::from_secs(2))
    }

    /// Per-transaction timeout for devices that do not set their own.
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(Duration::from_secs(2))
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay.unwrap_or(Duration::from_secs(5))
    }

    /// Longer than a full RTU poll cycle.
    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout.unwrap_or(Duration::from_secs(30))
    }

    pub fn block_retries(&self) -> u32 {
        self.block_retries.unwrap_or(1)
    }

    /// 0 disables the periodic reconnect.
    pub fn tcp_reconnect_cycles(&self) -> u32 {
        self.tcp_reconnect_cycles.unwrap_or(50)
    }

    pub fn inter_frame_delay(&self) -> Duration {
        self.inter_frame_delay.unwrap_or(Duration::from_millis(150))
    }

    pub fn inter_block_delay(&self) -> Duration {
        self.inter_block_delay.unwrap_or(Duration::from_millis(50))
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period.unwrap_or(Duration::from_millis(50))
    }
} // }}}

// Commands {{{
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Commands {
    pub unlock_register: Option<u16>,
    pub unlock_value: Option<u16>,
}

impl Commands {
    /// Password write preceding batch writes, when configured.
    pub fn unlock(&self) -> Option<(u16, u16)> {
        self.unlock_register.zip(self.unlock_value)
    }
} // }}}

// DeviceConfig {{{
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct DeviceConfig {
    pub id: DeviceId,
    pub name: String,
    pub device_type: DeviceType,
    pub host: String,
    #[serde(default = "Config::default_modbus_port")]
    pub port: u16,
    #[serde(default = "Config::default_unit")]
    pub unit: u8,
    #[serde(default = "Config::default_protocol")]
    pub protocol: Protocol,
    pub site_code: Option<String>,

    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default, rename = "timeout_ms")]
    pub timeout: Option<Duration>,

    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default, rename = "retry_delay_ms")]
    pub retry_delay: Option<Duration>,

    #[serde_as(as = "Option<DurationMilliSeconds<u64>>")]
    #[serde(default, rename = "poll_interval_ms")]
    pub poll_interval: Option<Duration>,
}

impl DeviceConfig {
    pub fn to_device(&self, poller: &Poller) -> Device {
        Device {
            id: self.id,
            name: self.name.clone(),
            device_type: self.device_type,
            host: self.host.clone(),
            port: self.port,
            unit: self.unit,
            protocol: self.protocol,
            site_code: self.site_code.clone(),
            timeout: self.timeout.unwrap_or_else(|| poller.timeout()),
            retry_delay: self.retry_delay.unwrap_or_else(|| poller.retry_delay()),
            poll_interval: self.poll_interval.unwrap_or_else(|| poller.poll_interval()),
        }
    }
} // }}}

#[derive(Clone, Debug)]
pub struct ConfigWrapper {
    config: Arc<Mutex<Config>>,
    /// Set when loaded from disk, so the device list can be re-read.
    file: Option<String>,
}

impl ConfigWrapper {
    pub fn new(file: String) -> Result<Self> {
        let config = Config::new(file.clone())?;
        Ok(Self {
            file: Some(file),
            ..Self::from_config(config)
        })
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
            file: None,
        }
    }

    /// Re-reads `devices` from the config file. Everything else keeps its
    /// startup value. A file that no longer parses leaves the current list
    /// in place.
    pub fn reload_devices(&self) -> Result<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };

        let fresh = Config::new(file.clone())?;
        info!("reloaded {} devices from {}", fresh.devices.len(), file);
        self.set_devices(fresh.devices);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Config> {
        self.config.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn loglevel(&self) -> String {
        self.lock().loglevel.clone()
    }

    pub fn redis(&self) -> Redis {
        self.lock().redis.clone()
    }

    pub fn database(&self) -> Option<Database> {
        self.lock().database.clone().filter(|d| d.enabled())
    }

    pub fn poller(&self) -> Poller {
        self.lock().poller.clone()
    }

    pub fn commands(&self) -> Commands {
        self.lock().commands.clone()
    }

    pub fn devices(&self) -> Vec<DeviceConfig> {
        self.lock().devices.clone()
    }

    pub fn set_devices(&self, new: Vec<DeviceConfig>) {
        self.lock().devices = new;
    }
}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        info!("reading configuration from {}", file);
        let content = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("error reading {}: {}", file, err))?;

        let config = Self::from_yaml(&content)?;

        info!("  redis: {}", if config.redis.enabled { config.redis.url.as_str() } else { "disabled" });
        match &config.database {
            Some(db) if db.enabled => info!("  database: {}", db.url),
            _ => info!("  database: disabled, {} static devices", config.devices.len()),
        }
        info!("  poll interval: {:?}", config.poller.poll_interval());
        info!("  log level: {}", config.loglevel);

        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.redis.enabled {
            if let Err(e) = url::Url::parse(&self.redis.url) {
                bail!("invalid redis url {}: {}", self.redis.url, e);
            }
        }

        if let Some(db) = &self.database {
            if db.enabled {
                let url = url::Url::parse(&db.url)
                    .map_err(|e| anyhow!("invalid database url {}: {}", db.url, e))?;
                if !matches!(url.scheme(), "sqlite" | "postgres" | "postgresql") {
                    bail!("unsupported database {}", db.url);
                }
            }
        }

        if self.commands.unlock_register.is_some() != self.commands.unlock_value.is_some() {
            bail!("commands.unlock_register and commands.unlock_value must be set together");
        }

        if self.poller.poll_interval() == Duration::ZERO {
            bail!("poller.poll_interval_ms must be positive");
        }
        if self.poller.timeout() == Duration::ZERO {
            bail!("poller.timeout_ms must be positive");
        }

        let mut ids = HashSet::new();
        for (i, device) in self.devices.iter().enumerate() {
            if !ids.insert(device.id) {
                bail!("devices[{}]: duplicate id {}", i, device.id);
            }
            if device.host.is_empty() {
                bail!("devices[{}].host cannot be empty", i);
            }
            if device.port == 0 {
                bail!("devices[{}].port must be between 1 and 65535", i);
            }
            if device.unit == 0 || device.unit > 247 {
                bail!("devices[{}].unit must be between 1 and 247", i);
            }
            if device.timeout == Some(Duration::ZERO) {
                bail!("devices[{}].timeout_ms must be positive", i);
            }
        }

        Ok(())
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_redis_url() -> String {
        "redis://127.0.0.1:6379".to_string()
    }

    fn default_modbus_port() -> u16 {
        502
    }

    fn default_unit() -> u8 {
        1
    }

    fn default_protocol() -> Protocol {
        Protocol::Tcp
    }
}
