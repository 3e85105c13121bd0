use crate::prelude::*;
use crate::alarms::ActiveAlarm;
use crate::poller::DeviceSource;

use async_trait::async_trait;
use sqlx::{any::AnyConnectOptions, any::AnyRow, Any, Pool, Row};
use std::sync::{Arc, RwLock};
use std::time::Duration;

enum DatabaseType {
    Postgres,
    SQLite,
}

/// Device list and active alarm records. The engine only reads; rows are
/// owned by the management side.
#[derive(Clone, Debug)]
pub struct Database {
    config: config::Database,
    poller: config::Poller,
    pool: Arc<RwLock<Option<Pool<Any>>>>,
}

impl Database {
    pub fn new(config: config::Database, poller: config::Poller) -> Self {
        Self {
            config,
            poller,
            pool: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        info!("initializing database");

        self.connect().await?;
        self.migrate().await?;

        Ok(())
    }

    fn database(&self) -> Result<DatabaseType> {
        let prefix: Vec<&str> = self.config.url().splitn(2, ':').collect();
        match prefix[0] {
            "sqlite" => Ok(DatabaseType::SQLite),
            "postgres" | "postgresql" => Ok(DatabaseType::Postgres),
            _ => Err(anyhow!("unsupported database {}", self.config.url())),
        }
    }

    async fn connect(&self) -> Result<()> {
        sqlx::any::install_default_drivers();

        let options = AnyConnectOptions::from_str(self.config.url())?;
        let pool = sqlx::any::AnyPoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;
        *self
            .pool
            .write()
            .map_err(|_| anyhow!("failed to acquire database write lock"))? = Some(pool);
        Ok(())
    }

    pub fn connection(&self) -> Result<Pool<Any>> {
        match &*self
            .pool
            .read()
            .map_err(|_| anyhow!("failed to acquire database read lock"))?
        {
            Some(pool) => Ok(pool.clone()),
            None => Err(anyhow!("database not connected")),
        }
    }

    async fn migrate(&self) -> Result<()> {
        use DatabaseType::*;

        let pool = self.connection()?;

        let migrator = match self.database()? {
            SQLite => sqlx::migrate!("db/migrations/sqlite"),
            Postgres => sqlx::migrate!("db/migrations/postgres"),
        };

        migrator.run(&pool).await?;

        Ok(())
    }

    /// Active devices. Rows that do not describe a pollable device are
    /// logged and skipped.
    pub async fn load_devices(&self) -> Result<Vec<Device>> {
        let pool = self.connection()?;

        let rows = sqlx::query(
            "SELECT d.id, d.name, d.device_type, d.ip_address, d.port, d.slave_id,
                    d.protocol, s.code AS site_code, d.modbus_timeout_ms,
                    d.retry_delay_ms, d.poll_interval_ms
             FROM devices d LEFT JOIN sites s ON s.id = d.site_id
             WHERE d.is_active
             ORDER BY d.id",
        )
        .fetch_all(&pool)
        .await?;

        let mut devices = Vec::with_capacity(rows.len());
        for row in rows {
            match self.device_from_row(&row) {
                Ok(device) => devices.push(device),
                Err(err) => warn!("skipping device row: {}", err),
            }
        }

        debug!("loaded {} devices from database", devices.len());
        Ok(devices)
    }

    fn device_from_row(&self, row: &AnyRow) -> Result<Device> {
        let id: i64 = row.try_get("id")?;
        let port: i64 = row.try_get("port")?;
        let unit: i64 = row.try_get("slave_id")?;
        let millis = |column: &str| -> Result<Option<Duration>> {
            let value: Option<i64> = row.try_get(column)?;
            Ok(value.filter(|ms| *ms > 0).map(|ms| Duration::from_millis(ms as u64)))
        };

        Ok(Device {
            id,
            name: row.try_get("name")?,
            device_type: DeviceType::from_str(&row.try_get::<String, _>("device_type")?)?,
            host: row.try_get("ip_address")?,
            port: u16::try_from(port).map_err(|_| anyhow!("device {}: bad port {}", id, port))?,
            unit: u8::try_from(unit).map_err(|_| anyhow!("device {}: bad unit {}", id, unit))?,
            protocol: Protocol::from_str(&row.try_get::<String, _>("protocol")?)?,
            site_code: row.try_get("site_code")?,
            timeout: millis("modbus_timeout_ms")?.unwrap_or_else(|| self.poller.timeout()),
            retry_delay: millis("retry_delay_ms")?.unwrap_or_else(|| self.poller.retry_delay()),
            poll_interval: millis("poll_interval_ms")?
                .unwrap_or_else(|| self.poller.poll_interval()),
        })
    }

    /// Alarms still open, used to seed the detector at startup.
    pub async fn active_alarms(&self) -> Result<Vec<ActiveAlarm>> {
        let pool = self.connection()?;

        let rows = sqlx::query(
            "SELECT device_id, device_type, alarm_code FROM alarm_events
             WHERE is_active ORDER BY device_id",
        )
        .fetch_all(&pool)
        .await?;

        let mut alarms = Vec::with_capacity(rows.len());
        for row in rows {
            let device_type: String = row.try_get("device_type")?;
            match DeviceType::from_str(&device_type) {
                Ok(device_type) => alarms.push(ActiveAlarm {
                    device_id: row.try_get("device_id")?,
                    device_type,
                    code: row.try_get("alarm_code")?,
                }),
                Err(err) => warn!("skipping active alarm: {}", err),
            }
        }

        Ok(alarms)
    }
}

#[async_trait]
impl DeviceSource for Database {
    async fn load_devices(&self) -> Result<Vec<Device>> {
        Database::load_devices(self).await
    }
}
