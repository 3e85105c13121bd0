mod common;
use common::*;

use smartgen_bridge::alarms::ActiveAlarm;
use smartgen_bridge::database::Database;
use smartgen_bridge::poller::DeviceSource;
use std::time::Duration;

const ROWS: &[&str] = &[
    "INSERT INTO sites (id, code, name) VALUES (1, 'SITE-1', 'North plant')",
    "INSERT INTO devices (id, site_id, name, device_type, ip_address, port, slave_id, protocol, is_active)
     VALUES (1, 1, 'genset', 'generator', '10.0.0.10', 502, 1, 'tcp', 1)",
    "INSERT INTO devices (id, site_id, name, device_type, ip_address, port, slave_id, protocol, is_active,
                          modbus_timeout_ms, retry_delay_ms, poll_interval_ms)
     VALUES (2, NULL, 'ats', 'ats', '10.0.0.20', 8899, 3, 'rtu_over_tcp', 1, 4000, 0, NULL)",
    "INSERT INTO devices (id, site_id, name, device_type, ip_address, is_active)
     VALUES (3, 1, 'retired', 'generator', '10.0.0.30', 0)",
    "INSERT INTO devices (id, site_id, name, device_type, ip_address, is_active)
     VALUES (4, 1, 'pump', 'pump', '10.0.0.40', 1)",
    "INSERT INTO devices (id, site_id, name, device_type, ip_address, port, is_active)
     VALUES (5, 1, 'bad port', 'generator', '10.0.0.50', 70000, 1)",
    "INSERT INTO alarm_events (device_id, device_type, alarm_code, is_active)
     VALUES (1, 'generator', 'G_SD_0_0', 1)",
    "INSERT INTO alarm_events (device_id, device_type, alarm_code, is_active)
     VALUES (1, 'generator', 'G_WN_0_1', 0)",
    "INSERT INTO alarm_events (device_id, device_type, alarm_code, is_active)
     VALUES (2, 'ats', 'M008', 1)",
];

async fn database(dir: &tempfile::TempDir) -> Database {
    let url = format!("sqlite://{}/smartgen.db?mode=rwc", dir.path().display());
    let config = Config::from_yaml(&format!("database:\n  url: {}\n", url)).unwrap();
    let config = ConfigWrapper::from_config(config);

    let database = Database::new(config.database().unwrap(), config.poller());
    database.start().await.unwrap();

    let pool = database.connection().unwrap();
    for sql in ROWS {
        sqlx::query(sql).execute(&pool).await.unwrap();
    }

    database
}

#[tokio::test]
async fn loads_active_devices() {
    common_setup();

    let dir = tempfile::tempdir().unwrap();
    let database = database(&dir).await;

    let devices = database.load_devices().await.unwrap();
    let ids: Vec<DeviceId> = devices.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![1, 2]);

    let generator = &devices[0];
    assert_eq!(generator.name, "genset");
    assert_eq!(generator.device_type, DeviceType::Generator);
    assert_eq!(generator.host, "10.0.0.10");
    assert_eq!(generator.site_code.as_deref(), Some("SITE-1"));
    assert_eq!(generator.timeout, Duration::from_secs(2));

    let ats = &devices[1];
    assert_eq!(ats.protocol, Protocol::RtuOverTcp);
    assert_eq!(ats.port, 8899);
    assert_eq!(ats.unit, 3);
    assert_eq!(ats.site_code, None);
    assert_eq!(ats.timeout, Duration::from_millis(4000));
    // zero and null fall back to the poller defaults
    assert_eq!(ats.retry_delay, Duration::from_secs(5));
    assert_eq!(ats.poll_interval, Duration::from_secs(2));

    // through the poller's view
    let source: &dyn DeviceSource = &database;
    assert_eq!(source.load_devices().await.unwrap(), devices);
}

#[tokio::test]
async fn loads_active_alarms() {
    common_setup();

    let dir = tempfile::tempdir().unwrap();
    let database = database(&dir).await;

    assert_eq!(
        database.active_alarms().await.unwrap(),
        vec![
            ActiveAlarm {
                device_id: 1,
                device_type: DeviceType::Generator,
                code: "G_SD_0_0".to_string(),
            },
            ActiveAlarm {
                device_id: 2,
                device_type: DeviceType::Ats,
                code: "M008".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn migrations_are_repeatable() {
    common_setup();

    let dir = tempfile::tempdir().unwrap();
    let first = database(&dir).await;
    drop(first);

    let url = format!("sqlite://{}/smartgen.db", dir.path().display());
    let config = ConfigWrapper::from_config(
        Config::from_yaml(&format!("database:\n  url: {}\n", url)).unwrap(),
    );
    let again = Database::new(config.database().unwrap(), config.poller());
    again.start().await.unwrap();
    assert_eq!(again.load_devices().await.unwrap().len(), 2);
}

#[test]
fn not_connected() {
    let config = ConfigWrapper::from_config(
        Config::from_yaml("database:\n  url: sqlite://nowhere.db\n").unwrap(),
    );
    let database = Database::new(config.database().unwrap(), config.poller());
    assert!(database.connection().is_err());
}
