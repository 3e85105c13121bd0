mod common;
use common::*;

use smartgen_bridge::alarms::AlarmMonitor;
use smartgen_bridge::redis_store::RedisStore;
use std::time::Duration;

#[test]
fn consumers_subscribe_on_construction() {
    let channels = Channels::new();

    let _monitor = AlarmMonitor::new(channels.clone());
    assert_eq!(channels.from_poller.receiver_count(), 1);

    let _redis = RedisStore::new(Factory::config(), channels.clone());
    assert_eq!(channels.from_poller.receiver_count(), 3);
    assert_eq!(channels.to_alarm_events.receiver_count(), 1);
}

#[tokio::test]
async fn runs_until_the_time_limit() {
    common_setup();

    // nothing listens here
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let yaml = format!(
        r#"
redis:
  enabled: false
poller:
  poll_interval_ms: 100
  retry_delay_ms: 100
  timeout_ms: 200
devices:
  - id: 1
    name: genset
    device_type: generator
    host: 127.0.0.1
    port: {port}
  - id: 2
    name: ats
    device_type: ats
    host: 127.0.0.1
    port: {port}
    protocol: rtu_over_tcp
"#
    );
    let config = ConfigWrapper::from_config(Config::from_yaml(&yaml).unwrap());
    let options = Options {
        runtime: Some(1),
        ..Options::default()
    };

    tokio::time::timeout(Duration::from_secs(10), smartgen_bridge::app(options, config))
        .await
        .expect("app did not shut down")
        .unwrap();
}
