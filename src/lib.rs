pub mod alarms;
pub mod channels;
pub mod commands;
pub mod config;
pub mod database;
pub mod device;
pub mod error;
pub mod modbus;
pub mod options;
pub mod poller;
pub mod prelude;
pub mod reader;
pub mod redis_store;
pub mod register_map;
pub mod snapshot;
pub mod transport;

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

use crate::prelude::*;
use crate::alarms::AlarmMonitor;
use crate::database::Database;
use crate::poller::{DeviceSource, Poller, StaticDevices};
use crate::redis_store::RedisStore;

use std::sync::Arc;
use std::time::Duration;

/// Runs the engine until ctrl-c or the optional runtime limit.
///
/// Start order: database (device list, active alarms), alarm monitor and
/// redis consumers, then the poller. Shutdown goes the other way: the poller
/// stops its workers and announces shutdown on its output channel, which
/// ends the consumers.
pub async fn app(options: Options, config: ConfigWrapper) -> Result<()> {
    info!("smartgen-bridge {} starting", CARGO_PKG_VERSION);

    let channels = Channels::new();

    let database = match config.database() {
        Some(db_config) => {
            let database = Database::new(db_config, config.poller());
            database.start().await?;
            Some(database)
        }
        None => None,
    };

    let source: Arc<dyn DeviceSource> = match &database {
        Some(database) => Arc::new(database.clone()),
        None => Arc::new(StaticDevices::new(config.clone())),
    };

    let mut monitor = AlarmMonitor::new(channels.clone());
    if let Some(database) = &database {
        match database.active_alarms().await {
            Ok(active) => monitor.restore(&active),
            Err(err) => warn!("could not load active alarms, starting fresh: {}", err),
        }
    }

    let poller = Arc::new(Poller::new(
        config.clone(),
        channels.clone(),
        source,
        transport::network_connector(config.clone()),
    ));
    // consumers subscribe here, before the poller can publish anything
    let redis = RedisStore::new(config.clone(), channels.clone());

    let monitor_handle = tokio::spawn(async move {
        if let Err(e) = monitor.start().await {
            error!("alarm monitor failed: {}", e);
        }
    });
    let redis_handle = tokio::spawn(async move {
        if let Err(e) = redis.start().await {
            error!("redis task failed: {}", e);
        }
    });

    let poller_clone = poller.clone();
    let mut poller_handle = tokio::spawn(async move {
        if let Err(e) = poller_clone.start().await {
            error!("poller failed: {}", e);
        }
    });

    let poller_done = tokio::select! {
        _ = shutdown_signal(options.runtime) => false,
        _ = &mut poller_handle => true,
    };

    info!("stopping");
    if !poller_done {
        poller.stop();
        if let Err(e) = poller_handle.await {
            error!("error waiting for poller task: {}", e);
        }
    }
    // a poller that failed never announced shutdown
    let _ = channels
        .from_poller
        .send(crate::poller::ChannelData::Shutdown);

    if let Err(e) = monitor_handle.await {
        error!("error waiting for alarm monitor task: {}", e);
    }
    if let Err(e) = redis_handle.await {
        error!("error waiting for redis task: {}", e);
    }

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal(runtime: Option<u64>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    match runtime {
        Some(secs) => tokio::select! {
            _ = ctrl_c => info!("ctrl-c received"),
            _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                info!("runtime limit of {}s reached", secs)
            }
        },
        None => {
            ctrl_c.await;
            info!("ctrl-c received");
        }
    }
}
