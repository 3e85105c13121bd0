use crate::prelude::*;
use crate::poller::ChannelData as Poller;

use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

pub const METRICS_CHANNEL: &str = "metrics:updates";
pub const RELOAD_CHANNEL: &str = "poller:reload";
pub const ALARMS_CHANNEL: &str = "alarms:events";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const RESUBSCRIBE_DELAY: Duration = Duration::from_secs(2);

pub fn metrics_key(device_id: DeviceId) -> String {
    format!("device:{}:metrics", device_id)
}

/// Mirrors poller output into Redis: the latest snapshot per device under an
/// expiring key, every snapshot and alarm event on a pub/sub channel. Also
/// turns messages on `poller:reload` into poller reloads.
///
/// Channel subscriptions are taken in `new`, before any snapshot can be
/// published.
pub struct RedisStore {
    config: ConfigWrapper,
    channels: Channels,
    snapshots: broadcast::Receiver<Poller>,
    events: broadcast::Receiver<alarms::ChannelData>,
    shutdown: broadcast::Receiver<Poller>,
}

impl RedisStore {
    pub fn new(config: ConfigWrapper, channels: Channels) -> Self {
        Self {
            config,
            snapshots: channels.from_poller.subscribe(),
            events: channels.to_alarm_events.subscribe(),
            shutdown: channels.from_poller.subscribe(),
            channels,
        }
    }

    pub async fn start(self) -> Result<()> {
        let Self {
            config,
            channels,
            snapshots,
            events,
            shutdown,
        } = self;

        let config = config.redis();
        if !config.enabled() {
            info!("redis disabled, skipping");
            return Ok(());
        }

        info!("initializing redis at {}", config.url());

        let client = redis::Client::open(config.url())?;
        let conn = tokio::time::timeout(CONNECT_TIMEOUT, ConnectionManager::new(client.clone()))
            .await
            .map_err(|_| anyhow!("redis connection timeout after {:?}", CONNECT_TIMEOUT))??;

        futures::try_join!(
            Self::snapshot_sender(snapshots, conn.clone(), config.snapshot_ttl()),
            Self::alarm_sender(events, conn),
            Self::reload_listener(&channels, shutdown, client),
        )?;

        info!("redis loop exiting");

        Ok(())
    }

    async fn snapshot_sender(
        mut receiver: broadcast::Receiver<Poller>,
        mut conn: ConnectionManager,
        ttl: u64,
    ) -> Result<()> {
        loop {
            match receiver.recv().await {
                Ok(Poller::Snapshot(snapshot)) => {
                    if let Err(err) = Self::store(&mut conn, &snapshot, ttl).await {
                        error!("redis: storing snapshot of device {} failed: {}", snapshot.device_id, err);
                    }
                }
                Ok(Poller::Removed(device_id)) => {
                    let result: redis::RedisResult<i64> = conn.del(metrics_key(device_id)).await;
                    if let Err(err) = result {
                        error!("redis: deleting snapshot of device {} failed: {}", device_id, err);
                    }
                }
                Ok(Poller::Shutdown) => break,
                Ok(Poller::Reload) => {}
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("redis: {} snapshots dropped", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        Ok(())
    }

    async fn store(conn: &mut ConnectionManager, snapshot: &Snapshot, ttl: u64) -> Result<()> {
        let json = snapshot.to_json()?;
        let _: () = conn.set_ex(metrics_key(snapshot.device_id), &json, ttl).await?;
        let _: i64 = conn.publish(METRICS_CHANNEL, &json).await?;
        trace!("redis: stored snapshot of device {}", snapshot.device_id);
        Ok(())
    }

    async fn alarm_sender(
        mut receiver: broadcast::Receiver<alarms::ChannelData>,
        mut conn: ConnectionManager,
    ) -> Result<()> {
        use alarms::ChannelData::*;

        loop {
            match receiver.recv().await {
                Ok(Event(event)) => {
                    let json = serde_json::to_string(&event)?;
                    let result: redis::RedisResult<i64> = conn.publish(ALARMS_CHANNEL, &json).await;
                    if let Err(err) = result {
                        error!("redis: publishing alarm {} failed: {}", event.code(), err);
                    }
                }
                Ok(Shutdown) => break,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("redis: {} alarm events dropped", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        Ok(())
    }

    /// Any message on the reload channel triggers a poller reload. The
    /// subscription is re-established when the connection drops.
    async fn reload_listener(
        channels: &Channels,
        mut shutdown: broadcast::Receiver<Poller>,
        client: redis::Client,
    ) -> Result<()> {
        loop {
            tokio::select! {
                result = Self::listen(channels, &client) => {
                    if let Err(err) = result {
                        warn!("redis: reload subscription lost: {}", err);
                    }
                }
                _ = wait_for_shutdown(&mut shutdown) => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(RESUBSCRIBE_DELAY) => {}
                _ = wait_for_shutdown(&mut shutdown) => break,
            }
        }

        Ok(())
    }

    async fn listen(channels: &Channels, client: &redis::Client) -> Result<()> {
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(RELOAD_CHANNEL).await?;
        info!("redis: listening for reloads on {}", RELOAD_CHANNEL);

        let mut messages = pubsub.on_message();
        while let Some(message) = messages.next().await {
            let payload: String = message.get_payload().unwrap_or_default();
            info!("redis: reload requested ({})", payload);
            let _ = channels.to_poller.send(Poller::Reload);
        }

        bail!("subscription stream ended")
    }
}

async fn wait_for_shutdown(receiver: &mut broadcast::Receiver<Poller>) {
    loop {
        match receiver.recv().await {
            Ok(Poller::Shutdown) | Err(broadcast::error::RecvError::Closed) => return,
            _ => {}
        }
    }
}
