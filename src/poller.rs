use crate::prelude::*;
use crate::reader::Reader;
use crate::transport::Connector;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;

#[derive(Clone, Debug, PartialEq)]
pub enum ChannelData {
    /// Outcome of one poll cycle.
    Snapshot(Snapshot),
    /// Device left the poll set; its published snapshot is stale.
    Removed(DeviceId),
    /// Re-read the device list.
    Reload,
    Shutdown,
}

/// Where the poll set comes from.
#[async_trait]
pub trait DeviceSource: Send + Sync {
    async fn load_devices(&self) -> Result<Vec<Device>>;
}

/// The static `devices:` list of the config file.
pub struct StaticDevices {
    config: ConfigWrapper,
}

impl StaticDevices {
    pub fn new(config: ConfigWrapper) -> Self {
        Self { config }
    }
}

#[async_trait]
impl DeviceSource for StaticDevices {
    async fn load_devices(&self) -> Result<Vec<Device>> {
        if let Err(err) = self.config.reload_devices() {
            warn!("keeping current device list: {}", err);
        }

        let poller = self.config.poller();
        Ok(self
            .config
            .devices()
            .iter()
            .map(|d| d.to_device(&poller))
            .collect())
    }
}

/// What a reconcile pass changed, by device id.
#[derive(Debug, Default, PartialEq)]
pub struct Reconciled {
    pub added: Vec<DeviceId>,
    pub removed: Vec<DeviceId>,
    pub restarted: Vec<DeviceId>,
}

impl Reconciled {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.restarted.is_empty()
    }
}

struct Worker {
    device: Device,
    reader: Arc<Reader>,
    handle: JoinHandle<()>,
}

/// Runs one poll task per device and keeps the set in line with the device
/// source. Snapshots go out on `channels.from_poller`; `Reload` and
/// `Shutdown` come in on `channels.to_poller`.
pub struct Poller {
    config: ConfigWrapper,
    channels: Channels,
    source: Arc<dyn DeviceSource>,
    connector: Connector,
    workers: Mutex<HashMap<DeviceId, Worker>>,
}

impl Poller {
    pub fn new(
        config: ConfigWrapper,
        channels: Channels,
        source: Arc<dyn DeviceSource>,
        connector: Connector,
    ) -> Self {
        Self {
            config,
            channels,
            source,
            connector,
            workers: Mutex::new(HashMap::new()),
        }
    }

    fn workers(&self) -> MutexGuard<'_, HashMap<DeviceId, Worker>> {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn start(&self) -> Result<()> {
        let mut receiver = self.channels.to_poller.subscribe();

        let initial = self.reconcile().await?;
        info!("poller started with {} devices", initial.added.len());

        loop {
            match receiver.recv().await {
                Ok(ChannelData::Reload) => match self.reconcile().await {
                    Ok(changes) if changes.is_empty() => debug!("reload: no changes"),
                    Ok(changes) => info!(
                        "reload: added {:?} removed {:?} restarted {:?}",
                        changes.added, changes.removed, changes.restarted
                    ),
                    Err(err) => error!("reload failed, keeping current devices: {}", err),
                },
                Ok(ChannelData::Shutdown) => break,
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        self.stop_all().await;
        let _ = self.channels.from_poller.send(ChannelData::Shutdown);
        info!("poller exiting");

        Ok(())
    }

    pub fn stop(&self) {
        let _ = self.channels.to_poller.send(ChannelData::Shutdown);
    }

    pub fn reload(&self) {
        let _ = self.channels.to_poller.send(ChannelData::Reload);
    }

    /// Command entry point: the reader of a running device.
    pub fn reader(&self, device_id: DeviceId) -> Option<Arc<Reader>> {
        self.workers().get(&device_id).map(|w| w.reader.clone())
    }

    pub fn devices(&self) -> Vec<Device> {
        let mut devices: Vec<Device> = self.workers().values().map(|w| w.device.clone()).collect();
        devices.sort_by_key(|d| d.id);
        devices
    }

    /// Brings the running workers in line with the device source. Devices
    /// whose connection or polling parameters are unchanged keep running.
    pub async fn reconcile(&self) -> Result<Reconciled> {
        let devices = self.source.load_devices().await?;
        let mut wanted: HashMap<DeviceId, Device> =
            devices.into_iter().map(|d| (d.id, d)).collect();

        let mut changes = Reconciled::default();
        let mut stale = Vec::new();

        {
            let mut workers = self.workers();

            let gone: Vec<DeviceId> = workers
                .keys()
                .filter(|id| !wanted.contains_key(id))
                .copied()
                .collect();
            for id in gone {
                if let Some(worker) = workers.remove(&id) {
                    info!("removing {}", worker.device);
                    worker.handle.abort();
                    stale.push(worker.reader);
                    changes.removed.push(id);
                }
            }

            let mut ids: Vec<DeviceId> = wanted.keys().copied().collect();
            ids.sort_unstable();
            for id in ids {
                let Some(device) = wanted.remove(&id) else {
                    continue;
                };

                match workers.get_mut(&id) {
                    Some(worker) if worker.device.requires_restart(&device) => {
                        info!("restarting {}", device);
                        worker.handle.abort();
                        stale.push(worker.reader.clone());
                        *worker = self.spawn(device);
                        changes.restarted.push(id);
                    }
                    Some(worker) => worker.device = device,
                    None => {
                        info!("adding {}", device);
                        workers.insert(id, self.spawn(device));
                        changes.added.push(id);
                    }
                }
            }
        }

        for reader in stale {
            reader.disconnect().await;
        }
        for id in &changes.removed {
            let _ = self.channels.from_poller.send(ChannelData::Removed(*id));
        }

        Ok(changes)
    }

    fn spawn(&self, device: Device) -> Worker {
        let poller = self.config.poller();
        let transport = (self.connector)(&device);
        let reader = Arc::new(Reader::new(
            device.clone(),
            transport,
            poller.lock_timeout(),
            poller.block_retries(),
        ));
        let handle = tokio::spawn(poll_loop(reader.clone(), self.channels.from_poller.clone()));

        Worker {
            device,
            reader,
            handle,
        }
    }

    async fn stop_all(&self) {
        let workers: Vec<Worker> = self.workers().drain().map(|(_, w)| w).collect();
        for worker in &workers {
            worker.handle.abort();
        }
        for worker in workers {
            worker.reader.disconnect().await;
        }
    }
}

async fn poll_loop(reader: Arc<Reader>, sender: broadcast::Sender<ChannelData>) {
    let device = reader.device().clone();
    debug!("{}: poll loop started", device);

    loop {
        let (snapshot, pause) = match reader.read_all().await {
            Ok(fields) => (Snapshot::online(&device, fields), device.poll_interval),
            Err(err) => {
                warn!("{}: offline: {}", device, err);
                if err.is_connectivity() {
                    reader.disconnect().await;
                    (Snapshot::offline(&device, &err), device.retry_delay)
                } else {
                    (Snapshot::offline(&device, &err), device.poll_interval)
                }
            }
        };

        let _ = sender.send(ChannelData::Snapshot(snapshot));
        tokio::time::sleep(pause).await;
    }
}
