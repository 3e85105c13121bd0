//! Alarm definitions, bit-transition detection and the monitor service that
//! turns published snapshots into alarm events.

pub mod analysis;
pub mod capture;
pub mod definitions;
pub mod detector;

use crate::prelude::*;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use detector::BitTransitionDetector;

// Severity {{{
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Shutdown,
    Trip,
    MainsTrip,
    Block,
    Warning,
    Indication,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shutdown => "shutdown",
            Self::Trip => "trip",
            Self::MainsTrip => "mains_trip",
            Self::Block => "block",
            Self::Warning => "warning",
            Self::Indication => "indication",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
} // }}}

/// One alarm bit of one register field.
#[derive(Debug, PartialEq, Serialize)]
pub struct AlarmDefinition {
    pub field: &'static str,
    pub bit: u8,
    pub code: &'static str,
    pub name: &'static str,
    pub severity: Severity,
}

impl AlarmDefinition {
    pub fn is_set(&self, value: i64) -> bool {
        value & (1 << self.bit) != 0
    }
}

/// Alarm bits of a controller family and the register fields that hold them.
#[derive(Debug)]
pub struct AlarmTable {
    pub definitions: &'static [AlarmDefinition],
    pub fields: &'static [&'static str],
}

impl AlarmTable {
    pub fn by_code(&self, code: &str) -> Option<&'static AlarmDefinition> {
        self.definitions.iter().find(|d| d.code == code)
    }

    pub fn for_field<'a>(
        &'a self,
        field: &'a str,
    ) -> impl Iterator<Item = &'static AlarmDefinition> + 'a {
        self.definitions.iter().filter(move |d| d.field == field)
    }
}

// AlarmEvent {{{
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Appeared,
    Cleared,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlarmEvent {
    pub kind: EventKind,
    pub device_id: DeviceId,
    pub device_type: DeviceType,
    pub definition: &'static AlarmDefinition,
    pub occurred_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<analysis::Analysis>,
}

impl AlarmEvent {
    pub fn code(&self) -> &'static str {
        self.definition.code
    }
} // }}}

#[derive(Clone, Debug)]
pub enum ChannelData {
    Event(Box<AlarmEvent>),
    Shutdown,
}

/// Persisted active alarm used to rebuild detector state at startup.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveAlarm {
    pub device_id: DeviceId,
    pub device_type: DeviceType,
    pub code: String,
}

/// Feeds every published snapshot through the detector and broadcasts the
/// resulting events on `channels.to_alarm_events`. Exits when the poller
/// announces shutdown, passing the shutdown on to event consumers.
///
/// Subscribes to the poller output on construction, so nothing published
/// between `new` and `start` is missed.
pub struct AlarmMonitor {
    channels: Channels,
    receiver: broadcast::Receiver<crate::poller::ChannelData>,
    detector: BitTransitionDetector,
}

impl AlarmMonitor {
    pub fn new(channels: Channels) -> Self {
        Self {
            receiver: channels.from_poller.subscribe(),
            channels,
            detector: BitTransitionDetector::new(),
        }
    }

    /// Rebuilds detector state from alarms still marked active.
    pub fn restore(&mut self, active: &[ActiveAlarm]) {
        let mut by_device: std::collections::BTreeMap<DeviceId, (DeviceType, Vec<&str>)> =
            Default::default();
        for alarm in active {
            by_device
                .entry(alarm.device_id)
                .or_insert_with(|| (alarm.device_type, Vec::new()))
                .1
                .push(alarm.code.as_str());
        }

        for (device_id, (device_type, codes)) in by_device {
            self.detector.restore(device_id, device_type.family(), &codes);
        }
        info!("restored alarm state for {} active alarms", active.len());
    }

    pub async fn start(&mut self) -> Result<()> {
        use crate::poller::ChannelData as Poller;

        info!("alarm monitor started");

        loop {
            match self.receiver.recv().await {
                Ok(Poller::Shutdown) => break,
                Ok(Poller::Reload) => {}
                Ok(Poller::Removed(device_id)) => {
                    debug!("device {} removed, dropping its alarm state", device_id);
                    self.detector.forget(device_id);
                }
                Ok(Poller::Snapshot(snapshot)) => {
                    for event in self.detector.process(&snapshot) {
                        info!(
                            "alarm {:?}: device {} {} {}",
                            event.kind,
                            event.device_id,
                            event.code(),
                            event.definition.name
                        );
                        let _ = self
                            .channels
                            .to_alarm_events
                            .send(ChannelData::Event(Box::new(event)));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("alarm monitor lagged, {} snapshots dropped", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }

        let _ = self.channels.to_alarm_events.send(ChannelData::Shutdown);
        info!("alarm monitor exiting");
        Ok(())
    }
}
