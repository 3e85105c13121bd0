use crate::prelude::*;
use crate::alarms::{analysis, capture, AlarmEvent, EventKind};

use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Remembers the last raw value of every alarm field per device and turns
/// bit flips into [`AlarmEvent`]s.
///
/// A field seen for the first time only seeds state, so a fresh detector
/// does not report every already-active alarm as new. State for a device can
/// instead be rebuilt with [`restore`](Self::restore).
#[derive(Debug, Default)]
pub struct BitTransitionDetector {
    state: HashMap<DeviceId, HashMap<&'static str, i64>>,
}

impl BitTransitionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process(&mut self, snapshot: &Snapshot) -> Vec<AlarmEvent> {
        let mut events = Vec::new();

        if !snapshot.online {
            return events;
        }

        let family = snapshot.device_type.family();
        let table = family.alarm_table();
        let occurred_at = occurred_at(snapshot);
        let state = self.state.entry(snapshot.device_id).or_default();

        for &field in table.fields {
            let Some(current) = snapshot.fields.get(field).and_then(Value::as_i64) else {
                continue;
            };

            if let Some(previous) = state.insert(field, current) {
                if previous == current {
                    continue;
                }
                for definition in table.for_field(field) {
                    let kind = match (definition.is_set(previous), definition.is_set(current)) {
                        (false, true) => EventKind::Appeared,
                        (true, false) => EventKind::Cleared,
                        _ => continue,
                    };
                    events.push(AlarmEvent {
                        kind,
                        device_id: snapshot.device_id,
                        device_type: snapshot.device_type,
                        definition,
                        occurred_at,
                        metrics: None,
                        analysis: None,
                    });
                }
            }
        }

        if events.iter().any(|e| e.kind == EventKind::Appeared) {
            let metrics = capture::capture(family, &snapshot.fields);
            for event in events.iter_mut().filter(|e| e.kind == EventKind::Appeared) {
                event.analysis = Some(analysis::analyze(event.definition, &metrics));
                event.metrics = Some(metrics.clone());
            }
        }

        events
    }

    /// Resets a device to "these alarms are active, nothing else is". Every
    /// alarm field of the family is recorded, so alarms that cleared while
    /// nobody was watching are reported as cleared on the next snapshot.
    pub fn restore(&mut self, device_id: DeviceId, family: Family, active_codes: &[&str]) {
        let table = family.alarm_table();
        let mut fields: HashMap<&'static str, i64> =
            table.fields.iter().map(|f| (*f, 0)).collect();

        for code in active_codes {
            match table.by_code(code) {
                Some(definition) => {
                    *fields.entry(definition.field).or_default() |= 1 << definition.bit;
                }
                None => warn!("device {}: unknown active alarm code {}", device_id, code),
            }
        }

        self.state.insert(device_id, fields);
    }

    pub fn forget(&mut self, device_id: DeviceId) {
        self.state.remove(&device_id);
    }

    pub fn value(&self, device_id: DeviceId, field: &str) -> Option<i64> {
        self.state.get(&device_id)?.get(field).copied()
    }
}

fn occurred_at(snapshot: &Snapshot) -> DateTime<Utc> {
    snapshot
        .fields
        .get("controller_time")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(snapshot.timestamp)
}
