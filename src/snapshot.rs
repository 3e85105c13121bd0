use crate::prelude::*;
use crate::register_map::Fields;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of one poll cycle for one device, as published.
///
/// Register fields are flattened into the top level of the JSON object next
/// to the bookkeeping keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub device_id: DeviceId,
    pub device_type: DeviceType,
    pub site_code: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub online: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Snapshot {
    pub fn online(device: &Device, fields: Fields) -> Self {
        Self {
            device_id: device.id,
            device_type: device.device_type,
            site_code: device.site_code.clone(),
            timestamp: Utc::now(),
            online: true,
            error: None,
            fields,
        }
    }

    pub fn offline(device: &Device, error: impl ToString) -> Self {
        Self {
            device_id: device.id,
            device_type: device.device_type,
            site_code: device.site_code.clone(),
            timestamp: Utc::now(),
            online: false,
            error: Some(error.to_string()),
            fields: Fields::new(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
