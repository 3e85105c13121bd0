use crate::prelude::*;
use crate::error::Error;
use crate::reader::{Reader, WriteVerification};
use crate::register_map::signed16;

use serde::Serialize;
use std::sync::Arc;

// HGM9520N: live P/Q percentages, then the setpoint registers.
const GEN_LIVE: (u16, u16) = (159, 4);
const GEN_P_SETPOINT: u16 = 4368;
const GEN_Q_SETPOINT: u16 = 4370;

// HGM9560 configuration registers.
const ATS_LOAD_MODE: u16 = 4351;
const ATS_P_SETPOINT: u16 = 4352;
const ATS_Q_SETPOINT: u16 = 4354;

pub const MAX_RAW: u16 = 1000;

const LOAD_MODES: [&str; 3] = ["Gen Control", "Mains Control", "Load Reception"];

pub fn load_mode_text(mode: u16) -> String {
    LOAD_MODES
        .get(mode as usize)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("unknown_{}", mode))
}

fn percent(raw: u16) -> f64 {
    signed16(raw) as f64 / 10.0
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "device_type", rename_all = "snake_case")]
pub enum PowerLimit {
    Generator {
        current_p_pct: f64,
        target_p_pct: f64,
        current_q_pct: f64,
        target_q_pct: f64,
        /// Setpoints as written, percent x 10.
        config_p_raw: i64,
        config_q_raw: i64,
    },
    Ats {
        load_mode: u16,
        load_mode_text: String,
        config_p_raw: u16,
        config_q_raw: u16,
    },
}

pub struct ReadPowerLimit {
    reader: Arc<Reader>,
}

impl ReadPowerLimit {
    pub fn new(reader: Arc<Reader>) -> Self {
        Self { reader }
    }

    pub async fn run(&self) -> Result<PowerLimit, Error> {
        match self.reader.device().device_type {
            DeviceType::Generator => {
                let batch = self.reader.read_registers_batch(&[GEN_LIVE]).await?;
                let regs = batch.first().map(Vec::as_slice).unwrap_or_default();
                let [current_p, target_p, current_q, target_q] = regs else {
                    return Err(Error::Decode {
                        index: 3,
                        len: regs.len(),
                    });
                };

                Ok(PowerLimit::Generator {
                    current_p_pct: percent(*current_p),
                    target_p_pct: percent(*target_p),
                    current_q_pct: percent(*current_q),
                    target_q_pct: percent(*target_q),
                    config_p_raw: signed16(*target_p),
                    config_q_raw: signed16(*target_q),
                })
            }
            DeviceType::Ats => {
                let batch = self
                    .reader
                    .read_registers_batch(&[
                        (ATS_LOAD_MODE, 1),
                        (ATS_P_SETPOINT, 1),
                        (ATS_Q_SETPOINT, 1),
                    ])
                    .await?;
                let first = |i: usize| -> Result<u16, Error> {
                    batch
                        .get(i)
                        .and_then(|regs| regs.first())
                        .copied()
                        .ok_or(Error::Decode { index: i, len: batch.len() })
                };
                let load_mode = first(0)?;

                Ok(PowerLimit::Ats {
                    load_mode,
                    load_mode_text: load_mode_text(load_mode),
                    config_p_raw: first(1)?,
                    config_q_raw: first(2)?,
                })
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PowerLimitWrite {
    pub device_id: DeviceId,
    pub verifications: Vec<WriteVerification>,
    pub verified: bool,
}

/// Writes P and Q setpoints (percent x 10), plus the load mode on an ATS,
/// as one verified batch.
pub struct SetPowerLimit {
    reader: Arc<Reader>,
    unlock: Option<(u16, u16)>,
    p_raw: u16,
    q_raw: u16,
    load_mode: Option<u16>,
}

impl SetPowerLimit {
    /// Uses the unlock write from the `commands` config section.
    pub fn from_config(
        config: &ConfigWrapper,
        reader: Arc<Reader>,
        p_raw: u16,
        q_raw: u16,
        load_mode: Option<u16>,
    ) -> Self {
        Self::new(reader, config.commands().unlock(), p_raw, q_raw, load_mode)
    }

    pub fn new(
        reader: Arc<Reader>,
        unlock: Option<(u16, u16)>,
        p_raw: u16,
        q_raw: u16,
        load_mode: Option<u16>,
    ) -> Self {
        Self {
            reader,
            unlock,
            p_raw,
            q_raw,
            load_mode,
        }
    }

    pub fn writes(&self) -> Result<Vec<(u16, u16)>, Error> {
        if self.p_raw > MAX_RAW {
            return Err(Error::InvalidRequest(format!("p_raw {} outside 0..={}", self.p_raw, MAX_RAW)));
        }
        if self.q_raw > MAX_RAW {
            return Err(Error::InvalidRequest(format!("q_raw {} outside 0..={}", self.q_raw, MAX_RAW)));
        }

        match self.reader.device().device_type {
            DeviceType::Generator => {
                if self.load_mode.is_some() {
                    return Err(Error::InvalidRequest(
                        "load_mode only applies to ats devices".to_string(),
                    ));
                }
                Ok(vec![(GEN_P_SETPOINT, self.p_raw), (GEN_Q_SETPOINT, self.q_raw)])
            }
            DeviceType::Ats => {
                let mut writes = Vec::with_capacity(3);
                if let Some(mode) = self.load_mode {
                    if mode as usize >= LOAD_MODES.len() {
                        return Err(Error::InvalidRequest(format!(
                            "load_mode {} outside 0..={}",
                            mode,
                            LOAD_MODES.len() - 1
                        )));
                    }
                    writes.push((ATS_LOAD_MODE, mode));
                }
                writes.push((ATS_P_SETPOINT, self.p_raw));
                writes.push((ATS_Q_SETPOINT, self.q_raw));
                Ok(writes)
            }
        }
    }

    pub async fn run(&self) -> Result<PowerLimitWrite, Error> {
        let writes = self.writes()?;
        let device = self.reader.device();

        info!("{}: set power limit {:?}", device, writes);
        let verifications = self.reader.write_registers_batch(&writes, self.unlock).await?;
        let verified = verifications.iter().all(WriteVerification::verified);
        if !verified {
            warn!("{}: power limit written but not verified", device);
        }

        Ok(PowerLimitWrite {
            device_id: device.id,
            verifications,
            verified,
        })
    }
}
