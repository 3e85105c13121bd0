//! Declarative register maps.
//!
//! Each controller family is a fixed list of [`RegisterBlock`]s, each block an
//! ordered list of named [`Decode`] rules applied to the registers read in one
//! transaction. The tables are plain `'static` data shared by every reader.

pub mod hgm9520n;
pub mod hgm9560;

use crate::error::Error;

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel the controllers report for "no sensor / no data".
pub const NO_DATA: u16 = 32766;
/// Raw values at or above this (as unsigned) carry no measurement.
pub const NO_DATA_FLOOR: u16 = 32000;

pub type Fields = BTreeMap<String, Value>;

// Value {{{
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
} // }}}

// primitives {{{
pub fn signed16(raw: u16) -> i64 {
    raw as i16 as i64
}

/// Two registers, low word first.
pub fn unsigned32(lsb: u16, msb: u16) -> i64 {
    ((msb as i64) << 16) | lsb as i64
}

/// Two registers, low word first, two's complement.
pub fn signed32(lsb: u16, msb: u16) -> i64 {
    (((msb as u32) << 16) | lsb as u32) as i32 as i64
}

/// Sentinel or out-of-band magnitude.
pub fn is_no_data(raw: u16) -> bool {
    raw == NO_DATA || raw >= NO_DATA_FLOOR
}

/// The positive no-data band; negative readings are legitimate for signed
/// quantities.
fn is_signed_no_data(raw: u16) -> bool {
    raw == NO_DATA || (NO_DATA_FLOOR..=i16::MAX as u16).contains(&raw)
}

fn reg(regs: &[u16], index: usize) -> Result<u16, Error> {
    regs.get(index).copied().ok_or(Error::Decode {
        index,
        len: regs.len(),
    })
}

/// Applies a decimal factor without binary noise (0.1 -> divide by 10).
fn scale(raw: i64, factor: f64) -> Value {
    if factor == 1.0 {
        Value::Int(raw)
    } else if factor < 1.0 {
        Value::Float(raw as f64 / (1.0 / factor).round())
    } else {
        Value::Float(raw as f64 * factor)
    }
}

fn within(raw: u16, lo: i64, hi: i64) -> Option<i64> {
    if is_signed_no_data(raw) {
        return None;
    }
    let v = signed16(raw);
    (lo..=hi).contains(&v).then_some(v)
}
// }}}

// Decode {{{
pub const TEMPERATURE_RANGE: (i64, i64) = (-50, 200);
pub const LOAD_RANGE: (i64, i64) = (-50, 150);

/// How a field is derived from the registers of its block. Indices are
/// relative to the block start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decode {
    /// Single bit of one register.
    Bit(usize, u8),
    /// Register as is; codes and bitfields.
    Raw(usize),
    Scaled(usize, f64),
    Signed(usize, f64),
    /// Unsigned 32-bit pair starting at index (low word first).
    Wide(usize, f64),
    SignedWide(usize, f64),
    /// Unsigned measurement, null on sentinel.
    Measured(usize, f64),
    /// Unsigned measurement, null on sentinel or above the maximum.
    Bounded(usize, u16, f64),
    /// Signed degrees C within [`TEMPERATURE_RANGE`].
    Temperature(usize),
    /// Signed percent within [`LOAD_RANGE`].
    Load(usize),
}

impl Decode {
    pub fn apply(&self, regs: &[u16]) -> Result<Value, Error> {
        use Decode::*;

        Ok(match *self {
            Bit(i, bit) => Value::Bool(reg(regs, i)? & (1 << bit) != 0),
            Raw(i) => Value::Int(reg(regs, i)? as i64),
            Scaled(i, f) => scale(reg(regs, i)? as i64, f),
            Signed(i, f) => scale(signed16(reg(regs, i)?), f),
            Wide(i, f) => scale(unsigned32(reg(regs, i)?, reg(regs, i + 1)?), f),
            SignedWide(i, f) => scale(signed32(reg(regs, i)?, reg(regs, i + 1)?), f),
            Measured(i, f) => {
                let raw = reg(regs, i)?;
                if is_no_data(raw) {
                    Value::Null
                } else {
                    scale(raw as i64, f)
                }
            }
            Bounded(i, max, f) => {
                let raw = reg(regs, i)?;
                if raw == NO_DATA || raw > max {
                    Value::Null
                } else {
                    scale(raw as i64, f)
                }
            }
            Temperature(i) => {
                within(reg(regs, i)?, TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1).into()
            }
            Load(i) => within(reg(regs, i)?, LOAD_RANGE.0, LOAD_RANGE.1).into(),
        })
    }
} // }}}

// RegisterBlock {{{
#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub decode: Decode,
}

pub const fn field(name: &'static str, decode: Decode) -> Field {
    Field { name, decode }
}

/// A contiguous register range read in one transaction.
#[derive(Debug)]
pub struct RegisterBlock {
    pub name: &'static str,
    pub address: u16,
    pub count: u16,
    pub fields: &'static [Field],
}

impl RegisterBlock {
    /// Decodes every field; a failing rule yields null for that field only.
    pub fn decode_into(&self, regs: &[u16], out: &mut Fields) {
        for field in self.fields {
            let value = field.decode.apply(regs).unwrap_or_else(|err| {
                debug!("decode {}.{}: {}", self.name, field.name, err);
                Value::Null
            });
            out.insert(field.name.to_string(), value);
        }
    }

    pub fn decode(&self, regs: &[u16]) -> Fields {
        let mut out = Fields::new();
        self.decode_into(regs, &mut out);
        out
    }
} // }}}

// Label {{{
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fallback {
    /// "unknown"
    Unknown,
    /// "unknown_{code}"
    UnknownCode,
}

/// Human readable text for a status code field.
#[derive(Debug)]
pub struct Label {
    pub source: &'static str,
    pub target: &'static str,
    pub table: &'static [(i64, &'static str)],
    pub fallback: Fallback,
}

impl Label {
    pub fn text(&self, code: i64) -> String {
        match self.table.iter().find(|(c, _)| *c == code) {
            Some((_, text)) => text.to_string(),
            None => match self.fallback {
                Fallback::Unknown => "unknown".to_string(),
                Fallback::UnknownCode => format!("unknown_{}", code),
            },
        }
    }
} // }}}

/// All blocks and labels of one controller family.
#[derive(Debug)]
pub struct RegisterMap {
    pub name: &'static str,
    pub blocks: &'static [RegisterBlock],
    pub labels: &'static [Label],
}

impl RegisterMap {
    pub fn block(&self, name: &str) -> Option<&'static RegisterBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }

    /// Adds the text field of every label whose source field decoded.
    pub fn apply_labels(&self, fields: &mut Fields) {
        for label in self.labels {
            if let Some(code) = fields.get(label.source).and_then(Value::as_i64) {
                fields.insert(label.target.to_string(), Value::Text(label.text(code)));
            }
        }
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.blocks
            .iter()
            .flat_map(|b| b.fields.iter().map(|f| f.name))
    }
}
