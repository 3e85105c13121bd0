//! Operator commands built on the reader entry points. Every command runs
//! under the device lock, so a busy device surfaces as a retryable
//! [`Error::Busy`](crate::error::Error::Busy).

pub mod power_limit;

pub use power_limit::{PowerLimit, PowerLimitWrite, ReadPowerLimit, SetPowerLimit};
