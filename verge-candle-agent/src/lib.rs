//! Off-policy actor-critic agents implemented with [candle](https://crates.io/crates/candle-core).
//!
//! * [`ddpg::Ddpg`] - deep deterministic policy gradient.
//! * [`sac::Sac`] - soft actor-critic with a double critic and automatic entropy tuning.
//! * [`agent::AnyAgent`] - either of them, selected by [`agent::AgentConfig`].
pub mod agent;
pub mod ddpg;
pub mod mlp;
pub mod model;
pub mod network;
pub mod noise;
pub mod opt;
pub mod policy;
pub mod sac;
pub mod util;
mod validate;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq)]
/// Device for using candle.
///
/// This enum is added because [`candle_core::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The main GPU device.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl Device {
    /// Creates the corresponding [`candle_core::Device`].
    pub fn to_candle(self) -> Result<candle_core::Device> {
        match self {
            Self::Cpu => Ok(candle_core::Device::Cpu),
            Self::Cuda(n) => Ok(candle_core::Device::new_cuda(n)?),
        }
    }
}
