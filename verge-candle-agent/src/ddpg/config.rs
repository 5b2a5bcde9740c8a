//! Configuration of DDPG agent.
use crate::{noise::GaussianNoiseConfig, opt::OptimizerConfig, validate, Device};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use verge_core::AgentError;

/// Configuration of [`Ddpg`](super::Ddpg).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct DdpgConfig {
    /// Dimension of states.
    pub state_dim: usize,

    /// Dimension of actions.
    pub action_dim: usize,

    /// Units of the hidden layers of the actor and the critic.
    pub hidden_layers: Vec<usize>,

    /// Optimizer of the actor.
    pub actor_opt: OptimizerConfig,

    /// Optimizer of the critic.
    pub critic_opt: OptimizerConfig,

    /// Discount factor.
    pub gamma: f64,

    /// Soft update rate of the target networks.
    pub tau: f64,

    pub batch_size: usize,

    /// Capacity of the replay buffer.
    pub buffer_size: usize,

    /// No learning happens during the first `warm_up` steps.
    pub warm_up: usize,

    /// Learning is triggered every this number of steps.
    pub update_every_iterations: usize,

    /// Number of learning calls per trigger.
    pub number_updates: usize,

    /// Bounds `(action_min, action_max)` of actions.
    pub clip: (f32, f32),

    /// Exploration noise.
    pub noise: GaussianNoiseConfig,

    pub device: Device,

    /// Seed of the replay buffer sampling.
    pub seed: u64,
}

impl Default for DdpgConfig {
    fn default() -> Self {
        Self {
            state_dim: 0,
            action_dim: 0,
            hidden_layers: vec![128, 128],
            actor_opt: OptimizerConfig::default(),
            critic_opt: OptimizerConfig::default(),
            gamma: 0.99,
            tau: 0.02,
            batch_size: 64,
            buffer_size: 1_000_000,
            warm_up: 0,
            update_every_iterations: 1,
            number_updates: 1,
            clip: (-1.0, 1.0),
            noise: GaussianNoiseConfig::default(),
            device: Device::Cpu,
            seed: 42,
        }
    }
}

impl DdpgConfig {
    /// Default configuration for the given dimensions.
    pub fn new(state_dim: usize, action_dim: usize) -> Self {
        Self {
            state_dim,
            action_dim,
            ..Self::default()
        }
    }

    /// Sets the units of the hidden layers.
    pub fn hidden_layers(mut self, v: Vec<usize>) -> Self {
        self.hidden_layers = v;
        self
    }

    /// Sets the learning rate of the actor.
    pub fn actor_lr(mut self, v: f64) -> Self {
        self.actor_opt = self.actor_opt.learning_rate(v);
        self
    }

    /// Sets the learning rate of the critic.
    pub fn critic_lr(mut self, v: f64) -> Self {
        self.critic_opt = self.critic_opt.learning_rate(v);
        self
    }

    /// Uses AdamW with the given weight decay for the actor.
    pub fn actor_lr_decay(mut self, v: f64) -> Self {
        self.actor_opt = OptimizerConfig::adamw(self.actor_opt.lr(), v);
        self
    }

    /// Uses AdamW with the given weight decay for the critic.
    pub fn critic_lr_decay(mut self, v: f64) -> Self {
        self.critic_opt = OptimizerConfig::adamw(self.critic_opt.lr(), v);
        self
    }

    /// Sets the optimizer of the actor.
    pub fn actor_opt(mut self, v: OptimizerConfig) -> Self {
        self.actor_opt = v;
        self
    }

    /// Sets the optimizer of the critic.
    pub fn critic_opt(mut self, v: OptimizerConfig) -> Self {
        self.critic_opt = v;
        self
    }

    /// Discount factor.
    pub fn gamma(mut self, v: f64) -> Self {
        self.gamma = v;
        self
    }

    /// Soft update rate.
    pub fn tau(mut self, v: f64) -> Self {
        self.tau = v;
        self
    }

    /// Batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Capacity of the replay buffer.
    pub fn buffer_size(mut self, v: usize) -> Self {
        self.buffer_size = v;
        self
    }

    /// Number of steps without learning.
    pub fn warm_up(mut self, v: usize) -> Self {
        self.warm_up = v;
        self
    }

    /// Interval of learning in steps.
    pub fn update_every_iterations(mut self, v: usize) -> Self {
        self.update_every_iterations = v;
        self
    }

    /// Number of learning calls per trigger.
    pub fn number_updates(mut self, v: usize) -> Self {
        self.number_updates = v;
        self
    }

    /// Bounds of actions.
    pub fn clip(mut self, min: f32, max: f32) -> Self {
        self.clip = (min, max);
        self
    }

    /// Exploration noise.
    pub fn noise(mut self, v: GaussianNoiseConfig) -> Self {
        self.noise = v;
        self
    }

    /// Device of the networks.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Seed of the replay buffer.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Checks the hyperparameters.
    pub fn validate(&self) -> Result<(), AgentError> {
        validate::dims(self.state_dim, self.action_dim, &self.hidden_layers)?;
        validate::gamma_tau(self.gamma, self.tau)?;
        validate::schedule(
            self.batch_size,
            self.buffer_size,
            self.update_every_iterations,
            self.number_updates,
        )?;
        validate::clip(self.clip)?;
        self.actor_opt.validate("actor")?;
        self.critic_opt.validate("critic")?;
        self.noise.validate()
    }

    /// Constructs [`DdpgConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DdpgConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_serde_ddpg_config() -> Result<()> {
        let config = DdpgConfig::new(3, 1)
            .hidden_layers(vec![64, 32])
            .actor_lr_decay(1e-4)
            .tau(0.05)
            .clip(-2.0, 2.0);

        let dir = TempDir::new("ddpg_config")?;
        let path = dir.path().join("ddpg_config.yaml");
        config.save(&path)?;
        let config_ = DdpgConfig::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(DdpgConfig::new(3, 1).validate().is_ok());
        assert!(DdpgConfig::default().validate().is_err());
        assert!(DdpgConfig::new(3, 1).tau(0.0).validate().is_err());
        assert!(DdpgConfig::new(3, 1).actor_lr(-1.0).validate().is_err());
        assert!(DdpgConfig::new(3, 1).clip(1.0, -1.0).validate().is_err());
        assert!(DdpgConfig::new(3, 1)
            .batch_size(8)
            .buffer_size(4)
            .validate()
            .is_err());
    }
}
