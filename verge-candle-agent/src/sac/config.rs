//! Configuration of SAC agent.
use crate::{opt::OptimizerConfig, validate, Device};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use verge_core::AgentError;

/// Configuration of [`Sac`](super::Sac).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct SacConfig {
    /// Dimension of states.
    pub state_dim: usize,

    /// Dimension of actions.
    pub action_dim: usize,

    /// Units of the hidden layers of the actor and the critics.
    pub hidden_layers: Vec<usize>,

    /// Optimizer of the actor and the policy standard deviation.
    pub actor_opt: OptimizerConfig,

    /// Optimizer of the double critic.
    pub critic_opt: OptimizerConfig,

    /// Initial entropy coefficient.
    pub alpha: f64,

    /// Learning rate of the entropy coefficient. Alpha is fixed if `None`.
    pub alpha_lr: Option<f64>,

    /// Initial standard deviation of the policy.
    pub init_std: f64,

    pub gamma: f64,

    /// Soft update rate of the target critic.
    pub tau: f64,

    pub batch_size: usize,

    /// Capacity of the replay buffer.
    pub buffer_size: usize,

    /// No learning happens during the first `warm_up` steps.
    pub warm_up: usize,

    /// Learning is triggered every this number of steps.
    pub update_freq: usize,

    /// Number of learning calls per trigger.
    pub number_updates: usize,

    /// Bounds `(action_min, action_max)` of actions.
    pub clip: (f32, f32),

    /// Multiplier of actions before clamping.
    pub action_scale: f64,

    pub max_grad_norm_actor: f64,
    pub max_grad_norm_critic: f64,
    pub max_grad_norm_alpha: f64,

    pub device: Device,

    /// Seed of the replay buffer sampling and the random actions.
    pub seed: u64,
}

impl Default for SacConfig {
    fn default() -> Self {
        Self {
            state_dim: 0,
            action_dim: 0,
            hidden_layers: vec![128, 128],
            actor_opt: OptimizerConfig::default(),
            critic_opt: OptimizerConfig::default(),
            alpha: 0.2,
            alpha_lr: None,
            init_std: 1.0,
            gamma: 0.99,
            tau: 0.02,
            batch_size: 64,
            buffer_size: 1_000_000,
            warm_up: 0,
            update_freq: 1,
            number_updates: 1,
            clip: (-1.0, 1.0),
            action_scale: 1.0,
            max_grad_norm_actor: 20.0,
            max_grad_norm_critic: 20.0,
            max_grad_norm_alpha: 1.0,
            device: Device::Cpu,
            seed: 42,
        }
    }
}

impl SacConfig {
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

    /// Initial entropy coefficient.
    pub fn alpha(mut self, v: f64) -> Self {
        self.alpha = v;
        self
    }

    /// Enables tuning of the entropy coefficient.
    pub fn alpha_lr(mut self, v: Option<f64>) -> Self {
        self.alpha_lr = v;
        self
    }

    /// Initial standard deviation of the policy.
    pub fn init_std(mut self, v: f64) -> Self {
        self.init_std = v;
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
    pub fn update_freq(mut self, v: usize) -> Self {
        self.update_freq = v;
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

    /// Multiplier of actions.
    pub fn action_scale(mut self, v: f64) -> Self {
        self.action_scale = v;
        self
    }

    /// Gradient norm thresholds of the actor, the critic and alpha.
    pub fn max_grad_norm(mut self, actor: f64, critic: f64, alpha: f64) -> Self {
        self.max_grad_norm_actor = actor;
        self.max_grad_norm_critic = critic;
        self.max_grad_norm_alpha = alpha;
        self
    }

    /// Device of the networks.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Seed of the random number generators.
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
            self.update_freq,
            self.number_updates,
        )?;
        validate::clip(self.clip)?;
        self.actor_opt.validate("actor")?;
        self.critic_opt.validate("critic")?;
        if let Some(lr) = self.alpha_lr {
            OptimizerConfig::Adam { lr }.validate("alpha")?;
        }
        validate::positive("alpha", self.alpha)?;
        validate::positive("init_std", self.init_std)?;
        validate::positive("action_scale", self.action_scale)?;
        validate::positive("max_grad_norm_actor", self.max_grad_norm_actor)?;
        validate::positive("max_grad_norm_critic", self.max_grad_norm_critic)?;
        validate::positive("max_grad_norm_alpha", self.max_grad_norm_alpha)
    }

    /// Constructs [`SacConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`SacConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
