//! Configuration of [`SimpleReplayBuffer`](super::SimpleReplayBuffer).
use crate::error::AgentError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`SimpleReplayBuffer`](super::SimpleReplayBuffer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct SimpleReplayBufferConfig {
    /// Maximum number of transitions. The oldest one is evicted when full.
    pub capacity: usize,

    /// Number of transitions returned by `sample()`.
    pub batch_size: usize,

    /// Seed of the random number generator used for sampling.
    pub seed: u64,
}

impl Default for SimpleReplayBufferConfig {
    fn default() -> Self {
        Self {
            capacity: 1_000_000,
            batch_size: 64,
            seed: 42,
        }
    }
}

impl SimpleReplayBufferConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks `0 < batch_size <= capacity`.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.batch_size == 0 {
            return Err(AgentError::config("batch_size must be positive"));
        }
        if self.capacity < self.batch_size {
            return Err(AgentError::Configuration(format!(
                "capacity ({}) must not be smaller than batch_size ({})",
                self.capacity, self.batch_size
            )));
        }
        Ok(())
    }

    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves the configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
