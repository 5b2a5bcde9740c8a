//! Agent selection and descriptions.
use crate::{
    ddpg::{Ddpg, DdpgConfig},
    sac::{Sac, SacConfig},
    util::NamedTensors,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use verge_core::{record::Record, Agent};

/// Snapshots of the parameters of the networks of an agent, in a fixed order.
#[derive(Clone, Debug, Default)]
pub struct AgentDescription {
    networks: Vec<(String, NamedTensors)>,
}

impl AgentDescription {
    /// Appends the snapshot of a network.
    pub fn push(&mut self, name: impl Into<String>, tensors: NamedTensors) {
        self.networks.push((name.into(), tensors));
    }

    /// Returns the snapshot of the given network.
    pub fn get(&self, name: &str) -> Option<&NamedTensors> {
        self.networks
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    /// Names of the networks.
    pub fn names(&self) -> Vec<&str> {
        self.networks.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, NamedTensors)> {
        self.networks.iter()
    }
}

/// Configuration of [`AnyAgent`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum AgentConfig {
    Ddpg(DdpgConfig),
    Sac(SacConfig),
}

impl AgentConfig {
    /// Constructs [`AgentConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`AgentConfig`] as YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// One of the agents of this crate.
pub enum AnyAgent {
    Ddpg(Ddpg),
    Sac(Sac),
}

impl AnyAgent {
    /// Builds the agent selected by the configuration.
    pub fn build(config: AgentConfig) -> Result<Self> {
        match config {
            AgentConfig::Ddpg(config) => Ok(Self::Ddpg(Ddpg::build(config)?)),
            AgentConfig::Sac(config) => Ok(Self::Sac(Sac::build(config)?)),
        }
    }

    /// Name of the algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ddpg(_) => "DDPG",
            Self::Sac(_) => "SAC",
        }
    }
}

impl Agent for AnyAgent {
    type Description = AgentDescription;

    fn act(&mut self, state: &[f32], explore: f64) -> Result<Vec<f32>> {
        match self {
            Self::Ddpg(agent) => Agent::act(agent, state, explore),
            Self::Sac(agent) => Agent::act(agent, state, explore),
        }
    }

    fn step(
        &mut self,
        state: &[f32],
        action: &[f32],
        reward: f32,
        next_state: &[f32],
        done: bool,
    ) -> Result<()> {
        match self {
            Self::Ddpg(agent) => Agent::step(agent, state, action, reward, next_state, done),
            Self::Sac(agent) => Agent::step(agent, state, action, reward, next_state, done),
        }
    }

    fn reset_agent(&mut self) -> Result<()> {
        match self {
            Self::Ddpg(agent) => agent.reset_agent(),
            Self::Sac(agent) => agent.reset_agent(),
        }
    }

    fn describe_agent(&self) -> Result<AgentDescription> {
        match self {
            Self::Ddpg(agent) => agent.describe_agent(),
            Self::Sac(agent) => agent.describe_agent(),
        }
    }

    fn last_record(&self) -> Option<&Record> {
        match self {
            Self::Ddpg(agent) => agent.last_record(),
            Self::Sac(agent) => agent.last_record(),
        }
    }

    fn save_state(&self, path: &Path) -> Result<()> {
        match self {
            Self::Ddpg(agent) => agent.save_state(path),
            Self::Sac(agent) => agent.save_state(path),
        }
    }

    fn load_state(&mut self, path: &Path) -> Result<()> {
        match self {
            Self::Ddpg(agent) => agent.load_state(path),
            Self::Sac(agent) => agent.load_state(path),
        }
    }
}
