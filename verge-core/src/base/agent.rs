//! Agent.
use crate::record::Record;
use anyhow::Result;
use std::path::Path;

/// Represents a trainable policy driven by an external environment loop.
///
/// The driver calls [`Agent::act`] to obtain actions and [`Agent::step`] after each
/// environment tick. Learning happens inside [`Agent::step`] when the agent decides
/// to do so; it never runs concurrently with other calls.
pub trait Agent {
    /// Snapshots of the network parameters returned by [`Agent::describe_agent`].
    type Description;

    /// Returns an action for the given state.
    ///
    /// `explore` is the exploration knob of the agent: the scale of the additive
    /// noise for deterministic policies or the probability of taking a uniformly
    /// random action for stochastic ones.
    fn act(&mut self, state: &[f32], explore: f64) -> Result<Vec<f32>>;

    /// Stores a transition and, if the update schedule says so, learns from
    /// sampled batches.
    fn step(
        &mut self,
        state: &[f32],
        action: &[f32],
        reward: f32,
        next_state: &[f32],
        done: bool,
    ) -> Result<()>;

    /// Reinitializes all network parameters and synchronizes target networks.
    ///
    /// The replay buffer is kept.
    fn reset_agent(&mut self) -> Result<()>;

    /// Returns snapshots of the parameters of all networks of the agent.
    fn describe_agent(&self) -> Result<Self::Description>;

    /// Returns statistics of the last learning call, e.g. losses.
    fn last_record(&self) -> Option<&Record>;

    /// Saves the parameters of all networks into a single file.
    fn save_state(&self, path: &Path) -> Result<()>;

    /// Restores the parameters saved with [`Agent::save_state`].
    ///
    /// Nothing is modified if the file is missing or does not match the networks.
    fn load_state(&mut self, path: &Path) -> Result<()>;
}
