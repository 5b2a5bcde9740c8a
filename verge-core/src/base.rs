//! Core traits.
mod agent;
mod replay_buffer;
pub use agent::Agent;
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
