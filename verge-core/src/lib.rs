#![warn(missing_docs)]
//! Core interfaces of off-policy actor-critic agents.
//!
//! This crate does not depend on any tensor backend. It provides the [`Agent`]
//! trait consumed by environment drivers, the replay buffer storing transitions,
//! records used to report training statistics and the error type of the workspace.
pub mod error;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{Agent, ExperienceBufferBase, ReplayBufferBase};
pub use error::AgentError;
