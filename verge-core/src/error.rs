//! Errors in the library.
use std::path::PathBuf;
use thiserror::Error;

/// Errors in the library.
///
/// Functions in this workspace return [`anyhow::Result`]; use
/// [`anyhow::Error::downcast_ref`] to inspect the variant.
#[derive(Error, Debug, PartialEq)]
pub enum AgentError {
    /// The replay buffer holds fewer transitions than requested.
    #[error("Insufficient data: {len} transitions stored, {batch_size} requested")]
    InsufficientData {
        /// Number of transitions in the buffer.
        len: usize,
        /// Requested batch size.
        batch_size: usize,
    },

    /// Invalid hyperparameter.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Shape of data does not match the expected one.
    #[error("Shape mismatch of {name}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Name of the mismatching item.
        name: String,
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        found: Vec<usize>,
    },

    /// A parameter is missing in a saved agent state.
    #[error("Missing parameter in saved state: {0}")]
    MissingParameter(String),

    /// The file of a saved agent state does not exist.
    #[error("State file not found: {0:?}")]
    StateFileNotFound(PathBuf),

    /// A loss became NaN or infinite.
    #[error("Non-finite {0} loss")]
    NonFiniteLoss(&'static str),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKey(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueType(String),
}

impl AgentError {
    /// Shorthand of [`AgentError::Configuration`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
