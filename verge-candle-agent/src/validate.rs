//! Checks of hyperparameters shared by the agent configurations.
use verge_core::AgentError;

type Result = std::result::Result<(), AgentError>;

pub(crate) fn dims(state_dim: usize, action_dim: usize, hidden_layers: &[usize]) -> Result {
    if state_dim == 0 || action_dim == 0 {
        return Err(AgentError::Configuration(format!(
            "state_dim and action_dim must be positive, got {} and {}",
            state_dim, action_dim
        )));
    }
    if hidden_layers.is_empty() || hidden_layers.contains(&0) {
        return Err(AgentError::Configuration(format!(
            "hidden_layers must be non-empty positive units, got {:?}",
            hidden_layers
        )));
    }
    Ok(())
}

pub(crate) fn gamma_tau(gamma: f64, tau: f64) -> Result {
    if !(0.0..=1.0).contains(&gamma) {
        return Err(AgentError::Configuration(format!(
            "gamma must be in [0, 1], got {}",
            gamma
        )));
    }
    if !(tau > 0.0 && tau <= 1.0) {
        return Err(AgentError::Configuration(format!(
            "tau must be in (0, 1], got {}",
            tau
        )));
    }
    Ok(())
}

pub(crate) fn schedule(batch_size: usize, buffer_size: usize, every: usize, number: usize) -> Result {
    if batch_size == 0 {
        return Err(AgentError::config("batch_size must be positive"));
    }
    if buffer_size < batch_size {
        return Err(AgentError::Configuration(format!(
            "buffer_size ({}) must not be smaller than batch_size ({})",
            buffer_size, batch_size
        )));
    }
    if every == 0 || number == 0 {
        return Err(AgentError::config(
            "update frequency and number of updates must be positive",
        ));
    }
    Ok(())
}

pub(crate) fn clip((min, max): (f32, f32)) -> Result {
    if !(min.is_finite() && max.is_finite() && min < max) {
        return Err(AgentError::Configuration(format!(
            "clip must satisfy action_min < action_max, got ({}, {})",
            min, max
        )));
    }
    Ok(())
}

pub(crate) fn positive(name: &str, v: f64) -> Result {
    if !(v.is_finite() && v > 0.0) {
        return Err(AgentError::Configuration(format!(
            "{} must be positive, got {}",
            name, v
        )));
    }
    Ok(())
}
