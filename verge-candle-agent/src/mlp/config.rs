use serde::{Deserialize, Serialize};

/// Activation applied to the output layer of [`ActorBody`](super::ActorBody).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum OutActivation {
    /// No activation.
    Identity,

    /// Hyperbolic tangent, keeping outputs in `(-1, 1)`.
    Tanh,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`ActorBody`](super::ActorBody).
pub struct ActorBodyConfig {
    pub in_dim: usize,
    pub units: Vec<usize>,
    pub out_dim: usize,
    pub out_activation: OutActivation,

    /// Output layer is initialized with `U(-last_layer_range, last_layer_range)`.
    pub last_layer_range: f64,
}

impl ActorBodyConfig {
    /// Creates configuration of an actor with `tanh` output.
    pub fn new(in_dim: usize, units: Vec<usize>, out_dim: usize) -> Self {
        Self {
            in_dim,
            units,
            out_dim,
            out_activation: OutActivation::Tanh,
            last_layer_range: 3e-3,
        }
    }

    /// Sets the activation of the output layer.
    pub fn out_activation(mut self, v: OutActivation) -> Self {
        self.out_activation = v;
        self
    }

    /// Sets the initialization range of the output layer.
    pub fn last_layer_range(mut self, v: f64) -> Self {
        self.last_layer_range = v;
        self
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`CriticBody`](super::CriticBody).
///
/// The action is concatenated to the output of the first hidden layer.
pub struct CriticBodyConfig {
    pub state_dim: usize,
    pub action_dim: usize,
    pub units: Vec<usize>,

    /// Output layer is initialized with `U(-last_layer_range, last_layer_range)`.
    pub last_layer_range: f64,
}

impl CriticBodyConfig {
    /// Creates configuration of a critic.
    pub fn new(state_dim: usize, action_dim: usize, units: Vec<usize>) -> Self {
        Self {
            state_dim,
            action_dim,
            units,
            last_layer_range: 3e-4,
        }
    }

    /// Sets the initialization range of the output layer.
    pub fn last_layer_range(mut self, v: f64) -> Self {
        self.last_layer_range = v;
        self
    }
}
