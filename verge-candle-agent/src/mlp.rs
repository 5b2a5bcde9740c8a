//! Fully-connected actor and critic bodies.
mod actor_body;
mod config;
mod critic_body;
pub use actor_body::ActorBody;
use anyhow::Result;
use candle_nn::{linear, Linear, VarBuilder};
pub use config::{ActorBodyConfig, CriticBodyConfig, OutActivation};
pub use critic_body::{CriticBody, DoubleCritic};

/// Returns linear layers named `hidden{i}`, counting from `first`, with the given
/// output units.
fn hidden_layers(
    vb: &VarBuilder,
    in_dim: usize,
    units: &[usize],
    first: usize,
) -> Result<Vec<Linear>> {
    let mut layers = Vec::with_capacity(units.len());
    let mut in_dim = in_dim;
    for (i, &out_dim) in units.iter().enumerate() {
        layers.push(linear(in_dim, out_dim, vb.pp(format!("hidden{}", first + i)))?);
        in_dim = out_dim;
    }
    Ok(layers)
}
