//! Online and target networks, and their persistence.
mod actor;
mod critic;
mod target;
pub use actor::Actor;
use anyhow::{anyhow, Result};
use candle_core::{Device, Tensor};
use candle_nn::VarMap;
pub use critic::Critic;
use log::info;
use std::{collections::HashMap, path::Path};
pub use target::{Detach, Target};
use verge_core::AgentError;

/// A network owning its [`VarMap`].
pub trait Network: Sized {
    /// Variables of the network.
    fn varmap(&self) -> &VarMap;

    /// Builds a network with the same configuration on the same device.
    ///
    /// Variables of the returned network are freshly initialized.
    fn duplicate(&self) -> Result<Self>;
}

/// Saves variables of networks into a single safetensors file.
///
/// A variable `v` of the network named `n` is stored with the key `n.v`.
pub fn save_varmaps(path: &Path, varmaps: &[(&str, &VarMap)]) -> Result<()> {
    let mut tensors = HashMap::new();
    for (name, varmap) in varmaps.iter() {
        let data = varmap.data().lock().map_err(|_| anyhow!("VarMap lock poisoned"))?;
        for (k, v) in data.iter() {
            tensors.insert(format!("{}.{}", name, k), v.as_tensor().detach());
        }
    }
    candle_core::safetensors::save(&tensors, path)?;
    info!("Saved {} tensors to {:?}", tensors.len(), path);
    Ok(())
}

/// Loads variables of networks from a file written by [`save_varmaps`].
///
/// Every variable is checked before any of them is overwritten, so a failed load
/// leaves the networks untouched.
pub fn load_varmaps(path: &Path, varmaps: &[(&str, &VarMap)], device: &Device) -> Result<()> {
    if !path.exists() {
        return Err(AgentError::StateFileNotFound(path.to_path_buf()).into());
    }
    let tensors: HashMap<String, Tensor> = candle_core::safetensors::load(path, device)?;

    let guards = varmaps
        .iter()
        .map(|(name, varmap)| {
            let data = varmap.data().lock().map_err(|_| anyhow!("VarMap lock poisoned"))?;
            Ok((*name, data))
        })
        .collect::<Result<Vec<_>>>()?;

    for (name, data) in guards.iter() {
        for (k, v) in data.iter() {
            let key = format!("{}.{}", name, k);
            let t = tensors
                .get(&key)
                .ok_or_else(|| AgentError::MissingParameter(key.clone()))?;
            if t.dims() != v.dims() {
                return Err(AgentError::ShapeMismatch {
                    name: key,
                    expected: v.dims().to_vec(),
                    found: t.dims().to_vec(),
                }
                .into());
            }
        }
    }

    for (name, data) in guards.iter() {
        for (k, v) in data.iter() {
            let t = &tensors[&format!("{}.{}", name, k)];
            v.set(&t.to_dtype(v.dtype())?)?;
        }
    }
    info!("Loaded {} networks from {:?}", guards.len(), path);

    Ok(())
}
