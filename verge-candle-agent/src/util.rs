//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{backprop::GradStore, DType, Device, Tensor, Var};
use candle_nn::VarMap;
use log::trace;
use verge_core::{replay_buffer::TransitionBatch, AgentError};
mod named_tensors;
pub use named_tensors::NamedTensors;

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    trace!("track, tau = {}", tau);
    let dest = dest.data().lock().map_err(|_| anyhow!("VarMap lock poisoned"))?;
    let src = src.data().lock().map_err(|_| anyhow!("VarMap lock poisoned"))?;
    check_pairs(&dest, &src)?;

    for (k, v_dest) in dest.iter() {
        let t_src = src[k].as_tensor();
        let t_dest = v_dest.as_tensor();
        let t = (t_src.affine(tau, 0.0)? + t_dest.affine(1.0 - tau, 0.0)?)?;
        v_dest.set(&t)?;
    }

    Ok(())
}

/// Copies the values of the variables in `src` to those in `dest`.
///
/// Variables are identified by their names.
pub fn hard_update(dest: &VarMap, src: &VarMap) -> Result<()> {
    trace!("hard_update");
    let dest = dest.data().lock().map_err(|_| anyhow!("VarMap lock poisoned"))?;
    let src = src.data().lock().map_err(|_| anyhow!("VarMap lock poisoned"))?;
    check_pairs(&dest, &src)?;

    for (k, v_dest) in dest.iter() {
        v_dest.set(src[k].as_tensor())?;
    }

    Ok(())
}

fn check_pairs(
    dest: &std::collections::HashMap<String, Var>,
    src: &std::collections::HashMap<String, Var>,
) -> Result<()> {
    for (k, v_dest) in dest.iter() {
        let v_src = src
            .get(k)
            .ok_or_else(|| AgentError::MissingParameter(k.clone()))?;
        if v_src.dims() != v_dest.dims() {
            return Err(AgentError::ShapeMismatch {
                name: k.clone(),
                expected: v_dest.dims().to_vec(),
                found: v_src.dims().to_vec(),
            }
            .into());
        }
    }
    Ok(())
}

/// Reinitializes linear layers in a [`VarMap`].
///
/// Variables of the layer named `out` are drawn from `U(-out_range, out_range)`.
/// The other weights and biases are drawn from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`,
/// where `fan_in` is the input dimension of the weight.
pub fn reset_linear_layers(varmap: &VarMap, out_range: f64) -> Result<()> {
    let data = varmap.data().lock().map_err(|_| anyhow!("VarMap lock poisoned"))?;

    for (name, var) in data.iter() {
        let bound = if is_output_layer(name) {
            out_range
        } else {
            let weight = match name.strip_suffix("bias") {
                Some(prefix) => data
                    .get(&format!("{}weight", prefix))
                    .ok_or_else(|| AgentError::MissingParameter(format!("{}weight", prefix)))?,
                None => var,
            };
            let fan_in = match weight.dims() {
                [_, fan_in] => *fan_in,
                dims => {
                    return Err(anyhow!("{} is not a linear weight: {:?}", name, dims));
                }
            };
            1.0 / (fan_in as f64).sqrt()
        };
        let t = Tensor::rand(-bound as f32, bound as f32, var.dims(), var.device())?;
        var.set(&t.to_dtype(var.dtype())?)?;
    }

    Ok(())
}

fn is_output_layer(name: &str) -> bool {
    name.rsplit('.').nth(1) == Some("out")
}

/// Clips gradients of the given variables by their total L2 norm.
///
/// Returns the norm before clipping.
pub fn clip_grad_norm(grads: &mut GradStore, vars: &[Var], max_norm: f64) -> Result<f32> {
    let mut sq_sum = 0f32;
    for var in vars.iter() {
        if let Some(g) = grads.get(var.as_tensor()) {
            sq_sum += g.sqr()?.sum_all()?.to_dtype(DType::F32)?.to_scalar::<f32>()?;
        }
    }
    let norm = sq_sum.sqrt();

    if norm as f64 > max_norm {
        let coef = max_norm / (norm as f64 + 1e-6);
        for var in vars.iter() {
            let clipped = match grads.get(var.as_tensor()) {
                Some(g) => g.affine(coef, 0.0)?,
                None => continue,
            };
            grads.insert(var.as_tensor(), clipped);
        }
    }

    Ok(norm)
}

/// Returns `reward + gamma * next_value` for non-terminal transitions and
/// `reward` for terminal ones.
///
/// `is_done` is a `u8` mask; the bootstrap term is masked out, not multiplied,
/// so terminal targets do not depend on `next_value` at all.
pub fn bootstrapped_target(
    reward: &Tensor,
    next_value: &Tensor,
    is_done: &Tensor,
    gamma: f64,
) -> Result<Tensor> {
    let bootstrap = next_value.affine(gamma, 0.0)?;
    let bootstrap = is_done.where_cond(&bootstrap.zeros_like()?, &bootstrap)?;
    Ok((reward + bootstrap)?)
}

/// A [`TransitionBatch`] converted to tensors.
pub struct TensorBatch {
    /// `(batch_size, state_dim)`.
    pub state: Tensor,

    /// `(batch_size, action_dim)`.
    pub action: Tensor,

    /// `(batch_size,)`.
    pub reward: Tensor,

    /// `(batch_size, state_dim)`.
    pub next_state: Tensor,

    /// `(batch_size,)`, `u8` mask.
    pub is_done: Tensor,
}

impl TensorBatch {
    /// Creates tensors on the given device.
    pub fn from_batch(batch: TransitionBatch, device: &Device) -> Result<Self> {
        let n = batch.len();
        let is_done: Vec<u8> = batch.is_done.iter().map(|&d| d as u8).collect();

        Ok(Self {
            state: Tensor::from_vec(batch.state, (n, batch.state_dim), device)?,
            action: Tensor::from_vec(batch.action, (n, batch.action_dim), device)?,
            reward: Tensor::from_vec(batch.reward, (n,), device)?,
            next_state: Tensor::from_vec(batch.next_state, (n, batch.state_dim), device)?,
            is_done: Tensor::from_vec(is_done, (n,), device)?,
        })
    }
}

/// Converts a state into a tensor of shape `(1, dim)`.
pub fn state_tensor(state: &[f32], dim: usize, device: &Device) -> Result<Tensor> {
    if state.len() != dim {
        return Err(AgentError::ShapeMismatch {
            name: "state".to_string(),
            expected: vec![dim],
            found: vec![state.len()],
        }
        .into());
    }
    Ok(Tensor::from_slice(state, (1, dim), device)?)
}

/// Clamps each element of `xs` to `[min, max]` and returns them as a vector.
pub fn clamp_to_vec(xs: &Tensor, (min, max): (f32, f32)) -> Result<Vec<f32>> {
    Ok(xs.clamp(min, max)?.flatten_all()?.to_vec1::<f32>()?)
}

/// Returns an error if `loss` is NaN or infinite.
pub fn check_finite(loss: f32, name: &'static str) -> Result<()> {
    if loss.is_finite() {
        Ok(())
    } else {
        Err(AgentError::NonFiniteLoss(name).into())
    }
}
