use super::{hidden_layers, CriticBodyConfig};
use crate::{model::SubModel2, util::reset_linear_layers};
use anyhow::Result;
use candle_core::{Device, Module, Tensor, D};
use candle_nn::{linear, Linear, VarBuilder, VarMap};
use verge_core::AgentError;

/// Fully-connected Q-function.
///
/// The state goes through the first hidden layer, then the action is concatenated
/// to its output. The output has shape `(batch_size, 1)`.
pub struct CriticBody {
    config: CriticBodyConfig,
    device: Device,
    first: Linear,
    layers: Vec<Linear>,
    out: Linear,
}

impl SubModel2 for CriticBody {
    type Config = CriticBodyConfig;
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = Tensor;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        if config.state_dim == 0 || config.action_dim == 0 {
            return Err(AgentError::config("critic state and action dimensions must be positive").into());
        }
        let (&first_dim, rest) = match config.units.split_first() {
            Some(v) => v,
            None => return Err(AgentError::config("hidden_layers must not be empty").into()),
        };
        let device = vb.device().clone();
        let first = linear(config.state_dim, first_dim, vb.pp("hidden0"))?;

        // Layers after the concatenation are named from `hidden1`.
        let layers = hidden_layers(&vb, first_dim + config.action_dim, rest, 1)?;
        let last_dim = rest.last().copied().unwrap_or(first_dim + config.action_dim);
        let out = linear(last_dim, 1, vb.pp("out"))?;

        Ok(Self {
            config,
            device,
            first,
            layers,
            out,
        })
    }

    fn forward(&self, state: &Self::Input1, action: &Self::Input2) -> Result<Self::Output> {
        let state = state.to_device(&self.device)?;
        let action = action.to_device(&self.device)?;
        let xs = self.first.forward(&state)?.relu()?;
        let mut xs = Tensor::cat(&[&xs, &action], D::Minus1)?;
        for layer in self.layers.iter() {
            xs = layer.forward(&xs)?.relu()?;
        }
        Ok(self.out.forward(&xs)?)
    }

    fn reset_parameters(&self, varmap: &VarMap) -> Result<()> {
        reset_linear_layers(varmap, self.config.last_layer_range)
    }
}

/// Two independent [`CriticBody`]s, `q1` and `q2`, sharing one configuration.
pub struct DoubleCritic {
    q1: CriticBody,
    q2: CriticBody,
}

impl SubModel2 for DoubleCritic {
    type Config = CriticBodyConfig;
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = (Tensor, Tensor);

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let q1 = CriticBody::build(vb.pp("q1"), config.clone())?;
        let q2 = CriticBody::build(vb.pp("q2"), config)?;
        Ok(Self { q1, q2 })
    }

    fn forward(&self, state: &Self::Input1, action: &Self::Input2) -> Result<Self::Output> {
        Ok((self.q1.forward(state, action)?, self.q2.forward(state, action)?))
    }

    fn reset_parameters(&self, varmap: &VarMap) -> Result<()> {
        reset_linear_layers(varmap, self.q1.config.last_layer_range)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::DType;

    fn build<Q: SubModel2<Config = CriticBodyConfig>>(units: Vec<usize>) -> Result<(VarMap, Q)> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let q = Q::build(vb, CriticBodyConfig::new(3, 2, units))?;
        Ok((varmap, q))
    }

    #[test]
    fn test_output_shape() -> Result<()> {
        for units in [vec![8], vec![8, 4], vec![8, 4, 4]].iter() {
            let (_, critic) = build::<CriticBody>(units.clone())?;
            let state = Tensor::zeros((5, 3), DType::F32, &Device::Cpu)?;
            let action = Tensor::zeros((5, 2), DType::F32, &Device::Cpu)?;
            assert_eq!(critic.forward(&state, &action)?.dims(), &[5, 1]);
        }
        Ok(())
    }

    #[test]
    fn test_layer_names() -> Result<()> {
        let (varmap, _) = build::<CriticBody>(vec![8, 4, 4])?;
        let data = varmap.data().lock().unwrap();
        let mut names: Vec<_> = data.keys().cloned().collect();
        names.sort();
        assert_eq!(
            names,
            [
                "hidden0.bias", "hidden0.weight", "hidden1.bias", "hidden1.weight",
                "hidden2.bias", "hidden2.weight", "out.bias", "out.weight",
            ]
        );
        // `hidden1` sees the concatenated action.
        assert_eq!(data["hidden1.weight"].dims(), &[4, 10]);
        Ok(())
    }

    #[test]
    fn test_reset_ranges() -> Result<()> {
        let (varmap, critic) = build::<DoubleCritic>(vec![4, 4])?;
        critic.reset_parameters(&varmap)?;

        let data = varmap.data().lock().unwrap();
        assert_eq!(data.len(), 12);
        for (name, var) in data.iter() {
            let bound = if name.contains("out.") {
                3e-4
            } else if name.contains("hidden0") {
                1.0 / 3f32.sqrt()
            } else {
                // hidden1 takes the concatenation of 4 units and 2 action dims.
                1.0 / 6f32.sqrt()
            };
            let max = var.abs()?.flatten_all()?.max(0)?.to_scalar::<f32>()?;
            assert!(max <= bound * 1.0001, "{}: {} > {}", name, max, bound);
        }
        Ok(())
    }

    #[test]
    fn test_heads_are_independent() -> Result<()> {
        let (varmap, critic) = build::<DoubleCritic>(vec![8])?;
        critic.reset_parameters(&varmap)?;
        let state = Tensor::ones((1, 3), DType::F32, &Device::Cpu)?;
        let action = Tensor::ones((1, 2), DType::F32, &Device::Cpu)?;
        let (q1, q2) = critic.forward(&state, &action)?;
        assert_ne!(
            q1.flatten_all()?.to_vec1::<f32>()?,
            q2.flatten_all()?.to_vec1::<f32>()?
        );
        Ok(())
    }
}
