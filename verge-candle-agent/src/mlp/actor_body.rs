use super::{hidden_layers, ActorBodyConfig, OutActivation};
use crate::{model::SubModel1, util::reset_linear_layers};
use anyhow::Result;
use candle_core::{Device, Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder, VarMap};
use verge_core::AgentError;

/// Fully-connected actor with ReLU hidden layers.
///
/// The output activation is given by [`ActorBodyConfig::out_activation`].
pub struct ActorBody {
    config: ActorBodyConfig,
    device: Device,
    layers: Vec<Linear>,
    out: Linear,
}

impl SubModel1 for ActorBody {
    type Config = ActorBodyConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        if config.in_dim == 0 || config.out_dim == 0 {
            return Err(AgentError::config("actor input and output dimensions must be positive").into());
        }
        let device = vb.device().clone();
        let layers = hidden_layers(&vb, config.in_dim, &config.units, 0)?;
        let out = match config.units.last() {
            Some(&last) => linear(last, config.out_dim, vb.pp("out"))?,
            None => return Err(AgentError::config("hidden_layers must not be empty").into()),
        };

        Ok(Self {
            config,
            device,
            layers,
            out,
        })
    }

    fn forward(&self, xs: &Self::Input) -> Result<Self::Output> {
        let mut xs = xs.to_device(&self.device)?;
        for layer in self.layers.iter() {
            xs = layer.forward(&xs)?.relu()?;
        }
        let xs = self.out.forward(&xs)?;

        match self.config.out_activation {
            OutActivation::Identity => Ok(xs),
            OutActivation::Tanh => Ok(xs.tanh()?),
        }
    }

    fn reset_parameters(&self, varmap: &VarMap) -> Result<()> {
        reset_linear_layers(varmap, self.config.last_layer_range)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::DType;

    #[test]
    fn test_forward_is_bounded() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let config = ActorBodyConfig::new(3, vec![16, 16], 2).last_layer_range(10.0);
        let actor = ActorBody::build(vb, config)?;
        actor.reset_parameters(&varmap)?;

        let xs = Tensor::randn(0f32, 10f32, (5, 3), &Device::Cpu)?;
        let ys = actor.forward(&xs)?;
        assert_eq!(ys.dims(), &[5, 2]);
        for y in ys.flatten_all()?.to_vec1::<f32>()? {
            assert!(y.abs() <= 1.0);
        }
        Ok(())
    }

    #[test]
    fn test_empty_hidden_layers() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        assert!(ActorBody::build(vb, ActorBodyConfig::new(3, vec![], 2)).is_err());
    }
}
