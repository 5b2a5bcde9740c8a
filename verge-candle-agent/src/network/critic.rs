use super::Network;
use crate::model::SubModel2;
use anyhow::Result;
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};

/// Critic network owning its variables.
///
/// It takes states and actions as inputs and outputs action values.
pub struct Critic<Q: SubModel2> {
    device: Device,
    varmap: VarMap,
    config: Q::Config,
    model: Q,
}

impl<Q> Critic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor>,
    Q::Config: Clone,
{
    /// Constructs [`Critic`] and initializes its parameters.
    pub fn build(config: Q::Config, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let model = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
            Q::build(vb, config.clone())?
        };
        model.reset_parameters(&varmap)?;

        Ok(Self {
            device: device.clone(),
            varmap,
            config,
            model,
        })
    }

    /// Returns action values.
    pub fn forward(&self, state: &Tensor, action: &Tensor) -> Result<Q::Output> {
        self.model.forward(state, action)
    }

    /// Trainable variables.
    pub fn parameters(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    /// Reinitializes the parameters.
    pub fn reset_parameters(&self) -> Result<()> {
        self.model.reset_parameters(&self.varmap)
    }

    /// Configuration of the model.
    pub fn config(&self) -> &Q::Config {
        &self.config
    }
}

impl<Q> Network for Critic<Q>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor>,
    Q::Config: Clone,
{
    fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    fn duplicate(&self) -> Result<Self> {
        Self::build(self.config.clone(), &self.device)
    }
}
