use super::Network;
use crate::model::SubModel1;
use anyhow::Result;
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};

/// Actor network owning its variables.
pub struct Actor<P: SubModel1> {
    device: Device,
    varmap: VarMap,
    config: P::Config,
    model: P,
}

impl<P> Actor<P>
where
    P: SubModel1<Input = Tensor>,
    P::Config: Clone,
{
    /// Constructs [`Actor`] and initializes its parameters.
    pub fn build(config: P::Config, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let model = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
            P::build(vb, config.clone())?
        };
        model.reset_parameters(&varmap)?;

        Ok(Self {
            device: device.clone(),
            varmap,
            config,
            model,
        })
    }

    /// Maps states to actions.
    pub fn forward(&self, state: &Tensor) -> Result<P::Output> {
        self.model.forward(state)
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
    pub fn config(&self) -> &P::Config {
        &self.config
    }

    /// Device of the variables.
    pub fn device(&self) -> &Device {
        &self.device
    }
}

impl<P> Network for Actor<P>
where
    P: SubModel1<Input = Tensor>,
    P::Config: Clone,
{
    fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    fn duplicate(&self) -> Result<Self> {
        Self::build(self.config.clone(), &self.device)
    }
}
