//! Diagonal Gaussian policy with learnable standard deviation.
use anyhow::Result;
use candle_core::{DType, Device, Tensor, Var, D};
use candle_nn::{init::Init, VarBuilder, VarMap};

/// Diagonal Gaussian distribution over actions.
///
/// The mean is given by an actor, the standard deviation is a state-independent
/// variable `exp(log_std)` with one entry per action dimension.
pub struct GaussianPolicy {
    varmap: VarMap,
    log_std: Tensor,
    action_dim: usize,
}

impl GaussianPolicy {
    /// Constructs [`GaussianPolicy`] with the initial standard deviation `init_std`.
    pub fn build(action_dim: usize, init_std: f64, device: &Device) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let log_std = vb.get_with_hints(action_dim, "log_std", Init::Const(init_std.ln()))?;

        Ok(Self {
            varmap,
            log_std,
            action_dim,
        })
    }

    /// Standard deviation, with gradient.
    pub fn std(&self) -> Result<Tensor> {
        Ok(self.log_std.exp()?)
    }

    /// Draws actions `mean + std * eps` with `eps ~ N(0, 1)`.
    ///
    /// Gradients flow to `mean` and to the standard deviation.
    pub fn rsample(&self, mean: &Tensor) -> Result<Tensor> {
        let eps = mean.randn_like(0.0, 1.0)?.detach();
        Ok(mean.broadcast_add(&eps.broadcast_mul(&self.std()?)?)?)
    }

    /// Log density of `action`, summed over action dimensions.
    ///
    /// Returns a tensor of shape `(batch_size,)`.
    pub fn log_prob(&self, mean: &Tensor, action: &Tensor) -> Result<Tensor> {
        let var = self.log_std.affine(2.0, 0.0)?.exp()?;
        let sq = (action - mean)?.sqr()?.broadcast_div(&var.affine(2.0, 0.0)?)?;
        let log_norm = 0.5 * (2.0 * std::f64::consts::PI).ln();
        let lp = sq
            .neg()?
            .broadcast_sub(&self.log_std)?
            .affine(1.0, -log_norm)?;
        Ok(lp.sum(D::Minus1)?)
    }

    /// Trainable variables.
    pub fn parameters(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    /// Variables, for persistence.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }

    /// Current standard deviation of each action dimension.
    pub fn std_vec(&self) -> Result<Vec<f32>> {
        Ok(self.std()?.detach().to_vec1::<f32>()?)
    }

    /// Dimension of actions.
    pub fn action_dim(&self) -> usize {
        self.action_dim
    }
}
