//! Entropy coefficient of SAC.
use crate::{
    opt::{Optimizer, OptimizerConfig},
    util::clip_grad_norm,
};
use anyhow::Result;
use candle_core::{DType, Device, Tensor};
use candle_nn::{init::Init, VarBuilder, VarMap};
use log::trace;

/// The entropy coefficient of SAC, `alpha = exp(log_alpha)`.
///
/// `log_alpha` is tuned toward the target entropy when a learning rate is given;
/// otherwise alpha keeps its initial value.
pub struct EntCoef {
    varmap: VarMap,
    log_alpha: Tensor,
    target_entropy: f64,
    max_grad_norm: f64,
    opt: Option<Optimizer>,
}

impl EntCoef {
    /// Constructs an instance of `EntCoef`.
    pub fn new(
        alpha: f64,
        alpha_lr: Option<f64>,
        target_entropy: f64,
        max_grad_norm: f64,
        device: &Device,
    ) -> Result<Self> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let log_alpha = vb.get_with_hints(1, "log_alpha", Init::Const(alpha.ln()))?;
        let opt = match alpha_lr {
            Some(lr) => Some(OptimizerConfig::Adam { lr }.build(varmap.all_vars())?),
            None => None,
        };

        Ok(Self {
            varmap,
            log_alpha,
            target_entropy,
            max_grad_norm,
            opt,
        })
    }

    /// Returns the entropy coefficient, shape `(1,)`, without gradient.
    pub fn alpha(&self) -> Result<Tensor> {
        Ok(self.log_alpha.detach().exp()?)
    }

    /// Returns the entropy coefficient as a scalar.
    pub fn alpha_value(&self) -> Result<f32> {
        Ok(self.alpha()?.to_vec1::<f32>()?[0])
    }

    /// Target entropy.
    pub fn target_entropy(&self) -> f64 {
        self.target_entropy
    }

    /// Returns `true` if alpha is not tuned.
    pub fn is_frozen(&self) -> bool {
        self.opt.is_none()
    }

    /// Updates `log_alpha` given log probabilities of sampled actions.
    ///
    /// The loss is `mean(alpha * (-log_prob - target_entropy))` with the bracket
    /// detached. Returns the loss, or `None` if alpha is frozen.
    pub fn update(&mut self, log_prob: &Tensor) -> Result<Option<f32>> {
        let opt = match &mut self.opt {
            Some(opt) => opt,
            None => return Ok(None),
        };
        let bracket = log_prob.detach().affine(-1.0, -self.target_entropy)?;
        let loss = self
            .log_alpha
            .exp()?
            .broadcast_mul(&bracket)?
            .mean_all()?;

        let mut grads = loss.backward()?;
        let norm = clip_grad_norm(&mut grads, &self.varmap.all_vars(), self.max_grad_norm)?;
        trace!("log_alpha grad norm = {}", norm);
        opt.step(&grads)?;

        Ok(Some(loss.to_scalar::<f32>()?))
    }

    /// Variables, for persistence.
    pub fn varmap(&self) -> &VarMap {
        &self.varmap
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn log_prob(v: f32) -> Result<Tensor> {
        Ok(Tensor::full(v, (8,), &Device::Cpu)?)
    }

    #[test]
    fn test_frozen() -> Result<()> {
        let mut ent_coef = EntCoef::new(0.2, None, -1.0, 1.0, &Device::Cpu)?;
        for _ in 0..10 {
            assert_eq!(ent_coef.update(&log_prob(3.0)?)?, None);
        }
        assert!(ent_coef.is_frozen());
        assert!((ent_coef.alpha_value()? - 0.2).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_direction() -> Result<()> {
        // -log_prob - target_entropy < 0 for high log probabilities: alpha grows.
        let mut ent_coef = EntCoef::new(0.2, Some(1e-2), -1.0, 1.0, &Device::Cpu)?;
        for _ in 0..10 {
            ent_coef.update(&log_prob(3.0)?)?;
        }
        assert!(ent_coef.alpha_value()? > 0.2);

        // ... and shrinks for low ones.
        let mut ent_coef = EntCoef::new(0.2, Some(1e-2), -1.0, 1.0, &Device::Cpu)?;
        for _ in 0..10 {
            ent_coef.update(&log_prob(-3.0)?)?;
        }
        assert!(ent_coef.alpha_value()? < 0.2);
        Ok(())
    }

    #[test]
    fn test_grad_clip_bounds_step() -> Result<()> {
        // Adam steps are about lr regardless of the clip, so check that a huge
        // loss does not move log_alpha much more than lr per update.
        let mut ent_coef = EntCoef::new(1.0, Some(1e-2), -1.0, 1e-3, &Device::Cpu)?;
        ent_coef.update(&log_prob(1e6)?)?;
        let log_alpha = ent_coef.alpha_value()?.ln();
        assert!(log_alpha > 0.0 && log_alpha < 2e-2);
        Ok(())
    }
}
