//! Optimizers.
use anyhow::Result;
use candle_core::{backprop::GradStore, Tensor, Var};
use candle_nn::{AdamW, Optimizer as _, ParamsAdamW};
use candle_optimisers::adam::{Adam, ParamsAdam};
use serde::{Deserialize, Serialize};
use verge_core::AgentError;

/// Configuration of optimizer for training neural networks in an RL agent.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub enum OptimizerConfig {
    /// AdamW optimizer.
    AdamW {
        lr: f64,
        #[serde(default = "default_beta1")]
        beta1: f64,
        #[serde(default = "default_beta2")]
        beta2: f64,
        #[serde(default = "default_eps")]
        eps: f64,
        #[serde(default = "default_weight_decay")]
        weight_decay: f64,
    },

    /// Adam optimizer.
    Adam {
        /// Learning rate.
        lr: f64,
    },
}

fn default_beta1() -> f64 {
    ParamsAdamW::default().beta1
}

fn default_beta2() -> f64 {
    ParamsAdamW::default().beta2
}

fn default_eps() -> f64 {
    ParamsAdamW::default().eps
}

fn default_weight_decay() -> f64 {
    ParamsAdamW::default().weight_decay
}

impl OptimizerConfig {
    /// Constructs an optimizer of the given variables.
    pub fn build(&self, vars: Vec<Var>) -> Result<Optimizer> {
        match &self {
            OptimizerConfig::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => {
                let params = ParamsAdamW {
                    lr: *lr,
                    beta1: *beta1,
                    beta2: *beta2,
                    eps: *eps,
                    weight_decay: *weight_decay,
                };
                let opt = AdamW::new(vars, params)?;
                Ok(Optimizer::AdamW(opt))
            }
            OptimizerConfig::Adam { lr } => {
                let params = ParamsAdam {
                    lr: *lr,
                    ..ParamsAdam::default()
                };
                let opt = Adam::new(vars, params)?;
                Ok(Optimizer::Adam(opt))
            }
        }
    }

    /// Returns the learning rate.
    pub fn lr(&self) -> f64 {
        match self {
            Self::AdamW { lr, .. } => *lr,
            Self::Adam { lr } => *lr,
        }
    }

    /// Override learning rate.
    pub fn learning_rate(self, lr: f64) -> Self {
        match self {
            Self::AdamW {
                lr: _,
                beta1,
                beta2,
                eps,
                weight_decay,
            } => Self::AdamW {
                lr,
                beta1,
                beta2,
                eps,
                weight_decay,
            },
            Self::Adam { lr: _ } => Self::Adam { lr },
        }
    }

    /// AdamW with the given learning rate and weight decay.
    pub fn adamw(lr: f64, weight_decay: f64) -> Self {
        Self::AdamW {
            lr,
            beta1: default_beta1(),
            beta2: default_beta2(),
            eps: default_eps(),
            weight_decay,
        }
    }

    /// Checks that the learning rate and the weight decay are finite and non-negative.
    pub fn validate(&self, name: &str) -> Result<(), AgentError> {
        let lr = self.lr();
        if !lr.is_finite() || lr < 0.0 {
            return Err(AgentError::Configuration(format!(
                "learning rate of {} must be a non-negative number, got {}",
                name, lr
            )));
        }
        if let Self::AdamW { weight_decay, .. } = self {
            if !weight_decay.is_finite() || *weight_decay < 0.0 {
                return Err(AgentError::Configuration(format!(
                    "weight decay of {} must be a non-negative number, got {}",
                    name, weight_decay
                )));
            }
        }
        Ok(())
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam { lr: 2e-3 }
    }
}

/// Optimizers.
///
/// This is a thin wrapper of [`candle_nn::Optimizer`] implementations.
pub enum Optimizer {
    /// AdamW optimizer.
    AdamW(AdamW),

    /// Adam optimizer.
    Adam(Adam),
}

impl Optimizer {
    /// Applies a backward step pass.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        match self {
            Self::AdamW(opt) => Ok(opt.backward_step(loss)?),
            Self::Adam(opt) => Ok(opt.backward_step(loss)?),
        }
    }

    /// Updates the variables with precomputed gradients.
    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        match self {
            Self::AdamW(opt) => Ok(opt.step(grads)?),
            Self::Adam(opt) => Ok(opt.step(grads)?),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(OptimizerConfig::Adam { lr: 1e-3 }.validate("actor").is_ok());
        assert!(OptimizerConfig::Adam { lr: -1e-3 }.validate("actor").is_err());
        assert!(OptimizerConfig::Adam { lr: f64::NAN }
            .validate("actor")
            .is_err());
        assert!(OptimizerConfig::adamw(1e-3, -0.1).validate("critic").is_err());
        assert_eq!(
            OptimizerConfig::adamw(1e-3, 0.0).learning_rate(0.5).lr(),
            0.5
        );
    }
}
