//! Exploration noise.
use anyhow::Result;
use candle_core::{Device, Tensor};
use serde::{Deserialize, Serialize};
use verge_core::AgentError;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`GaussianNoise`].
pub struct GaussianNoiseConfig {
    /// Mean of the normal distribution.
    pub mu: f64,

    /// Standard deviation of the normal distribution.
    pub sigma: f64,

    /// Multiplier applied to each draw.
    pub scale: f64,
}

impl Default for GaussianNoiseConfig {
    fn default() -> Self {
        Self {
            mu: 1e-8,
            sigma: 0.1,
            scale: 0.2,
        }
    }
}

impl GaussianNoiseConfig {
    /// Sets the mean.
    pub fn mu(mut self, v: f64) -> Self {
        self.mu = v;
        self
    }

    /// Sets the standard deviation.
    pub fn sigma(mut self, v: f64) -> Self {
        self.sigma = v;
        self
    }

    /// Sets the scale.
    pub fn scale(mut self, v: f64) -> Self {
        self.scale = v;
        self
    }

    /// Checks that the parameters are finite and `sigma` is non-negative.
    pub fn validate(&self) -> Result<(), AgentError> {
        if !self.mu.is_finite() || !self.scale.is_finite() {
            return Err(AgentError::config("noise mu and scale must be finite"));
        }
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(AgentError::config(format!(
                "noise sigma must be non-negative, got {}",
                self.sigma
            )));
        }
        Ok(())
    }
}

/// Memoryless Gaussian noise, `scale * N(mu, sigma)` per dimension.
pub struct GaussianNoise {
    config: GaussianNoiseConfig,
    dim: usize,
    device: Device,
}

impl GaussianNoise {
    /// Constructs [`GaussianNoise`] of the given dimension.
    pub fn new(config: GaussianNoiseConfig, dim: usize, device: &Device) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            dim,
            device: device.clone(),
        })
    }

    /// Draws a sample of shape `(dim,)`, independent of previous draws.
    pub fn sample(&self) -> Result<Tensor> {
        let GaussianNoiseConfig { mu, sigma, scale } = &self.config;
        let xs = Tensor::randn(*mu as f32, *sigma as f32, (self.dim,), &self.device)?;
        Ok(xs.affine(*scale, 0.0)?)
    }

    /// Dimension of samples.
    pub fn dim(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sample_statistics() -> Result<()> {
        let config = GaussianNoiseConfig::default().mu(1.0).sigma(0.5).scale(2.0);
        let noise = GaussianNoise::new(config, 4, &Device::Cpu)?;

        let n = 2000;
        let mut xs = vec![];
        for _ in 0..n {
            let x = noise.sample()?;
            assert_eq!(x.dims(), &[4]);
            xs.extend(x.to_vec1::<f32>()?);
        }
        let mean = xs.iter().sum::<f32>() / xs.len() as f32;
        let var = xs.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / xs.len() as f32;
        assert!((mean - 2.0).abs() < 0.1, "mean = {}", mean);
        assert!((var.sqrt() - 1.0).abs() < 0.1, "std = {}", var.sqrt());
        Ok(())
    }

    #[test]
    fn test_invalid_sigma() {
        let config = GaussianNoiseConfig::default().sigma(-1.0);
        assert!(GaussianNoise::new(config, 1, &Device::Cpu).is_err());
    }
}
