//! Interface of neural networks used in RL agents.
use anyhow::Result;
use candle_nn::{VarBuilder, VarMap};

/// Neural network model not owing its [`VarMap`] internally.
///
/// The owner of the [`VarMap`] gives a [`VarBuilder`] on it to [`SubModel1::build`]
/// and passes the same map to [`SubModel1::reset_parameters`].
pub trait SubModel1 {
    /// Configuration from which [`SubModel1`] is constructed.
    type Config;

    /// Input of the [`SubModel1`].
    type Input;

    /// Output of the [`SubModel1`].
    type Output;

    /// Builds [`SubModel1`] with [`VarBuilder`] and [`SubModel1::Config`].
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// A generalized forward function.
    fn forward(&self, input: &Self::Input) -> Result<Self::Output>;

    /// Reinitializes the variables of the model in `varmap`.
    fn reset_parameters(&self, varmap: &VarMap) -> Result<()>;
}

/// Neural network model not owing its [`VarMap`] internally.
///
/// The difference from [`SubModel1`] is that this trait takes two inputs.
pub trait SubModel2 {
    /// Configuration from which [`SubModel2`] is constructed.
    type Config;

    /// Input of the [`SubModel2`].
    type Input1;

    /// Input of the [`SubModel2`].
    type Input2;

    /// Output of the [`SubModel2`].
    type Output;

    /// Builds [`SubModel2`].
    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self>
    where
        Self: Sized;

    /// A generalized forward function.
    fn forward(&self, input1: &Self::Input1, input2: &Self::Input2) -> Result<Self::Output>;

    /// Reinitializes the variables of the model in `varmap`.
    fn reset_parameters(&self, varmap: &VarMap) -> Result<()>;
}
