use super::{Actor, Critic, Network};
use crate::{
    model::{SubModel1, SubModel2},
    util::{hard_update, track, NamedTensors},
};
use anyhow::Result;
use candle_core::Tensor;
use candle_nn::VarMap;

/// Outputs that can be cut from the computation graph.
pub trait Detach {
    /// Returns the value without gradient tracking.
    fn detach(self) -> Self;
}

impl Detach for Tensor {
    fn detach(self) -> Self {
        Tensor::detach(&self)
    }
}

impl Detach for (Tensor, Tensor) {
    fn detach(self) -> Self {
        (Tensor::detach(&self.0), Tensor::detach(&self.1))
    }
}

/// Target network tracking an online network.
///
/// Its variables are changed only by [`Target::hard_update`] and
/// [`Target::soft_update`], and its outputs are detached.
pub struct Target<T: Network> {
    net: T,
}

impl<T: Network> Target<T> {
    /// Creates a copy of `src`.
    pub fn build(src: &T) -> Result<Self> {
        let net = src.duplicate()?;
        hard_update(net.varmap(), src.varmap())?;
        Ok(Self { net })
    }

    /// Overwrites the variables with those of `src`.
    pub fn hard_update(&self, src: &T) -> Result<()> {
        hard_update(self.net.varmap(), src.varmap())
    }

    /// `target = tau * src + (1 - tau) * target`.
    pub fn soft_update(&self, src: &T, tau: f64) -> Result<()> {
        track(self.net.varmap(), src.varmap(), tau)
    }

    /// Copies the current variables.
    pub fn snapshot(&self) -> Result<NamedTensors> {
        NamedTensors::copy_from(self.net.varmap())
    }

    /// Variables, for persistence.
    pub fn varmap(&self) -> &VarMap {
        self.net.varmap()
    }
}

impl<P> Target<Actor<P>>
where
    P: SubModel1<Input = Tensor>,
    P::Config: Clone,
    P::Output: Detach,
{
    /// Detached forward pass of the target actor.
    pub fn forward(&self, state: &Tensor) -> Result<P::Output> {
        Ok(self.net.forward(state)?.detach())
    }
}

impl<Q> Target<Critic<Q>>
where
    Q: SubModel2<Input1 = Tensor, Input2 = Tensor>,
    Q::Config: Clone,
    Q::Output: Detach,
{
    /// Detached forward pass of the target critic.
    pub fn forward(&self, state: &Tensor, action: &Tensor) -> Result<Q::Output> {
        Ok(self.net.forward(state, action)?.detach())
    }
}
