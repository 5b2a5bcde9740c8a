//! DDPG agent.
use super::DdpgConfig;
use crate::{
    agent::AgentDescription,
    mlp::{ActorBody, ActorBodyConfig, CriticBody, CriticBodyConfig},
    network::{load_varmaps, save_varmaps, Actor, Critic, Network, Target},
    noise::GaussianNoise,
    opt::Optimizer,
    util::{bootstrapped_target, check_finite, clamp_to_vec, state_tensor, NamedTensors, TensorBatch},
};
use anyhow::Result;
use candle_core::{Tensor, D};
use candle_nn::loss::mse;
use log::{debug, info, trace};
use std::path::Path;
use verge_core::{
    record::{Record, RecordValue},
    replay_buffer::{SimpleReplayBuffer, SimpleReplayBufferConfig, Transition, TransitionBatch},
    Agent, ExperienceBufferBase, ReplayBufferBase,
};

/// Deep deterministic policy gradient agent.
///
/// The critic is trained on the one-step TD target computed with the target
/// networks, the actor maximizes the critic's value of its own actions, then
/// both target networks track the online ones.
pub struct Ddpg {
    config: DdpgConfig,
    device: candle_core::Device,
    actor: Actor<ActorBody>,
    target_actor: Target<Actor<ActorBody>>,
    critic: Critic<CriticBody>,
    target_critic: Target<Critic<CriticBody>>,
    actor_opt: Optimizer,
    critic_opt: Optimizer,
    noise: GaussianNoise,
    buffer: SimpleReplayBuffer,
    iteration: usize,
    n_opts: usize,
    last_record: Option<Record>,
}

impl Ddpg {
    /// Constructs [`Ddpg`].
    ///
    /// The configuration is validated before any network is built.
    pub fn build(config: DdpgConfig) -> Result<Self> {
        config.validate()?;
        let device = config.device.to_candle()?;

        let actor_config = ActorBodyConfig::new(
            config.state_dim,
            config.hidden_layers.clone(),
            config.action_dim,
        );
        let critic_config = CriticBodyConfig::new(
            config.state_dim,
            config.action_dim,
            config.hidden_layers.clone(),
        );
        let actor = Actor::build(actor_config, &device)?;
        let critic = Critic::build(critic_config, &device)?;
        let target_actor = Target::build(&actor)?;
        let target_critic = Target::build(&critic)?;
        let actor_opt = config.actor_opt.build(actor.parameters())?;
        let critic_opt = config.critic_opt.build(critic.parameters())?;
        let noise = GaussianNoise::new(config.noise.clone(), config.action_dim, &device)?;
        let buffer = SimpleReplayBuffer::build(
            &SimpleReplayBufferConfig::default()
                .capacity(config.buffer_size)
                .batch_size(config.batch_size)
                .seed(config.seed),
        )?;

        let mut ddpg = Self {
            config,
            device,
            actor,
            target_actor,
            critic,
            target_critic,
            actor_opt,
            critic_opt,
            noise,
            buffer,
            iteration: 0,
            n_opts: 0,
            last_record: None,
        };
        ddpg.reset_agent()?;
        info!(
            "Built DDPG agent, state_dim = {}, action_dim = {}",
            ddpg.config.state_dim, ddpg.config.action_dim
        );

        Ok(ddpg)
    }

    fn noisy_action(&self, action: Tensor, noise_scale: f64) -> Result<Vec<f32>> {
        let action = action.squeeze(0)?;
        let action = if noise_scale != 0.0 {
            (action + self.noise.sample()?.affine(noise_scale, 0.0)?)?
        } else {
            action
        };
        clamp_to_vec(&action, self.config.clip)
    }

    /// Action of the online actor with additive noise scaled by `noise_scale`,
    /// clamped to the action bounds.
    pub fn act(&self, state: &[f32], noise_scale: f64) -> Result<Vec<f32>> {
        let state = state_tensor(state, self.config.state_dim, &self.device)?;
        let action = self.actor.forward(&state)?.detach();
        self.noisy_action(action, noise_scale)
    }

    /// Same as [`Ddpg::act`] with the target actor.
    pub fn target_act(&self, state: &[f32], noise_scale: f64) -> Result<Vec<f32>> {
        let state = state_tensor(state, self.config.state_dim, &self.device)?;
        let action = self.target_actor.forward(&state)?;
        self.noisy_action(action, noise_scale)
    }

    /// Stores a transition and learns if the schedule says so.
    pub fn step(&mut self, transition: Transition) -> Result<()> {
        self.buffer.push(transition)?;
        self.iteration += 1;

        if self.iteration < self.config.warm_up {
            return Ok(());
        }

        if self.buffer.len() >= self.config.batch_size
            && self.iteration % self.config.update_every_iterations == 0
        {
            for _ in 0..self.config.number_updates {
                self.learn_from_buffer()?;
            }
        }

        Ok(())
    }

    /// `reward + gamma * Q_target(s', actor_target(s'))`, zeroed bootstrap on terminal
    /// transitions. The returned tensor has no gradient.
    pub fn compute_q_target(&self, batch: &TensorBatch) -> Result<Tensor> {
        let next_action = self.target_actor.forward(&batch.next_state)?;
        let next_q = self
            .target_critic
            .forward(&batch.next_state, &next_action)?
            .squeeze(D::Minus1)?;
        Ok(bootstrapped_target(&batch.reward, &next_q, &batch.is_done, self.config.gamma)?.detach())
    }

    fn update_critic(&mut self, batch: &TensorBatch) -> Result<f32> {
        let q_target = self.compute_q_target(batch)?;
        let q = self
            .critic
            .forward(&batch.state, &batch.action)?
            .squeeze(D::Minus1)?;
        let loss = mse(&q, &q_target)?;
        self.critic_opt.backward_step(&loss)?;
        Ok(loss.to_scalar::<f32>()?)
    }

    fn update_actor(&mut self, batch: &TensorBatch) -> Result<f32> {
        let action = self.actor.forward(&batch.state)?;
        let loss = self.critic.forward(&batch.state, &action)?.mean_all()?.neg()?;
        self.actor_opt.backward_step(&loss)?;
        Ok(loss.to_scalar::<f32>()?)
    }

    fn soft_update(&mut self) -> Result<()> {
        self.target_actor.soft_update(&self.actor, self.config.tau)?;
        self.target_critic.soft_update(&self.critic, self.config.tau)
    }

    /// Updates the critic, then the actor, then the target networks on a batch.
    pub fn learn(&mut self, batch: TransitionBatch) -> Result<&Record> {
        let batch = TensorBatch::from_batch(batch, &self.device)?;

        trace!("update_critic()");
        let loss_critic = self.update_critic(&batch)?;
        trace!("update_actor()");
        let loss_actor = self.update_actor(&batch)?;
        trace!("soft_update()");
        self.soft_update()?;

        self.n_opts += 1;
        debug!(
            "n_opts = {}, loss_critic = {}, loss_actor = {}",
            self.n_opts, loss_critic, loss_actor
        );
        check_finite(loss_critic, "critic")?;
        check_finite(loss_actor, "actor")?;

        let record = Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic)),
            ("loss_actor", RecordValue::Scalar(loss_actor)),
        ]);
        Ok(self.last_record.insert(record))
    }

    /// Samples a batch from the replay buffer and learns from it.
    ///
    /// Fails with [`InsufficientData`](verge_core::AgentError::InsufficientData)
    /// if the buffer holds fewer than `batch_size` transitions.
    pub fn learn_from_buffer(&mut self) -> Result<&Record> {
        let batch = self.buffer.batch(self.config.batch_size)?;
        self.learn(batch)
    }

    /// Number of calls of [`Ddpg::learn`].
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// Number of steps.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// The replay buffer.
    pub fn buffer(&self) -> &SimpleReplayBuffer {
        &self.buffer
    }

    pub fn config(&self) -> &DdpgConfig {
        &self.config
    }

    fn varmaps(&self) -> [(&'static str, &candle_nn::VarMap); 4] {
        [
            ("actor", self.actor.varmap()),
            ("target_actor", self.target_actor.varmap()),
            ("critic", self.critic.varmap()),
            ("target_critic", self.target_critic.varmap()),
        ]
    }
}

impl Agent for Ddpg {
    type Description = AgentDescription;

    fn act(&mut self, state: &[f32], explore: f64) -> Result<Vec<f32>> {
        Ddpg::act(self, state, explore)
    }

    fn step(
        &mut self,
        state: &[f32],
        action: &[f32],
        reward: f32,
        next_state: &[f32],
        done: bool,
    ) -> Result<()> {
        let transition = Transition::new(
            state.to_vec(),
            action.to_vec(),
            reward,
            next_state.to_vec(),
            done,
        );
        Ddpg::step(self, transition)
    }

    fn reset_agent(&mut self) -> Result<()> {
        self.actor.reset_parameters()?;
        self.critic.reset_parameters()?;
        self.target_actor.hard_update(&self.actor)?;
        self.target_critic.hard_update(&self.critic)?;
        info!("Reset parameters of DDPG agent");
        Ok(())
    }

    fn describe_agent(&self) -> Result<AgentDescription> {
        let mut desc = AgentDescription::default();
        for (name, varmap) in self.varmaps().iter() {
            desc.push(*name, NamedTensors::copy_from(varmap)?);
        }
        Ok(desc)
    }

    fn last_record(&self) -> Option<&Record> {
        self.last_record.as_ref()
    }

    fn save_state(&self, path: &Path) -> Result<()> {
        save_varmaps(path, &self.varmaps())?;
        info!("Saved DDPG agent to {:?}", path);
        Ok(())
    }

    fn load_state(&mut self, path: &Path) -> Result<()> {
        load_varmaps(path, &self.varmaps(), &self.device)?;
        info!("Loaded DDPG agent from {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use candle_core::DType;

    fn ddpg() -> Result<Ddpg> {
        Ddpg::build(
            DdpgConfig::new(3, 1)
                .hidden_layers(vec![16, 16])
                .batch_size(4)
                .buffer_size(10),
        )
    }

    #[test]
    fn test_terminal_q_target() -> Result<()> {
        let ddpg = ddpg()?;
        let batch = TransitionBatch::from_transitions(
            [
                Transition::new(vec![0.0; 3], vec![0.0], 5.0, vec![1e3; 3], true),
                Transition::new(vec![0.0; 3], vec![0.0], 5.0, vec![1.0; 3], false),
            ]
            .iter(),
            vec![0, 1],
        );
        let batch = TensorBatch::from_batch(batch, &candle_core::Device::Cpu)?;
        let q_target = ddpg.compute_q_target(&batch)?.to_vec1::<f32>()?;

        let next_action = ddpg.target_act(&[1.0; 3], 0.0)?;
        let next_q = ddpg
            .target_critic
            .forward(
                &Tensor::ones((1, 3), DType::F32, &candle_core::Device::Cpu)?,
                &Tensor::from_slice(&next_action, (1, 1), &candle_core::Device::Cpu)?,
            )?
            .flatten_all()?
            .to_vec1::<f32>()?[0];

        assert_eq!(q_target[0], 5.0);
        assert!((q_target[1] - (5.0 + 0.99 * next_q)).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_warm_up_and_cadence() -> Result<()> {
        let mut ddpg = Ddpg::build(
            DdpgConfig::new(3, 1)
                .hidden_layers(vec![8])
                .batch_size(2)
                .buffer_size(10)
                .warm_up(4)
                .update_every_iterations(2)
                .number_updates(3),
        )?;
        let tr = || Transition::new(vec![0.1; 3], vec![0.2], 1.0, vec![0.3; 3], false);

        for _ in 0..3 {
            ddpg.step(tr())?;
        }
        assert_eq!(ddpg.n_opts(), 0);
        ddpg.step(tr())?;
        assert_eq!(ddpg.n_opts(), 3);
        ddpg.step(tr())?;
        assert_eq!(ddpg.n_opts(), 3);
        ddpg.step(tr())?;
        assert_eq!(ddpg.n_opts(), 6);
        Ok(())
    }

    #[test]
    fn test_rejected_transition_keeps_cadence() -> Result<()> {
        let mut ddpg = ddpg()?;
        ddpg.step(Transition::new(vec![0.1; 3], vec![0.2], 1.0, vec![0.3; 3], false))?;
        let bad = Transition::new(vec![0.1; 3], vec![0.2, 0.2], 1.0, vec![0.3; 3], false);
        assert!(ddpg.step(bad).is_err());
        assert_eq!(ddpg.iteration(), 1);
        assert_eq!(ddpg.buffer().len(), 1);
        Ok(())
    }

    #[test]
    fn test_act_rejects_wrong_state() -> Result<()> {
        let ddpg = ddpg()?;
        assert!(ddpg.act(&[0.0; 2], 0.0).is_err());
        assert_eq!(ddpg.act(&[0.0; 3], 0.0)?.len(), 1);
        Ok(())
    }
}
