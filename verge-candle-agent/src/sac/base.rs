//! SAC agent.
use super::{EntCoef, SacConfig};
use crate::{
    agent::AgentDescription,
    mlp::{ActorBody, ActorBodyConfig, CriticBodyConfig, DoubleCritic},
    network::{load_varmaps, save_varmaps, Actor, Critic, Network, Target},
    opt::Optimizer,
    policy::GaussianPolicy,
    util::{
        bootstrapped_target, check_finite, clamp_to_vec, clip_grad_norm, state_tensor,
        NamedTensors, TensorBatch,
    },
};
use anyhow::Result;
use candle_core::{Tensor, D};
use candle_nn::{loss::mse, VarMap};
use log::{debug, info, trace};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::Path;
use verge_core::{
    record::{Record, RecordValue},
    replay_buffer::{SimpleReplayBuffer, SimpleReplayBufferConfig, Transition, TransitionBatch},
    Agent, ExperienceBufferBase, ReplayBufferBase,
};

/// Soft actor-critic agent.
///
/// The actor outputs the mean of a diagonal Gaussian policy whose standard
/// deviation is learned together with the actor. Two critics are trained on a
/// common entropy-regularized target computed with the target double critic.
pub struct Sac {
    config: SacConfig,
    device: candle_core::Device,
    actor: Actor<ActorBody>,
    policy: GaussianPolicy,
    critic: Critic<DoubleCritic>,
    target_critic: Target<Critic<DoubleCritic>>,
    ent_coef: EntCoef,
    actor_opt: Optimizer,
    critic_opt: Optimizer,
    buffer: SimpleReplayBuffer,
    rng: StdRng,
    iteration: usize,
    n_opts: usize,
    last_record: Option<Record>,
}

impl Sac {
    /// Constructs [`Sac`].
    ///
    /// The configuration is validated before any network is built.
    pub fn build(config: SacConfig) -> Result<Self> {
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
        let policy = GaussianPolicy::build(config.action_dim, config.init_std, &device)?;
        let critic = Critic::build(critic_config, &device)?;
        let target_critic = Target::build(&critic)?;
        let ent_coef = EntCoef::new(
            config.alpha,
            config.alpha_lr,
            -(config.action_dim as f64),
            config.max_grad_norm_alpha,
            &device,
        )?;

        let actor_opt = {
            let mut vars = actor.parameters();
            vars.extend(policy.parameters());
            config.actor_opt.build(vars)?
        };
        let critic_opt = config.critic_opt.build(critic.parameters())?;
        let buffer = SimpleReplayBuffer::build(
            &SimpleReplayBufferConfig::default()
                .capacity(config.buffer_size)
                .batch_size(config.batch_size)
                .seed(config.seed),
        )?;
        let rng = StdRng::seed_from_u64(config.seed);

        let mut sac = Self {
            config,
            device,
            actor,
            policy,
            critic,
            target_critic,
            ent_coef,
            actor_opt,
            critic_opt,
            buffer,
            rng,
            iteration: 0,
            n_opts: 0,
            last_record: None,
        };
        sac.reset_agent()?;
        info!(
            "Built SAC agent, state_dim = {}, action_dim = {}, alpha tuning = {}",
            sac.config.state_dim,
            sac.config.action_dim,
            !sac.ent_coef.is_frozen()
        );

        Ok(sac)
    }

    /// Returns an action.
    ///
    /// With probability `epsilon` the action is drawn uniformly from the action
    /// bounds. Otherwise it is the policy mean (`deterministic`) or a sample of the
    /// policy, multiplied by `action_scale` and clamped to the bounds.
    pub fn act_with(&mut self, state: &[f32], epsilon: f64, deterministic: bool) -> Result<Vec<f32>> {
        let state = state_tensor(state, self.config.state_dim, &self.device)?;
        let (min, max) = self.config.clip;

        if self.rng.gen::<f64>() < epsilon {
            let rng = &mut self.rng;
            return Ok((0..self.config.action_dim)
                .map(|_| rng.gen_range(min..max))
                .collect());
        }

        let mean = self.actor.forward(&state)?.detach();
        let action = if deterministic {
            mean
        } else {
            self.policy.rsample(&mean)?.detach()
        };
        let action = action.squeeze(0)?.affine(self.config.action_scale, 0.0)?;
        clamp_to_vec(&action, self.config.clip)
    }

    /// Stores a transition and learns if the schedule says so.
    pub fn step(&mut self, transition: Transition) -> Result<()> {
        self.buffer.push(transition)?;
        self.iteration += 1;

        if self.iteration < self.config.warm_up {
            return Ok(());
        }

        if self.buffer.len() >= self.config.batch_size
            && self.iteration % self.config.update_freq == 0
        {
            for _ in 0..self.config.number_updates {
                self.learn_from_buffer()?;
            }
        }

        Ok(())
    }

    /// Entropy-regularized TD target.
    ///
    /// Next actions are sampled from the policy of the current actor, their values
    /// are the minimum over the target double critic. The returned tensor has no
    /// gradient.
    pub fn compute_q_target(&self, batch: &TensorBatch) -> Result<Tensor> {
        let mean = self.actor.forward(&batch.next_state)?;
        let next_action = self.policy.rsample(&mean)?;
        let log_prob = self.policy.log_prob(&mean, &next_action)?;
        let (q1, q2) = self
            .target_critic
            .forward(&batch.next_state, &next_action.detach())?;
        let next_v = (q1.minimum(&q2)?.squeeze(D::Minus1)?
            - log_prob.broadcast_mul(&self.ent_coef.alpha()?)?)?
        .detach();
        Ok(bootstrapped_target(&batch.reward, &next_v, &batch.is_done, self.config.gamma)?.detach())
    }

    fn update_critic(&mut self, batch: &TensorBatch) -> Result<f32> {
        let q_target = self.compute_q_target(batch)?;
        let (q1, q2) = self.critic.forward(&batch.state, &batch.action)?;
        let loss = (mse(&q1.squeeze(D::Minus1)?, &q_target)?
            + mse(&q2.squeeze(D::Minus1)?, &q_target)?)?;

        let mut grads = loss.backward()?;
        let norm = clip_grad_norm(
            &mut grads,
            &self.critic.parameters(),
            self.config.max_grad_norm_critic,
        )?;
        trace!("critic grad norm = {}", norm);
        self.critic_opt.step(&grads)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    /// Returns the loss and the detached log probabilities of the sampled actions.
    fn update_actor(&mut self, batch: &TensorBatch) -> Result<(f32, Tensor)> {
        let mean = self.actor.forward(&batch.state)?;
        let action = self.policy.rsample(&mean)?;
        let log_prob = self.policy.log_prob(&mean, &action)?;
        let (q1, q2) = self.critic.forward(&batch.state, &action)?;
        let q = q1.minimum(&q2)?.squeeze(D::Minus1)?;
        let loss = (log_prob.broadcast_mul(&self.ent_coef.alpha()?)? - q)?.mean_all()?;

        let mut grads = loss.backward()?;
        let mut vars = self.actor.parameters();
        vars.extend(self.policy.parameters());
        let norm = clip_grad_norm(&mut grads, &vars, self.config.max_grad_norm_actor)?;
        trace!("actor grad norm = {}", norm);
        self.actor_opt.step(&grads)?;

        Ok((loss.to_scalar::<f32>()?, log_prob.detach()))
    }

    /// Updates the critics, the actor, the entropy coefficient, then the target
    /// critics on a batch.
    pub fn learn(&mut self, batch: TransitionBatch) -> Result<&Record> {
        let batch = TensorBatch::from_batch(batch, &self.device)?;

        trace!("update_critic()");
        let loss_critic = self.update_critic(&batch)?;
        trace!("update_actor()");
        let (loss_actor, log_prob) = self.update_actor(&batch)?;
        trace!("update_ent_coef()");
        let loss_alpha = self.ent_coef.update(&log_prob)?;
        trace!("soft_update()");
        self.target_critic
            .soft_update(&self.critic, self.config.tau)?;

        self.n_opts += 1;
        let alpha = self.ent_coef.alpha_value()?;
        debug!(
            "n_opts = {}, loss_critic = {}, loss_actor = {}, alpha = {}",
            self.n_opts, loss_critic, loss_actor, alpha
        );
        check_finite(loss_critic, "critic")?;
        check_finite(loss_actor, "actor")?;

        let mut record = Record::from_slice(&[
            ("loss_critic", RecordValue::Scalar(loss_critic)),
            ("loss_actor", RecordValue::Scalar(loss_actor)),
            ("alpha", RecordValue::Scalar(alpha)),
        ]);
        if let Some(loss_alpha) = loss_alpha {
            check_finite(loss_alpha, "alpha")?;
            record.insert("loss_alpha", RecordValue::Scalar(loss_alpha));
        }
        record.insert("policy_std", RecordValue::Array1(self.policy.std_vec()?));
        Ok(self.last_record.insert(record))
    }

    /// Current entropy coefficient.
    pub fn alpha(&self) -> Result<f32> {
        self.ent_coef.alpha_value()
    }

    /// Samples a batch from the replay buffer and learns from it.
    ///
    /// Fails with [`InsufficientData`](verge_core::AgentError::InsufficientData)
    /// if the buffer holds fewer than `batch_size` transitions.
    pub fn learn_from_buffer(&mut self) -> Result<&Record> {
        let batch = self.buffer.batch(self.config.batch_size)?;
        self.learn(batch)
    }

    /// Number of calls of [`Sac::learn`].
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

    pub fn config(&self) -> &SacConfig {
        &self.config
    }

    fn varmaps(&self) -> [(&'static str, &VarMap); 5] {
        [
            ("actor", self.actor.varmap()),
            ("policy", self.policy.varmap()),
            ("double_critic", self.critic.varmap()),
            ("target_double_critic", self.target_critic.varmap()),
            ("ent_coef", self.ent_coef.varmap()),
        ]
    }
}

impl Agent for Sac {
    type Description = AgentDescription;

    /// Stochastic action with probability `explore` of a uniformly random one.
    fn act(&mut self, state: &[f32], explore: f64) -> Result<Vec<f32>> {
        self.act_with(state, explore, false)
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
        Sac::step(self, transition)
    }

    /// Reinitializes the actor and the double critic. The policy standard
    /// deviation and the entropy coefficient are kept.
    fn reset_agent(&mut self) -> Result<()> {
        self.actor.reset_parameters()?;
        self.critic.reset_parameters()?;
        self.target_critic.hard_update(&self.critic)?;
        info!("Reset parameters of SAC agent");
        Ok(())
    }

    fn describe_agent(&self) -> Result<AgentDescription> {
        let mut desc = AgentDescription::default();
        desc.push("actor", NamedTensors::copy_from(self.actor.varmap())?);
        desc.push("double_critic", NamedTensors::copy_from(self.critic.varmap())?);
        desc.push("target_double_critic", self.target_critic.snapshot()?);
        Ok(desc)
    }

    fn last_record(&self) -> Option<&Record> {
        self.last_record.as_ref()
    }

    fn save_state(&self, path: &Path) -> Result<()> {
        save_varmaps(path, &self.varmaps())?;
        info!("Saved SAC agent to {:?}", path);
        Ok(())
    }

    fn load_state(&mut self, path: &Path) -> Result<()> {
        load_varmaps(path, &self.varmaps(), &self.device)?;
        info!("Loaded SAC agent from {:?}", path);
        Ok(())
    }
}
