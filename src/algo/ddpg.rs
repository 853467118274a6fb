//! Deep Deterministic Policy Gradient (DDPG)
//!
//! Off-policy actor-critic for continuous actions where each observation is split into
//! a lidar scan and a position vector.
//!
//! # Algorithm Overview
//!
//! The agent maintains:
//! - **Actor** `μ(s)`: deterministic action in `[-max_action, max_action]^A`
//! - **Critic** `Q(s, a)`: single action-value head
//! - **Target networks** `μ'`, `Q'`: frozen copies moved by Polyak averaging
//!
//! One call to [`DdpgAgent::train`] performs:
//! 1. `y = r + not_done · γ · Q'(s', μ'(s'))` (no gradient)
//! 2. critic step on `MSE(Q(s, a), y)`
//! 3. actor step on `-mean Q(s, μ(s))`, through the freshly updated critic
//! 4. `θ' ← τθ + (1 − τ)θ'` for the critic, then the actor
//!
//! # Usage Example
//!
//! ```rust,ignore
//! use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
//! use rl::{algo::ddpg::{DdpgAgent, DdpgConfig}, memory::ReplayMemory};
//!
//! type Backend = Autodiff<NdArray>;
//!
//! let device = NdArrayDevice::default();
//! let config = DdpgConfig::new(1080, 4, 50, 2, 1.0, 256).with_actor_recurrent(true);
//! let mut agent = DdpgAgent::<Backend>::new(config, &device)?;
//! let mut replay = ReplayMemory::new(1_000_000, 1080, 4, 2, &device)?;
//!
//! let mut memory = agent.initial_recurrent_state();
//! let (action, next) = agent.select_action_with_state(&lidar, &position, memory)?;
//! memory = next;
//! // ... push the transition, then
//! let metrics = agent.train(&mut replay, 100)?;
//! agent.save("runs/ddpg")?;
//! ```
//!
//! Reference: "Continuous control with deep reinforcement learning" (Lillicrap et al., 2015)

use std::path::Path;

use burn::{
    module::AutodiffModule,
    nn::loss::{MseLoss, Reduction},
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use tracing::{debug, info, warn};

use crate::{
    checkpoint::{self, read_artifact, ArtifactPaths},
    error::{self, ensure_device, ensure_dim, DdpgError},
    memory::{TransitionBatch, TransitionSampler},
    nn::{
        actor::ActorRecord, critic::CriticRecord, param_shapes, soft_update, Actor, ActorConfig,
        Critic, CriticConfig, RecurrentState, TemporalMode,
    },
    traits::{ToTensor, TrainableAgent, TrainingMetrics},
};

/// Batch size used by callers that do not pick one.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Configuration for the DDPG agent
#[derive(Config, Debug)]
pub struct DdpgConfig {
    /// Raw lidar length `L`
    pub lidar_state_dim: usize,
    /// Position vector length `P`
    pub position_state_dim: usize,
    /// Compressed lidar length `F`
    pub lidar_feature_dim: usize,
    /// Action length `A`
    pub action_dim: usize,
    /// Symmetric bound applied to every action component
    pub max_action: f64,
    /// Width `H` of every hidden layer and of the LSTM memory
    pub hidden_dim: usize,
    /// Discount factor γ
    #[config(default = 0.99)]
    pub discount: f64,
    /// Soft update coefficient τ
    #[config(default = 0.005)]
    pub tau: f64,
    /// Adam learning rate shared by actor and critic
    #[config(default = 3e-4)]
    pub learning_rate: f64,
    /// Use an LSTM temporal encoder in the actor
    #[config(default = false)]
    pub actor_recurrent: bool,
    /// Use an LSTM temporal encoder in the critic
    #[config(default = false)]
    pub critic_recurrent: bool,
}

impl DdpgConfig {
    /// Reject hyperparameters the agent cannot run with.
    pub fn validate(&self) -> error::Result<()> {
        let dims = [
            ("lidar_state_dim", self.lidar_state_dim),
            ("position_state_dim", self.position_state_dim),
            ("lidar_feature_dim", self.lidar_feature_dim),
            ("action_dim", self.action_dim),
            ("hidden_dim", self.hidden_dim),
        ];
        if let Some((name, _)) = dims.iter().find(|(_, dim)| *dim == 0) {
            return Err(DdpgError::InvalidConfig(format!("{name} must be positive")));
        }
        if !(self.max_action.is_finite() && self.max_action > 0.0) {
            return Err(DdpgError::InvalidConfig(format!(
                "max_action must be positive and finite, got {}",
                self.max_action
            )));
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(DdpgError::InvalidConfig(format!(
                "discount must lie in [0, 1], got {}",
                self.discount
            )));
        }
        if !(0.0..=1.0).contains(&self.tau) {
            return Err(DdpgError::InvalidConfig(format!(
                "tau must lie in [0, 1], got {}",
                self.tau
            )));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(DdpgError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    pub fn actor_config(&self) -> ActorConfig {
        ActorConfig::new(
            self.lidar_state_dim,
            self.position_state_dim,
            self.lidar_feature_dim,
            self.action_dim,
            self.hidden_dim,
            self.max_action,
        )
        .with_recurrent(self.actor_recurrent)
    }

    pub fn critic_config(&self) -> CriticConfig {
        CriticConfig::new(
            self.lidar_state_dim,
            self.position_state_dim,
            self.lidar_feature_dim,
            self.action_dim,
            self.hidden_dim,
        )
        .with_recurrent(self.critic_recurrent)
    }
}

/// Lifecycle of the agent. Training and evaluation can be toggled freely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentMode {
    Constructed,
    Training,
    Evaluating,
}

type ActorOptimizer<B> = OptimizerAdaptor<Adam, Actor<B>, B>;
type CriticOptimizer<B> = OptimizerAdaptor<Adam, Critic<B>, B>;

/// Adam with β1 = 0.9, β2 = 0.999, ε = 1e-8 and no weight decay.
fn adam<B: AutodiffBackend, M: AutodiffModule<B>>() -> OptimizerAdaptor<Adam, M, B> {
    AdamConfig::new()
        .with_beta_1(0.9)
        .with_beta_2(0.999)
        .with_epsilon(1e-8)
        .init()
}

/// A batch lifted to the `[batch, seq = 1, features]` layout the networks consume.
struct SequenceBatch<B: Backend> {
    lidar: Tensor<B, 3>,
    position: Tensor<B, 3>,
    action: Tensor<B, 3>,
    next_lidar: Tensor<B, 3>,
    next_position: Tensor<B, 3>,
    reward: Tensor<B, 3>,
    not_done: Tensor<B, 3>,
}

impl<B: Backend> SequenceBatch<B> {
    fn lift(batch: TransitionBatch<B>) -> Self {
        Self {
            lidar: batch.lidar.unsqueeze_dim(1),
            position: batch.position.unsqueeze_dim(1),
            action: batch.action.unsqueeze_dim(1),
            next_lidar: batch.next_lidar.unsqueeze_dim(1),
            next_position: batch.next_position.unsqueeze_dim(1),
            reward: batch.reward.unsqueeze_dim(1),
            not_done: batch.not_done.unsqueeze_dim(1),
        }
    }
}

/// DDPG agent
///
/// Generic over the autodiff backend `B`. Every tensor the agent creates lives on the
/// device given to [`DdpgAgent::new`].
pub struct DdpgAgent<B: AutodiffBackend> {
    actor: Actor<B>,
    actor_target: Actor<B>,
    critic: Critic<B>,
    critic_target: Critic<B>,

    actor_optimizer: ActorOptimizer<B>,
    critic_optimizer: CriticOptimizer<B>,

    config: DdpgConfig,
    device: B::Device,

    mode: AgentMode,
    total_steps: usize,
}

impl<B: AutodiffBackend> DdpgAgent<B> {
    /// Build the live networks, their frozen targets and one Adam optimizer each.
    pub fn new(config: DdpgConfig, device: &B::Device) -> error::Result<Self> {
        config.validate()?;

        let actor: Actor<B> = config.actor_config().init(device);
        let critic: Critic<B> = config.critic_config().init(device);
        let actor_target = actor.clone().no_grad();
        let critic_target = critic.clone().no_grad();

        info!(
            device = ?device,
            actor_recurrent = config.actor_recurrent,
            critic_recurrent = config.critic_recurrent,
            hidden_dim = config.hidden_dim,
            actor_params = actor.num_params(),
            critic_params = critic.num_params(),
            "ddpg agent constructed"
        );

        Ok(Self {
            actor,
            actor_target,
            critic,
            critic_target,
            actor_optimizer: adam(),
            critic_optimizer: adam(),
            config,
            device: device.clone(),
            mode: AgentMode::Constructed,
            total_steps: 0,
        })
    }

    pub fn config(&self) -> &DdpgConfig {
        &self.config
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn mode(&self) -> AgentMode {
        self.mode
    }

    pub fn actor(&self) -> &Actor<B> {
        &self.actor
    }

    pub fn critic(&self) -> &Critic<B> {
        &self.critic
    }

    /// Zeroed `(hidden, cell)` of shape `[1, 1, hidden_dim]` for a recurrent actor,
    /// `None` otherwise. Call at the start of every rollout.
    pub fn initial_recurrent_state(&self) -> Option<RecurrentState<B::InnerBackend>> {
        match self.actor.temporal_mode() {
            TemporalMode::Recurrent => Some(RecurrentState::zeros(
                1,
                self.config.hidden_dim,
                &self.device,
            )),
            TemporalMode::Stateless => None,
        }
    }

    /// Deterministic action for one observation. No exploration noise is added.
    ///
    /// A recurrent actor starts from zero memory on every call; use
    /// [`DdpgAgent::select_action_with_state`] to carry memory across steps.
    pub fn select_action(&self, lidar: &[f32], position: &[f32]) -> error::Result<Vec<f32>> {
        let (action, _) = self.select_action_with_state(lidar, position, None)?;
        Ok(action)
    }

    /// Like [`DdpgAgent::select_action`], threading the recurrent memory through.
    pub fn select_action_with_state(
        &self,
        lidar: &[f32],
        position: &[f32],
        state: Option<RecurrentState<B::InnerBackend>>,
    ) -> error::Result<(Vec<f32>, Option<RecurrentState<B::InnerBackend>>)> {
        ensure_dim("lidar", self.config.lidar_state_dim, lidar.len())?;
        ensure_dim("position", self.config.position_state_dim, position.len())?;
        if let Some(state) = &state {
            self.check_state(state)?;
        }

        let actor = self.actor.valid();
        let lidar: Tensor<B::InnerBackend, 1> = lidar.to_vec().to_tensor(&self.device);
        let position: Tensor<B::InnerBackend, 1> = position.to_vec().to_tensor(&self.device);

        let (action, next_state) = actor.forward(
            lidar.reshape([1, 1, self.config.lidar_state_dim]),
            position.reshape([1, 1, self.config.position_state_dim]),
            state,
        );

        let action: Vec<f32> = action.into_data().iter::<f32>().collect();
        Ok((action, next_state))
    }

    fn check_state(&self, state: &RecurrentState<B::InnerBackend>) -> error::Result<()> {
        ensure_dim("recurrent state batch", 1, state.batch_size())?;
        ensure_dim("recurrent state width", self.config.hidden_dim, state.hidden_dim())?;
        ensure_device("recurrent state", &self.device, &state.hidden.device())?;
        ensure_device("recurrent state", &self.device, &state.cell.device())
    }

    /// Bootstrapped critic target `r + not_done · γ · Q'(s', μ'(s'))`, shape `[N, 1]`.
    pub fn target_q(&self, batch: TransitionBatch<B>) -> error::Result<Tensor<B, 2>> {
        self.check_batch(&batch, batch.len())?;
        let batch = SequenceBatch::lift(batch);
        Ok(self.bootstrap_target(&batch).squeeze(1))
    }

    /// One DDPG update on a batch of `batch_size` transitions drawn from `sampler`.
    ///
    /// A non-finite loss aborts the update before the matching optimizer step; if the
    /// actor loss is the one that fails, the critic step has already been applied.
    pub fn train<S: TransitionSampler<B>>(
        &mut self,
        sampler: &mut S,
        batch_size: usize,
    ) -> error::Result<TrainingMetrics> {
        let batch = sampler
            .sample(batch_size)
            .ok_or(DdpgError::InsufficientSamples { requested: batch_size })?;
        self.check_batch(&batch, batch_size)?;
        let batch = SequenceBatch::lift(batch);

        let target = self.bootstrap_target(&batch);
        let mean_target_q = target.clone().mean().into_scalar().elem::<f32>();

        let (critic_loss, mean_current_q) = self.update_critic(&batch, target)?;
        let actor_loss = self.update_actor(&batch)?;
        self.soft_update_targets();

        self.total_steps += 1;

        debug!(
            step = self.total_steps,
            critic_loss,
            actor_loss,
            mean_current_q,
            mean_target_q,
            "ddpg update"
        );

        Ok(TrainingMetrics {
            critic_loss,
            actor_loss,
            mean_current_q,
            mean_target_q,
        })
    }

    /// Every column must be on the agent's device with the constructed widths.
    ///
    /// `requested` is the batch size reported when the batch turns out empty.
    fn check_batch(&self, batch: &TransitionBatch<B>, requested: usize) -> error::Result<()> {
        let rows = batch.len();
        if rows == 0 {
            return Err(DdpgError::InsufficientSamples { requested });
        }

        let widths = [
            self.config.lidar_state_dim,
            self.config.position_state_dim,
            self.config.action_dim,
            self.config.lidar_state_dim,
            self.config.position_state_dim,
            1,
            1,
        ];
        for ((what, column), width) in batch.columns().into_iter().zip(widths) {
            let [n, w] = column.dims();
            ensure_dim(what, rows, n)?;
            ensure_dim(what, width, w)?;
            ensure_device(what, &self.device, &column.device())?;
        }
        Ok(())
    }

    fn bootstrap_target(&self, batch: &SequenceBatch<B>) -> Tensor<B, 3> {
        let (next_action, _) =
            self.actor_target
                .forward(batch.next_lidar.clone(), batch.next_position.clone(), None);
        let next_q = self
            .critic_target
            .forward(batch.next_lidar.clone(), batch.next_position.clone(), next_action);

        batch
            .reward
            .clone()
            .add(batch.not_done.clone().mul(next_q).mul_scalar(self.config.discount))
            .detach()
    }

    /// Returns `(loss, mean Q(s, a))`.
    fn update_critic(
        &mut self,
        batch: &SequenceBatch<B>,
        target: Tensor<B, 3>,
    ) -> error::Result<(f32, f32)> {
        let current_q = self
            .critic
            .forward(batch.lidar.clone(), batch.position.clone(), batch.action.clone());
        let mean_current_q = current_q.clone().detach().mean().into_scalar().elem::<f32>();

        let loss = MseLoss::new().forward(current_q, target, Reduction::Mean);
        let loss_val = loss.clone().into_scalar().elem::<f32>();
        ensure_finite("critic", loss_val)?;

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.critic);
        self.critic = self
            .critic_optimizer
            .step(self.config.learning_rate, self.critic.clone(), grads);

        Ok((loss_val, mean_current_q))
    }

    fn update_actor(&mut self, batch: &SequenceBatch<B>) -> error::Result<f32> {
        let lidar = batch.lidar.clone().detach();
        let position = batch.position.clone().detach();

        let (action, _) = self.actor.forward(lidar.clone(), position.clone(), None);
        let q = self.critic.forward(lidar, position, action);

        // maximize Q = minimize -Q
        let loss = q.mean().neg();
        let loss_val = loss.clone().into_scalar().elem::<f32>();
        ensure_finite("actor", loss_val)?;

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &self.actor);
        self.actor = self
            .actor_optimizer
            .step(self.config.learning_rate, self.actor.clone(), grads);

        Ok(loss_val)
    }

    #[inline]
    fn soft_update_targets(&mut self) {
        let tau = self.config.tau;
        self.critic_target = soft_update::<B, _>(&self.critic, self.critic_target.clone(), tau);
        self.actor_target = soft_update::<B, _>(&self.actor, self.actor_target.clone(), tau);
    }

    /// Write critic, critic optimizer, actor and actor optimizer under `prefix`.
    ///
    /// Target networks are not persisted.
    pub fn save(&self, prefix: impl AsRef<Path>) -> error::Result<()> {
        let paths = ArtifactPaths::from_prefix(prefix);

        let critic = checkpoint::encode::<B, _>(self.critic.clone().into_record())?;
        let critic_optimizer = checkpoint::encode::<B, _>(self.critic_optimizer.to_record())?;
        let actor = checkpoint::encode::<B, _>(self.actor.clone().into_record())?;
        let actor_optimizer = checkpoint::encode::<B, _>(self.actor_optimizer.to_record())?;

        checkpoint::write_all_atomic(&[
            (paths.critic.as_path(), critic.as_slice()),
            (paths.critic_optimizer.as_path(), critic_optimizer.as_slice()),
            (paths.actor.as_path(), actor.as_slice()),
            (paths.actor_optimizer.as_path(), actor_optimizer.as_slice()),
        ])?;

        info!(actor = %paths.actor.display(), step = self.total_steps, "ddpg checkpoint saved");
        Ok(())
    }

    /// Restore the four artifacts written by [`DdpgAgent::save`].
    ///
    /// Nothing changes unless all four decode and match the constructed architecture.
    /// On success the targets are reset to frozen copies of the loaded networks.
    pub fn load(&mut self, prefix: impl AsRef<Path>) -> error::Result<()> {
        let paths = ArtifactPaths::from_prefix(prefix);
        if let Err(err) = paths.ensure_complete() {
            warn!(error = %err, "ddpg checkpoint incomplete");
            return Err(err);
        }

        let critic_record: CriticRecord<B> =
            checkpoint::decode::<B, _>(read_artifact(&paths.critic)?, &self.device)?;
        let critic_optimizer_record =
            checkpoint::decode::<B, _>(read_artifact(&paths.critic_optimizer)?, &self.device)?;
        let actor_record: ActorRecord<B> =
            checkpoint::decode::<B, _>(read_artifact(&paths.actor)?, &self.device)?;
        let actor_optimizer_record =
            checkpoint::decode::<B, _>(read_artifact(&paths.actor_optimizer)?, &self.device)?;

        let critic = self.restore_critic(critic_record)?;
        let actor = self.restore_actor(actor_record)?;
        let critic_optimizer = adam::<B, Critic<B>>().load_record(critic_optimizer_record);
        let actor_optimizer = adam::<B, Actor<B>>().load_record(actor_optimizer_record);

        self.critic_target = critic.clone().no_grad();
        self.actor_target = actor.clone().no_grad();
        self.critic = critic;
        self.actor = actor;
        self.critic_optimizer = critic_optimizer;
        self.actor_optimizer = actor_optimizer;

        info!(actor = %paths.actor.display(), "ddpg checkpoint loaded");
        Ok(())
    }

    fn restore_critic(&self, record: CriticRecord<B>) -> error::Result<Critic<B>> {
        ensure_same_mode(
            "critic recurrent layers",
            self.critic.temporal_mode(),
            record.temporal_mode(),
        )?;
        let restored = self.critic.clone().load_record(record);
        ensure_same_shapes::<B, _>("critic parameter", &self.critic, &restored)?;
        Ok(restored)
    }

    fn restore_actor(&self, record: ActorRecord<B>) -> error::Result<Actor<B>> {
        ensure_same_mode(
            "actor recurrent layers",
            self.actor.temporal_mode(),
            record.temporal_mode(),
        )?;
        let restored = self.actor.clone().load_record(record);
        ensure_same_shapes::<B, _>("actor parameter", &self.actor, &restored)?;
        Ok(restored)
    }

    /// Switch to evaluation. Parameters are untouched.
    pub fn eval_mode(&mut self) {
        self.set_mode(AgentMode::Evaluating);
    }

    /// Switch to training. Parameters are untouched.
    pub fn train_mode(&mut self) {
        self.set_mode(AgentMode::Training);
    }

    fn set_mode(&mut self, mode: AgentMode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "ddpg mode change");
            self.mode = mode;
        }
    }

    /// Number of completed [`DdpgAgent::train`] calls.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }
}

fn ensure_finite(network: &'static str, value: f32) -> error::Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        warn!(network, value, "non-finite loss, skipping optimizer step");
        Err(DdpgError::NonFiniteLoss { network, value })
    }
}

fn ensure_same_mode(
    what: &'static str,
    expected: TemporalMode,
    actual: TemporalMode,
) -> error::Result<()> {
    ensure_dim(what, expected.recurrent_layers(), actual.recurrent_layers())
}

fn ensure_same_shapes<B: Backend, M: Module<B>>(
    what: &'static str,
    expected: &M,
    actual: &M,
) -> error::Result<()> {
    let expected = param_shapes::<B, M>(expected);
    let actual = param_shapes::<B, M>(actual);
    ensure_dim(what, expected.len(), actual.len())?;

    for (expected, actual) in expected.iter().zip(&actual) {
        if expected != actual {
            return Err(DdpgError::ShapeMismatch {
                what,
                expected: expected.iter().product(),
                actual: actual.iter().product(),
            });
        }
    }
    Ok(())
}

/// Implementation of TrainableAgent trait for DdpgAgent
impl<B: AutodiffBackend> TrainableAgent<B> for DdpgAgent<B> {
    fn act(&self, lidar: &[f32], position: &[f32]) -> error::Result<Vec<f32>> {
        self.select_action(lidar, position)
    }

    fn learn<S: TransitionSampler<B>>(
        &mut self,
        sampler: &mut S,
        batch_size: usize,
    ) -> error::Result<TrainingMetrics> {
        self.train(sampler, batch_size)
    }

    fn is_on_policy(&self) -> bool {
        false
    }

    fn total_steps(&self) -> usize {
        self.total_steps
    }

    fn eval_mode(&mut self) {
        self.set_mode(AgentMode::Evaluating);
    }

    fn train_mode(&mut self) {
        self.set_mode(AgentMode::Training);
    }
}
