//! Trainable agent trait for fine-grained training control
//!
//! The training loop drives an off-policy agent through this seam: pick actions for
//! the environment, fit on sampled transitions, flip between training and evaluation.

use burn::tensor::backend::AutodiffBackend;

use crate::{error::Result, memory::TransitionSampler};

/// Training metrics returned after each training update
///
/// Losses are read back after the forward pass that produced them, so they describe
/// the networks *before* the corresponding optimizer step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrainingMetrics {
    /// Critic MSE between `Q(s, a)` and the bootstrapped target
    pub critic_loss: f32,

    /// Actor loss `-mean Q(s, μ(s))` (lower means a better policy under the critic)
    pub actor_loss: f32,

    /// Batch mean of `Q(s, a)`
    pub mean_current_q: f32,

    /// Batch mean of the bootstrapped target
    pub mean_target_q: f32,
}

/// Trait for off-policy RL agents over split lidar / position observations
///
/// # Example
///
/// ```ignore
/// agent.train_mode();
/// for _ in 0..updates {
///     let metrics = agent.learn(&mut replay, 100)?;
///     tracing::info!(critic_loss = metrics.critic_loss, "update");
/// }
///
/// agent.eval_mode();
/// let action = agent.act(&lidar, &position)?;
/// ```
pub trait TrainableAgent<B: AutodiffBackend> {
    /// Deterministic action for a single observation
    fn act(&self, lidar: &[f32], position: &[f32]) -> Result<Vec<f32>>;

    /// One gradient update on a batch drawn from `sampler`
    fn learn<S: TransitionSampler<B>>(
        &mut self,
        sampler: &mut S,
        batch_size: usize,
    ) -> Result<TrainingMetrics>;

    /// Whether the agent must be trained on data from its current policy
    fn is_on_policy(&self) -> bool;

    /// Number of completed training updates
    fn total_steps(&self) -> usize;

    /// Make agent in evaluation mode
    fn eval_mode(&mut self);

    /// Make agent in training mode
    fn train_mode(&mut self);
}
