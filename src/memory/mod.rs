//! Transitions, batches and the sampling seam the agent trains from

pub mod replay;

pub use replay::ReplayMemory;

use burn::{prelude::*, tensor::backend::Backend};

/// One environment step: `(s, a, r, s', done)` with `s = (lidar, position)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub lidar: Vec<f32>,
    pub position: Vec<f32>,
    pub action: Vec<f32>,
    pub next_lidar: Vec<f32>,
    pub next_position: Vec<f32>,
    pub reward: f32,
    pub done: bool,
}

/// Column-major batch of `N` transitions, every tensor on the agent's device.
///
/// | field           | shape    |
/// |-----------------|----------|
/// | `lidar`         | `[N, L]` |
/// | `position`      | `[N, P]` |
/// | `action`        | `[N, A]` |
/// | `next_lidar`    | `[N, L]` |
/// | `next_position` | `[N, P]` |
/// | `reward`        | `[N, 1]` |
/// | `not_done`      | `[N, 1]` |
#[derive(Clone, Debug)]
pub struct TransitionBatch<B: Backend> {
    pub lidar: Tensor<B, 2>,
    pub position: Tensor<B, 2>,
    pub action: Tensor<B, 2>,
    pub next_lidar: Tensor<B, 2>,
    pub next_position: Tensor<B, 2>,
    pub reward: Tensor<B, 2>,
    /// `0.0` where the episode terminated, `1.0` otherwise
    pub not_done: Tensor<B, 2>,
}

impl<B: Backend> TransitionBatch<B> {
    pub fn len(&self) -> usize {
        self.reward.dims()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(name, tensor)` for every column, in declaration order.
    pub fn columns(&self) -> [(&'static str, &Tensor<B, 2>); 7] {
        [
            ("lidar", &self.lidar),
            ("position", &self.position),
            ("action", &self.action),
            ("next_lidar", &self.next_lidar),
            ("next_position", &self.next_position),
            ("reward", &self.reward),
            ("not_done", &self.not_done),
        ]
    }
}

/// Source of training batches.
///
/// Returns `None` when no batch can be produced (e.g. nothing stored yet).
pub trait TransitionSampler<B: Backend> {
    fn sample(&mut self, batch_size: usize) -> Option<TransitionBatch<B>>;
}
