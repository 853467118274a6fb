//! Fixed-capacity experience replay
//!
//! FIFO storage: once full, every push evicts the oldest transition. Sampling is
//! uniform *with replacement*, so a batch may repeat a transition and may be larger
//! than the number of stored transitions.

use std::collections::VecDeque;

use burn::{prelude::*, tensor::backend::Backend};
use rand::{rngs::StdRng, Rng, SeedableRng};

use super::{Transition, TransitionBatch, TransitionSampler};
use crate::{
    error::{ensure_dim, DdpgError, Result},
    traits::{DoneMask, ToTensor},
};

pub struct ReplayMemory<B: Backend> {
    buffer: VecDeque<Transition>,
    capacity: usize,
    lidar_dim: usize,
    position_dim: usize,
    action_dim: usize,
    device: B::Device,
    rng: StdRng,
}

impl<B: Backend> ReplayMemory<B> {
    /// Empty memory holding at most `capacity` transitions of the given widths.
    pub fn new(
        capacity: usize,
        lidar_dim: usize,
        position_dim: usize,
        action_dim: usize,
        device: &B::Device,
    ) -> Result<Self> {
        if capacity == 0 {
            return Err(DdpgError::InvalidConfig("replay capacity must be positive".into()));
        }

        Ok(Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            lidar_dim,
            position_dim,
            action_dim,
            device: device.clone(),
            rng: StdRng::from_entropy(),
        })
    }

    /// Reseed the sampling RNG for reproducible batches.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Store a transition, evicting the oldest one when full.
    pub fn push(&mut self, transition: Transition) -> Result<()> {
        ensure_dim("lidar", self.lidar_dim, transition.lidar.len())?;
        ensure_dim("next_lidar", self.lidar_dim, transition.next_lidar.len())?;
        ensure_dim("position", self.position_dim, transition.position.len())?;
        ensure_dim("next_position", self.position_dim, transition.next_position.len())?;
        ensure_dim("action", self.action_dim, transition.action.len())?;

        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    fn collate(&self, indices: &[usize]) -> TransitionBatch<B> {
        let n = indices.len();
        let mut lidar = Vec::with_capacity(n);
        let mut position = Vec::with_capacity(n);
        let mut action = Vec::with_capacity(n);
        let mut next_lidar = Vec::with_capacity(n);
        let mut next_position = Vec::with_capacity(n);
        let mut reward = Vec::with_capacity(n);
        let mut done = Vec::with_capacity(n);

        for &i in indices {
            let t = &self.buffer[i];
            lidar.push(t.lidar.clone());
            position.push(t.position.clone());
            action.push(t.action.clone());
            next_lidar.push(t.next_lidar.clone());
            next_position.push(t.next_position.clone());
            reward.push(t.reward);
            done.push(t.done);
        }

        let reward: Tensor<B, 1> = reward.to_tensor(&self.device);

        TransitionBatch {
            lidar: lidar.to_tensor(&self.device),
            position: position.to_tensor(&self.device),
            action: action.to_tensor(&self.device),
            next_lidar: next_lidar.to_tensor(&self.device),
            next_position: next_position.to_tensor(&self.device),
            reward: reward.reshape([n, 1]),
            not_done: done.to_not_done(&self.device),
        }
    }
}

impl<B: Backend> TransitionSampler<B> for ReplayMemory<B> {
    fn sample(&mut self, batch_size: usize) -> Option<TransitionBatch<B>> {
        if self.buffer.is_empty() || batch_size == 0 {
            return None;
        }

        let len = self.buffer.len();
        let indices: Vec<usize> = (0..batch_size).map(|_| self.rng.gen_range(0..len)).collect();
        Some(self.collate(&indices))
    }
}
