//! Deterministic policy network
//!
//! ```text
//! lidar ──► compressor (no grad) ──┐
//!                                  ├─► concat ─► temporal ─► ReLU ─► Linear ─► ReLU
//! position ────────────────────────┘
//!
//!   ─► Linear ─► tanh ─► × max_action
//! ```

use burn::{
    prelude::*,
    tensor::{activation::relu, backend::Backend},
};

use super::{
    compressor::{FeatureCompressor, FeatureCompressorConfig},
    mlp::{MLP, MLPConfig},
    temporal::{
        RecurrentState, TemporalEncoder, TemporalEncoderConfig, TemporalEncoderRecord, TemporalMode,
    },
};

/// Configuration for [`Actor`]
#[derive(Config, Debug)]
pub struct ActorConfig {
    pub lidar_state_dim: usize,
    pub position_state_dim: usize,
    pub lidar_feature_dim: usize,
    pub action_dim: usize,
    pub hidden_dim: usize,
    /// Every action component is scaled into `[-max_action, max_action]`
    pub max_action: f64,
    #[config(default = false)]
    pub recurrent: bool,
}

impl ActorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Actor<B> {
        let lidar_compress = FeatureCompressorConfig::new(
            self.lidar_state_dim,
            self.hidden_dim,
            self.lidar_feature_dim,
        )
        .init(device);
        let temporal = TemporalEncoderConfig::new(
            self.lidar_feature_dim + self.position_state_dim,
            self.hidden_dim,
        )
        .with_recurrent(self.recurrent)
        .init(device);
        let head =
            MLPConfig::new(self.hidden_dim, vec![self.hidden_dim], self.action_dim).init(device);

        Actor {
            lidar_compress,
            temporal,
            head,
            max_action: self.max_action,
        }
    }
}

#[derive(Module, Debug)]
pub struct Actor<B: Backend> {
    lidar_compress: FeatureCompressor<B>,
    temporal: TemporalEncoder<B>,
    head: MLP<B>,
    max_action: f64,
}

impl<B: Backend> Actor<B> {
    /// `lidar: [batch, seq, L]`, `position: [batch, seq, P]` to `[batch, seq, A]`.
    ///
    /// The compressed lidar features are detached, so actor updates never reach the
    /// actor's own compressor.
    pub fn forward(
        &self,
        lidar: Tensor<B, 3>,
        position: Tensor<B, 3>,
        state: Option<RecurrentState<B>>,
    ) -> (Tensor<B, 3>, Option<RecurrentState<B>>) {
        let lidar_feature = self.lidar_compress.forward(lidar).detach();
        let x = Tensor::cat(vec![lidar_feature, position], 2);

        let (x, next_state) = self.temporal.forward(x, state);
        let action = self.head.forward_tanh(relu(x)).mul_scalar(self.max_action);

        (action, next_state)
    }

    pub fn max_action(&self) -> f64 {
        self.max_action
    }

    pub fn temporal_mode(&self) -> TemporalMode {
        self.temporal.mode()
    }
}

impl<B: Backend> ActorRecord<B> {
    pub(crate) fn temporal_mode(&self) -> TemporalMode {
        match self.temporal {
            TemporalEncoderRecord::Stateless(_) => TemporalMode::Stateless,
            TemporalEncoderRecord::Recurrent(_) => TemporalMode::Recurrent,
        }
    }
}
