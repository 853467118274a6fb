//! Action-value network `Q(s, a)`
//!
//! Same trunk as the actor, but the lidar compressor is trained through the critic
//! loss and the head ends in a single unbounded Q estimate.

use burn::{
    prelude::*,
    tensor::{activation::relu, backend::Backend},
};

use super::{
    compressor::{FeatureCompressor, FeatureCompressorConfig},
    mlp::{MLP, MLPConfig},
    temporal::{TemporalEncoder, TemporalEncoderConfig, TemporalEncoderRecord, TemporalMode},
};

/// Configuration for [`Critic`]
#[derive(Config, Debug)]
pub struct CriticConfig {
    pub lidar_state_dim: usize,
    pub position_state_dim: usize,
    pub lidar_feature_dim: usize,
    pub action_dim: usize,
    pub hidden_dim: usize,
    #[config(default = false)]
    pub recurrent: bool,
}

impl CriticConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Critic<B> {
        let lidar_compress = FeatureCompressorConfig::new(
            self.lidar_state_dim,
            self.hidden_dim,
            self.lidar_feature_dim,
        )
        .init(device);
        let temporal = TemporalEncoderConfig::new(
            self.lidar_feature_dim + self.position_state_dim + self.action_dim,
            self.hidden_dim,
        )
        .with_recurrent(self.recurrent)
        .init(device);
        let head = MLPConfig::new(self.hidden_dim, vec![self.hidden_dim], 1).init(device);

        Critic {
            lidar_compress,
            temporal,
            head,
        }
    }
}

#[derive(Module, Debug)]
pub struct Critic<B: Backend> {
    lidar_compress: FeatureCompressor<B>,
    temporal: TemporalEncoder<B>,
    head: MLP<B>,
}

impl<B: Backend> Critic<B> {
    /// `[batch, seq, L]`, `[batch, seq, P]`, `[batch, seq, A]` to `[batch, seq, 1]`.
    ///
    /// A recurrent critic always starts from zero memory: Q estimates are computed on
    /// independent replay samples.
    pub fn forward(
        &self,
        lidar: Tensor<B, 3>,
        position: Tensor<B, 3>,
        action: Tensor<B, 3>,
    ) -> Tensor<B, 3> {
        let lidar_feature = self.lidar_compress.forward(lidar);
        let x = Tensor::cat(vec![lidar_feature, position, action], 2);

        let (x, _) = self.temporal.forward(x, None);
        self.head.forward(relu(x))
    }

    pub fn temporal_mode(&self) -> TemporalMode {
        self.temporal.mode()
    }
}

impl<B: Backend> CriticRecord<B> {
    pub(crate) fn temporal_mode(&self) -> TemporalMode {
        match self.temporal {
            TemporalEncoderRecord::Stateless(_) => TemporalMode::Stateless,
            TemporalEncoderRecord::Recurrent(_) => TemporalMode::Recurrent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{
        ndarray::{NdArray, NdArrayDevice},
        Autodiff,
    };

    #[test]
    fn single_q_value_per_sample() {
        let device = NdArrayDevice::default();
        let critic = CriticConfig::new(10, 3, 4, 2, 8).init::<NdArray>(&device);

        let q = critic.forward(
            Tensor::zeros([7, 1, 10], &device),
            Tensor::zeros([7, 1, 3], &device),
            Tensor::zeros([7, 1, 2], &device),
        );

        assert_eq!(q.dims(), [7, 1, 1]);
    }

    #[test]
    fn recurrent_critic_has_same_output_layout() {
        let device = NdArrayDevice::default();
        let critic = CriticConfig::new(10, 3, 4, 2, 8)
            .with_recurrent(true)
            .init::<NdArray>(&device);
        assert_eq!(critic.temporal_mode(), TemporalMode::Recurrent);

        let q = critic.forward(
            Tensor::ones([3, 1, 10], &device),
            Tensor::ones([3, 1, 3], &device),
            Tensor::ones([3, 1, 2], &device),
        );

        assert_eq!(q.dims(), [3, 1, 1]);
    }

    #[test]
    fn gradient_flows_into_action_input() {
        type B = Autodiff<NdArray>;
        let device = NdArrayDevice::default();
        let critic = CriticConfig::new(4, 2, 3, 2, 6).init::<B>(&device);

        let action = Tensor::<B, 3>::ones([2, 1, 2], &device).require_grad();
        let q = critic.forward(
            Tensor::ones([2, 1, 4], &device),
            Tensor::ones([2, 1, 2], &device),
            action.clone(),
        );
        let grads = q.sum().backward();

        assert!(action.grad(&grads).is_some());
    }

    #[test]
    fn record_reports_encoder_variant() {
        let device = NdArrayDevice::default();
        let stateless = CriticConfig::new(4, 2, 3, 2, 6).init::<NdArray>(&device);
        let recurrent = CriticConfig::new(4, 2, 3, 2, 6)
            .with_recurrent(true)
            .init::<NdArray>(&device);

        assert_eq!(stateless.into_record().temporal_mode(), TemporalMode::Stateless);
        assert_eq!(recurrent.into_record().temporal_mode(), TemporalMode::Recurrent);
    }
}
