//! Lidar feature compressor
//!
//! `Linear(L, H) -> ReLU -> Linear(H, H) -> ReLU -> Linear(H, F)`: squeezes the raw
//! lidar scan down to `F` features before it is joined with the position vector.
//! The actor and the critic each own an independent compressor.

use burn::{prelude::*, tensor::backend::Backend};

use super::mlp::{MLP, MLPConfig};

/// Configuration for [`FeatureCompressor`]
#[derive(Config, Debug)]
pub struct FeatureCompressorConfig {
    /// Raw lidar length `L`
    pub lidar_dim: usize,
    /// Width of both hidden layers `H`
    pub hidden_dim: usize,
    /// Compressed feature length `F`
    pub feature_dim: usize,
}

impl FeatureCompressorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> FeatureCompressor<B> {
        let mlp = MLPConfig::new(
            self.lidar_dim,
            vec![self.hidden_dim, self.hidden_dim],
            self.feature_dim,
        )
        .init(device);

        FeatureCompressor { mlp }
    }
}

#[derive(Module, Debug)]
pub struct FeatureCompressor<B: Backend> {
    mlp: MLP<B>,
}

impl<B: Backend> FeatureCompressor<B> {
    /// `[.., L]` to `[.., F]`; the leading dimensions are untouched.
    pub fn forward<const D: usize>(&self, lidar: Tensor<B, D>) -> Tensor<B, D> {
        self.mlp.forward(lidar)
    }
}
