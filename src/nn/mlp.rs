//! Multi-Layer Perceptron (MLP) - Generic feedforward block
//!
//! Shared building block for the lidar compressor and for the actor/critic heads that
//! sit on top of the temporal encoder.

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::{activation::relu, backend::Backend},
};

/// Configuration for Multi-Layer Perceptron
#[derive(Config, Debug)]
pub struct MLPConfig {
    /// Input dimension
    pub input_dim: usize,
    /// Hidden layer dimensions (e.g., [64, 64] for two hidden layers of 64 units each)
    pub hidden_layers: Vec<usize>,
    /// Output dimension
    pub output_dim: usize,
}

/// Multi-Layer Perceptron implementation
///
/// Hidden layers use ReLU activation, the output layer is linear unless
/// [`MLP::forward_tanh`] is used.
#[derive(Module, Debug)]
pub struct MLP<B: Backend> {
    hidden: Vec<Linear<B>>,
    output: Linear<B>,
}

impl MLPConfig {
    /// Initialize the MLP with the given configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> MLP<B> {
        let mut hidden = Vec::with_capacity(self.hidden_layers.len());
        let mut fan_in = self.input_dim;

        for &width in &self.hidden_layers {
            hidden.push(LinearConfig::new(fan_in, width).init(device));
            fan_in = width;
        }

        let output = LinearConfig::new(fan_in, self.output_dim).init(device);

        MLP { hidden, output }
    }
}

impl<B: Backend> MLP<B> {
    /// Generic forward pass - works with any tensor dimension
    ///
    /// Works with:
    /// - D=2: Batch processing `[batch, features]`
    /// - D=3: Sequences `[batch, sequence, features]` (what the agent feeds)
    ///
    /// The last dimension is always treated as the feature dimension.
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        let x = self.forward_hidden(input);
        self.output.forward(x)
    }

    /// Forward pass with tanh output activation, bounded in [-1, 1].
    pub fn forward_tanh<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        self.forward(input).tanh()
    }

    fn forward_hidden<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        self.hidden
            .iter()
            .fold(input, |x, layer| relu(layer.forward(x)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::{NdArray, NdArrayDevice};

    #[test]
    fn test_mlp_forward_2d() {
        let device = NdArrayDevice::default();

        // 10 → [8, 8] → 4, the compressor shape used by the agent tests
        let config = MLPConfig::new(10, vec![8, 8], 4);
        let mlp = config.init::<NdArray>(&device);

        let input = Tensor::<NdArray, 2>::random(
            [5, 10],
            burn::tensor::Distribution::Uniform(-1.0, 1.0),
            &device,
        );

        let output: Tensor<NdArray, 2> = mlp.forward(input);

        assert_eq!(output.shape().dims, [5, 4]);
    }

    #[test]
    fn test_mlp_forward_3d() {
        let device = NdArrayDevice::default();

        let config = MLPConfig::new(6, vec![16], 1);
        let mlp = config.init::<NdArray>(&device);

        // [batch, sequence_length, features]
        let input = Tensor::<NdArray, 3>::random(
            [4, 3, 6],
            burn::tensor::Distribution::Uniform(-1.0, 1.0),
            &device,
        );

        let output: Tensor<NdArray, 3> = mlp.forward(input);

        assert_eq!(output.shape().dims, [4, 3, 1]);
    }

    #[test]
    fn test_mlp_no_hidden_layers() {
        let device = NdArrayDevice::default();

        // Direct connection: 4 → 2
        let config = MLPConfig::new(4, vec![], 2);
        let mlp = config.init::<NdArray>(&device);

        let input =
            Tensor::<NdArray, 2>::random([1, 4], burn::tensor::Distribution::Default, &device);
        let output = mlp.forward(input);

        assert_eq!(output.shape().dims, [1, 2]);
    }

    #[test]
    fn test_mlp_forward_tanh() {
        let device = NdArrayDevice::default();

        let config = MLPConfig::new(4, vec![32], 2);
        let mlp = config.init::<NdArray>(&device);

        // Large inputs push the pre-activation far outside [-1, 1]
        let input = Tensor::<NdArray, 2>::random(
            [3, 4],
            burn::tensor::Distribution::Uniform(-100.0, 100.0),
            &device,
        );
        let output: Tensor<NdArray, 2> = mlp.forward_tanh(input);

        assert_eq!(output.shape().dims, [3, 2]);

        let data = output.to_data();
        for &value in data.as_slice::<f32>().unwrap() {
            assert!((-1.0..=1.0).contains(&value), "tanh output should be in [-1, 1], got {value}");
        }
    }
}
