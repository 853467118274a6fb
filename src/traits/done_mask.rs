use burn::{
    prelude::*,
    tensor::{backend::Backend, TensorData},
};

/// Turns episode-termination flags into the `not_done` column used by the TD target.
pub trait DoneMask<B: Backend> {
    /// `[N, 1]` float tensor holding `0.0` where the episode ended and `1.0` elsewhere.
    fn to_not_done(self, device: &B::Device) -> Tensor<B, 2>;
}

impl<B: Backend> DoneMask<B> for Vec<bool> {
    fn to_not_done(self, device: &B::Device) -> Tensor<B, 2> {
        let len = self.len();
        let mask: Vec<f32> = self
            .into_iter()
            .map(|done| if done { 0.0 } else { 1.0 })
            .collect();
        Tensor::from_data(TensorData::new(mask, [len, 1]), device)
    }
}
