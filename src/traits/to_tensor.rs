use burn::{
    prelude::*,
    tensor::{backend::Backend, BasicOps, Element, TensorData},
};

/// A trait for converting items to tensors
///
/// Implemented for `Vec<T>` (a single observation) and `Vec<Vec<T>>` (a batch of
/// equally sized rows) so observations and replay columns reach the device in one copy.
/// Values are converted to the backend's element type, so `Vec<f32>` works with any
/// float precision.
pub trait ToTensor<B: Backend, const D: usize, K: BasicOps<B>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D, K>;
}

impl<B, E, K> ToTensor<B, 1, K> for Vec<E>
where
    B: Backend,
    E: Element,
    K: BasicOps<B>,
{
    #[inline]
    fn to_tensor(self, device: &<B as Backend>::Device) -> Tensor<B, 1, K> {
        let len = self.len();
        Tensor::from_data(TensorData::new(self, [len]), device)
    }
}

/// Rows must share one width; the first row fixes it.
///
/// # Panics
///
/// If any row is longer or shorter than the first. [`ReplayMemory::push`] checks
/// widths, so its batches never trigger this.
///
/// [`ReplayMemory::push`]: crate::memory::ReplayMemory::push
impl<B, E, K> ToTensor<B, 2, K> for Vec<Vec<E>>
where
    B: Backend,
    E: Element,
    K: BasicOps<B>,
{
    #[inline]
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2, K> {
        let rows = self.len();
        let width = self.first().map_or(0, Vec::len);
        let mut flat = Vec::with_capacity(rows * width);

        for row in self {
            flat.extend(row);
        }

        Tensor::from_data(TensorData::new(flat, [rows, width]), device)
    }
}
