pub mod done_mask;
pub mod to_tensor;
pub mod trainable;

pub use done_mask::DoneMask;
pub use to_tensor::ToTensor;
pub use trainable::{TrainableAgent, TrainingMetrics};
