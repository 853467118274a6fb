//! DDPG over split lidar / position observations, built on burn.
//!
//! - [`nn`]: feature compressor, temporal encoder, actor and critic networks
//! - [`memory`]: transitions, batches and the replay buffer
//! - [`algo`]: the DDPG agent
//! - [`checkpoint`]: the four-artifact save layout

pub mod algo;
pub mod checkpoint;
pub mod error;
pub mod memory;
pub mod nn;
pub mod traits;

pub use algo::{DdpgAgent, DdpgConfig};
pub use error::{DdpgError, Result};
pub use memory::{ReplayMemory, Transition, TransitionBatch, TransitionSampler};
pub use traits::{TrainableAgent, TrainingMetrics};
