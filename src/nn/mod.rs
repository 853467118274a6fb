//! Neural network building blocks for the DDPG agent

pub mod actor;
pub mod compressor;
pub mod critic;
pub mod mlp;
pub mod polyak;
pub mod temporal;

pub use actor::{Actor, ActorConfig};
pub use compressor::{FeatureCompressor, FeatureCompressorConfig};
pub use critic::{Critic, CriticConfig};
pub use mlp::{MLP, MLPConfig};
pub use polyak::{param_shapes, soft_update};
pub use temporal::{RecurrentState, TemporalEncoder, TemporalEncoderConfig, TemporalMode};
