/// Deep Deterministic Policy Gradient
pub mod ddpg;

pub use ddpg::{AgentMode, DdpgAgent, DdpgConfig, DEFAULT_BATCH_SIZE};
