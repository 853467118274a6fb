//! Error type shared by the agent, its networks and persistence

use std::{fmt::Debug, path::PathBuf};

use burn::record::RecorderError;
use thiserror::Error;

/// Errors surfaced by [`DdpgAgent`](crate::algo::ddpg::DdpgAgent) and its collaborators.
///
/// Nothing in this crate retries: every variant propagates to the caller, who owns the
/// training-loop level restart policy.
#[derive(Error, Debug)]
pub enum DdpgError {
    /// An observation, action, batch column or loaded record disagrees with the
    /// dimensions fixed at construction.
    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// One of the four checkpoint blobs is absent or unreadable.
    #[error("missing checkpoint artifact {}", path.display())]
    MissingArtifact { path: PathBuf },

    /// A batch tensor lives on a different device than the agent.
    #[error("device mismatch for {what}: agent runs on {expected}, tensor is on {actual}")]
    DeviceMismatch {
        what: &'static str,
        expected: String,
        actual: String,
    },

    /// A loss evaluated to NaN or infinity; the optimizer step was not applied.
    #[error("non-finite {network} loss: {value}")]
    NonFiniteLoss { network: &'static str, value: f32 },

    /// The sampler could not produce a batch.
    #[error("replay sampler returned no batch for {requested} transitions")]
    InsufficientSamples { requested: usize },

    /// Construction hyperparameters are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// burn failed to encode or decode a record.
    #[error("recorder error: {0}")]
    Recorder(#[from] RecorderError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, DdpgError>;

/// Fails with [`DdpgError::ShapeMismatch`] unless `actual == expected`.
pub(crate) fn ensure_dim(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DdpgError::ShapeMismatch {
            what,
            expected,
            actual,
        })
    }
}

/// Fails with [`DdpgError::DeviceMismatch`] unless `actual == expected`.
pub(crate) fn ensure_device<D: PartialEq + Debug>(
    what: &'static str,
    expected: &D,
    actual: &D,
) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DdpgError::DeviceMismatch {
            what,
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        })
    }
}
