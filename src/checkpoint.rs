//! Four-artifact checkpoint layout
//!
//! A save under `prefix` produces
//! - `{prefix}_critic`
//! - `{prefix}_critic_optimizer`
//! - `{prefix}_actor`
//! - `{prefix}_actor_optimizer`
//!
//! each holding one bincode record written by burn's [`BinBytesRecorder`].

use std::{
    ffi::OsString,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use burn::{
    record::{BinBytesRecorder, FullPrecisionSettings, Record, Recorder},
    tensor::backend::Backend,
};

use tracing::warn;

use crate::error::{DdpgError, Result};

type CheckpointRecorder = BinBytesRecorder<FullPrecisionSettings>;

/// Paths of the four artifacts belonging to one save prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub critic: PathBuf,
    pub critic_optimizer: PathBuf,
    pub actor: PathBuf,
    pub actor_optimizer: PathBuf,
}

impl ArtifactPaths {
    pub fn from_prefix(prefix: impl AsRef<Path>) -> Self {
        let prefix = prefix.as_ref();
        Self {
            critic: with_suffix(prefix, "_critic"),
            critic_optimizer: with_suffix(prefix, "_critic_optimizer"),
            actor: with_suffix(prefix, "_actor"),
            actor_optimizer: with_suffix(prefix, "_actor_optimizer"),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [
            self.critic.as_path(),
            self.critic_optimizer.as_path(),
            self.actor.as_path(),
            self.actor_optimizer.as_path(),
        ]
        .into_iter()
    }

    /// First artifact that is not a regular file, if any.
    pub fn first_missing(&self) -> Option<&Path> {
        self.iter().find(|path| !path.is_file())
    }

    /// Fails with [`DdpgError::MissingArtifact`] unless every artifact exists.
    pub fn ensure_complete(&self) -> Result<()> {
        match self.first_missing() {
            Some(path) => Err(DdpgError::MissingArtifact {
                path: path.to_path_buf(),
            }),
            None => Ok(()),
        }
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Serialize a module or optimizer record to bytes.
pub fn encode<B: Backend, R: Record<B>>(record: R) -> Result<Vec<u8>> {
    let bytes = Recorder::<B>::record(&CheckpointRecorder::default(), record, ())?;
    Ok(bytes)
}

/// Decode a record, placing its tensors on `device`.
pub fn decode<B: Backend, R: Record<B>>(bytes: Vec<u8>, device: &B::Device) -> Result<R> {
    let record = Recorder::<B>::load(&CheckpointRecorder::default(), bytes, device)?;
    Ok(record)
}

/// Read one artifact.
///
/// Any failure to read it (absent, not a regular file, no permission) is reported as
/// [`DdpgError::MissingArtifact`]; the underlying io error is logged.
pub fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    if !path.is_file() {
        return Err(DdpgError::MissingArtifact {
            path: path.to_path_buf(),
        });
    }
    fs::read(path).map_err(|err| {
        warn!(path = %path.display(), error = %err, "checkpoint artifact unreadable");
        DdpgError::MissingArtifact {
            path: path.to_path_buf(),
        }
    })
}

/// Write every `(path, bytes)` pair through a synced `.tmp` sibling, then rename.
///
/// All temporaries are complete before the first rename, so a failure while
/// writing leaves every previous artifact untouched. A failed rename removes the
/// temporaries not yet renamed. A crash between renames can still leave a mix of
/// old and new artifacts.
pub fn write_all_atomic(artifacts: &[(&Path, &[u8])]) -> Result<()> {
    let mut staged = Vec::with_capacity(artifacts.len());

    for (path, bytes) in artifacts {
        let tmp = with_suffix(path, ".tmp");
        if let Err(err) = write_synced(&tmp, bytes) {
            discard(&staged);
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        staged.push((tmp, path.to_path_buf()));
    }

    for (i, (tmp, path)) in staged.iter().enumerate() {
        if let Err(err) = fs::rename(tmp, path) {
            discard(&staged[i..]);
            return Err(err.into());
        }
    }
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}
