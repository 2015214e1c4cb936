//! Model checkpoints on disk.
//!
//! A checkpoint is the bincode encoding of a versioned [`StateDict`]. The
//! training loop keeps one rolling `latest.bin` and occasional
//! `model_iter_<episode>.bin` snapshots in the same directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CheckpointError, Result};
use crate::network::{QNetwork, StateDict};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SavedModel {
    version: u32,
    state_dict: StateDict,
}

/// Write the parameters of `model` to `path`, creating parent directories.
pub fn save_model<M: QNetwork>(model: &M, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let saved = SavedModel {
        version: FORMAT_VERSION,
        state_dict: model.state_dict(),
    };
    fs::write(path, bincode::serialize(&saved)?)?;
    Ok(())
}

/// Overwrite the parameters of `model` with the checkpoint at `path`.
///
/// On error `model` is left as it was.
pub fn load_model<M: QNetwork>(model: &mut M, path: impl AsRef<Path>) -> std::result::Result<(), CheckpointError> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => CheckpointError::NotFound(path.to_path_buf()),
        _ => CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let corrupt = |reason: String| CheckpointError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };
    let saved: SavedModel = bincode::deserialize(&data).map_err(|e| corrupt(e.to_string()))?;
    if saved.version != FORMAT_VERSION {
        return Err(corrupt(format!(
            "format version {} is not supported (expected {})",
            saved.version, FORMAT_VERSION
        )));
    }
    model
        .load_state_dict(&saved.state_dict)
        .map_err(|e| corrupt(e.to_string()))
}

/// Checkpoint locations of one training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpointer {
    dir: PathBuf,
}

impl Checkpointer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Checkpointer { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn latest_path(&self) -> PathBuf {
        self.dir.join("latest.bin")
    }

    pub fn snapshot_path(&self, episode: usize) -> PathBuf {
        self.dir.join(format!("model_iter_{}.bin", episode))
    }

    pub fn save_latest<M: QNetwork>(&self, model: &M) -> Result<PathBuf> {
        let path = self.latest_path();
        save_model(model, &path)?;
        Ok(path)
    }

    pub fn save_snapshot<M: QNetwork>(&self, model: &M, episode: usize) -> Result<PathBuf> {
        let path = self.snapshot_path(episode);
        save_model(model, &path)?;
        Ok(path)
    }

    pub fn load_latest<M: QNetwork>(&self, model: &mut M) -> std::result::Result<(), CheckpointError> {
        load_model(model, self.latest_path())
    }
}
