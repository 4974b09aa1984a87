//! Run-state checkpointing.
//!
//! Every N filings the pipeline writes the full run state as one JSON file
//! under the output directory. Resuming a run loads the file and skips the
//! already-processed filenames, keeping their match records.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::MatchRecord;

pub const CHECKPOINT_FILE: &str = "checkpoint.json";

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("checkpoint is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serialized run state.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Checkpoint {
    /// Filenames fully processed so far.
    pub processed: Vec<String>,
    /// Match records emitted so far.
    pub matches: Vec<MatchRecord>,
    /// Filenames still pending when the checkpoint was written.
    pub remaining: Vec<String>,
}

fn checkpoint_path(out_dir: &Path) -> PathBuf {
    out_dir.join(CHECKPOINT_FILE)
}

/// Write the checkpoint; a temp-file rename keeps a crash from leaving a
/// half-written file behind.
pub fn save(out_dir: &Path, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
    fs::create_dir_all(out_dir)?;
    let tmp = out_dir.join(format!("{}.tmp", CHECKPOINT_FILE));
    fs::write(&tmp, serde_json::to_vec_pretty(checkpoint)?)?;
    fs::rename(&tmp, checkpoint_path(out_dir))?;
    Ok(())
}

/// Load the checkpoint if one exists.
pub fn load(out_dir: &Path) -> Result<Option<Checkpoint>, CheckpointError> {
    let path = checkpoint_path(out_dir);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(&path)?;
    Ok(Some(serde_json::from_slice(&bytes)?))
}

/// Remove the checkpoint after a completed run.
pub fn clear(out_dir: &Path) -> Result<(), CheckpointError> {
    let path = checkpoint_path(out_dir);
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
