//! JSON file checkpoint store.
//!
//! Saves go to a sibling temp file which is synced and then renamed over the
//! target, so a reader sees either the previous snapshot or the new one.

use crate::domain::checkpoint::Checkpoint;
use crate::domain::error::TickerScoreError;
use crate::ports::checkpoint_port::CheckpointPort;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct JsonCheckpointAdapter {
    path: PathBuf,
}

impl JsonCheckpointAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn checkpoint_err(&self, reason: impl ToString) -> TickerScoreError {
        TickerScoreError::Checkpoint {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl CheckpointPort for JsonCheckpointAdapter {
    fn load(&self) -> Checkpoint {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No checkpoint at {}, starting fresh", self.path.display());
                return Checkpoint::default();
            }
            Err(e) => {
                warn!(
                    "Could not read checkpoint {}: {}; starting fresh",
                    self.path.display(),
                    e
                );
                return Checkpoint::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                warn!(
                    "Checkpoint {} is corrupt ({}); starting fresh",
                    self.path.display(),
                    e
                );
                Checkpoint::default()
            }
        }
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<(), TickerScoreError> {
        let json = serde_json::to_vec(checkpoint).map_err(|e| self.checkpoint_err(e))?;
        let temp = self.temp_path();

        let mut file = File::create(&temp).map_err(|e| self.checkpoint_err(e))?;
        file.write_all(&json).map_err(|e| self.checkpoint_err(e))?;
        file.sync_all().map_err(|e| self.checkpoint_err(e))?;
        drop(file);

        fs::rename(&temp, &self.path).map_err(|e| self.checkpoint_err(e))?;
        debug!(
            "Saved checkpoint with {} processed tickers",
            checkpoint.processed_tickers.len()
        );
        Ok(())
    }

    fn clear(&self) -> Result<(), TickerScoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.checkpoint_err(e)),
        }
    }
}
