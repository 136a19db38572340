//! Checkpoint persistence port.

use crate::domain::checkpoint::Checkpoint;
use crate::domain::error::TickerScoreError;

pub trait CheckpointPort {
    /// Last saved checkpoint. Missing or unreadable state yields an empty one.
    fn load(&self) -> Checkpoint;

    /// Atomically replace the stored checkpoint.
    fn save(&self, checkpoint: &Checkpoint) -> Result<(), TickerScoreError>;

    fn clear(&self) -> Result<(), TickerScoreError>;
}
