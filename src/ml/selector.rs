// ============================================================
// Layer 6 — Best-Checkpoint Selection
// ============================================================
// Tracks the lowest validation loss seen so far and decides,
// once per epoch, whether that epoch's state is worth keeping.
//
//   epoch 1  val 0.9  → save   (best 0.9)
//   epoch 2  val 0.9  → skip   (ties do not count)
//   epoch 3  val 0.7  → save   (best 0.7)
//
// The tracker moves before the write is attempted. A failed write
// is reported to the caller and the epoch is not retried.

use crate::domain::error::TrainError;
use crate::domain::summary::RunSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Saved,
    Skipped,
}

#[derive(Debug, Clone)]
pub struct CheckpointSelector {
    best_val_loss: f64,
}

impl Default for CheckpointSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckpointSelector {
    pub fn new() -> Self {
        Self { best_val_loss: f64::INFINITY }
    }

    pub fn best_val_loss(&self) -> f64 {
        self.best_val_loss
    }

    /// `persist` is called only when the validation loss strictly improves.
    pub fn consider<F>(
        &mut self,
        epoch:   usize,
        summary: &RunSummary,
        persist: F,
    ) -> Result<Decision, TrainError>
    where
        F: FnOnce(usize, &RunSummary) -> Result<(), TrainError>,
    {
        let val_loss = summary.validation.loss;
        // NaN never compares less, so a diverged epoch is never kept
        if !(val_loss < self.best_val_loss) {
            return Ok(Decision::Skipped);
        }

        self.best_val_loss = val_loss;
        persist(epoch, summary)?;
        Ok(Decision::Saved)
    }
}
