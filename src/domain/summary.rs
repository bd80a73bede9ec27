// ============================================================
// Layer 3 — Run Summary Types
// ============================================================
// Plain records describing how a training run is going.
// `RunSummary` is the exact shape written to summary.json:
//
//   {
//     "train":      { "loss": 0.41, "acc": 0.82 },
//     "validation": { "loss": 0.45, "acc": 0.80 }
//   }

use serde::{Deserialize, Serialize};

/// Loss and accuracy over one pass of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub loss: f64,
    pub acc:  f64,
}

impl MetricSummary {
    pub fn new(loss: f64, acc: f64) -> Self {
        Self { loss, acc }
    }
}

/// Train + validation metrics for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub train:      MetricSummary,
    pub validation: MetricSummary,
}

/// What the training loop reports back after every epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSummary {
    /// 1-based epoch number
    pub epoch:    usize,
    pub summary:  RunSummary,
    /// Learning rate in effect after the scheduler step
    pub lr:       f64,
    /// Whether this epoch became the new best checkpoint
    pub improved: bool,
}

/// Final outcome of a training run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub epochs: Vec<EpochSummary>,

    /// Best validation loss seen (+inf if no epoch finished)
    pub best_val_loss: f64,

    /// Epoch whose checkpoint is on disk as "best"
    pub best_epoch: Option<usize>,

    /// Epochs that improved but whose checkpoint write failed
    pub lost_checkpoints: Vec<usize>,
}

impl TrainReport {
    pub fn new() -> Self {
        Self {
            epochs:           Vec::new(),
            best_val_loss:    f64::INFINITY,
            best_epoch:       None,
            lost_checkpoints: Vec::new(),
        }
    }

    pub fn final_val_loss(&self) -> Option<f64> {
        self.epochs.last().map(|e| e.summary.validation.loss)
    }
}
