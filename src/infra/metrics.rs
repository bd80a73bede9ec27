// ============================================================
// Layer 6 — Metrics Logging
// ============================================================
// Two CSV writers, both append-only:
//
//   MetricsLogger  → {output_dir}/metrics.csv, one row per epoch
//     epoch,train_loss,train_acc,val_loss,val_acc,lr
//     1,0.692100,0.512000,0.688400,0.530000,0.001000
//
//   CsvScalarSink  → {output_dir}/runs/loss.csv, one row per
//                    periodic validation step (ScalarSink impl)
//     step,train,val
//     0,0.693100,0.692800
//     100,0.541200,0.560300
//
// Headers are written only when the file is new, so a resumed
// run keeps appending to the same curve.

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

use crate::domain::summary::EpochSummary;
use crate::domain::traits::ScalarSink;

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    pub train_loss: f64,
    pub train_acc:  f64,

    /// Cross-entropy on the validation set, without the penalty term
    pub val_loss: f64,
    pub val_acc:  f64,

    /// Learning rate after the scheduler has seen this epoch
    pub lr: f64,
}

impl From<&EpochSummary> for EpochMetrics {
    fn from(e: &EpochSummary) -> Self {
        Self {
            epoch:      e.epoch,
            train_loss: e.summary.train.loss,
            train_acc:  e.summary.train.acc,
            val_loss:   e.summary.validation.loss,
            val_acc:    e.summary.validation.acc,
            lr:         e.lr,
        }
    }
}

/// Create `path` with `header` as its first line unless it already exists.
fn ensure_csv(path: &Path, header: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    if !path.exists() {
        let mut f = fs::File::create(path)
            .with_context(|| format!("Cannot create '{}'", path.display()))?;
        writeln!(f, "{header}")?;
        tracing::debug!("Created CSV: '{}'", path.display());
    }
    Ok(())
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot append to '{}'", path.display()))?;
    writeln!(f, "{line}")?;
    Ok(())
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let csv_path = dir.as_ref().join("metrics.csv");
        ensure_csv(&csv_path, "epoch,train_loss,train_acc,val_loss,val_acc,lr")?;
        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        append_line(
            &self.csv_path,
            &format!(
                "{},{:.6},{:.6},{:.6},{:.6},{:.6}",
                m.epoch, m.train_loss, m.train_acc, m.val_loss, m.val_acc, m.lr,
            ),
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, val_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.val_loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

/// Scalar sink backed by `{dir}/loss.csv`.
///
/// Only the `loss` tag is recognised; the `train` and `val` values
/// become the columns of one row. Other tags are ignored.
pub struct CsvScalarSink {
    csv_path: PathBuf,
}

impl CsvScalarSink {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let csv_path = dir.as_ref().join("loss.csv");
        ensure_csv(&csv_path, "step,train,val")?;
        Ok(Self { csv_path })
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

impl ScalarSink for CsvScalarSink {
    fn add_scalars(&mut self, tag: &str, values: &[(&str, f64)], step: usize) -> Result<()> {
        if tag != "loss" {
            tracing::debug!("CsvScalarSink: ignoring tag '{tag}'");
            return Ok(());
        }

        let value = |name: &str| {
            values
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| *v)
                .unwrap_or(f64::NAN)
        };
        append_line(
            &self.csv_path,
            &format!("{},{:.6},{:.6}", step, value("train"), value("val")),
        )
    }
}
