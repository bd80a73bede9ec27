// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists the best model seen so far using Burn's CompactRecorder.
//
// Layout of an output directory:
//   {output_dir}/
//     best/
//       model.mpk.gz       ← model parameters
//       optim.mpk.gz       ← Adam moment estimates
//       state.json         ← {"epoch": n}
//     summary.json         ← train / validation loss + acc of best epoch
//     train_config.json    ← everything needed to rebuild the model
//     tokenizer.json
//
// `best/` is replaced as a unit. The three files are first written
// to `best.staging/`, then the old directory is moved aside and the
// staging directory renamed into place. A crash mid-write leaves
// either the previous checkpoint or the new one, never a mix.

use anyhow::Context;
use std::{
    fs,
    io,
    path::{Path, PathBuf},
};
use burn::{
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    record::{CompactRecorder, Recorder, RecorderError},
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::train_use_case::TrainConfig;
use crate::domain::error::TrainError;
use crate::domain::summary::RunSummary;
use crate::ml::model::SanModel;

const BEST_DIR:    &str = "best";
const STAGING_DIR: &str = "best.staging";
const OLD_DIR:     &str = "best.old";

/// Contents of `best/state.json`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointState {
    pub epoch: usize,
}

fn recorder_error(path: &Path, e: RecorderError) -> TrainError {
    TrainError::resource(path, io::Error::other(format!("{e:?}")))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), TrainError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| TrainError::resource(path, io::Error::other(e)))?;
    fs::write(path, json).map_err(|e| TrainError::resource(path, e))
}

/// Manages saving and loading of model checkpoints.
pub struct CheckpointManager {
    dir:      PathBuf,
    recorder: CompactRecorder,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, TrainError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| TrainError::resource(&dir, e))?;
        Ok(Self { dir, recorder: CompactRecorder::new() })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn best_dir(&self) -> PathBuf {
        self.dir.join(BEST_DIR)
    }

    /// Replace `best/` with the given model, optimizer state and epoch.
    pub fn save_best<B, O>(
        &self,
        model: &SanModel<B>,
        optim: &O,
        epoch: usize,
    ) -> Result<(), TrainError>
    where
        B: AutodiffBackend,
        SanModel<B>: AutodiffModule<B>,
        O: Optimizer<SanModel<B>, B>,
    {
        let staging = self.dir.join(STAGING_DIR);
        let best    = self.best_dir();
        let old     = self.dir.join(OLD_DIR);

        // leftovers from an interrupted save
        for stale in [&staging, &old] {
            if stale.exists() {
                fs::remove_dir_all(stale).map_err(|e| TrainError::resource(stale, e))?;
            }
        }
        fs::create_dir_all(&staging).map_err(|e| TrainError::resource(&staging, e))?;

        // ── Write everything into staging ─────────────────────────────────────
        // The recorder appends ".mpk.gz" itself
        let model_path = staging.join("model");
        <CompactRecorder as Recorder<B>>::record(&self.recorder, model.clone().into_record(), model_path.clone())
            .map_err(|e| recorder_error(&model_path, e))?;

        let optim_path = staging.join("optim");
        <CompactRecorder as Recorder<B>>::record(&self.recorder, optim.to_record(), optim_path.clone())
            .map_err(|e| recorder_error(&optim_path, e))?;

        write_json(&staging.join("state.json"), &CheckpointState { epoch })?;

        // ── Swap into place ───────────────────────────────────────────────────
        if best.exists() {
            fs::rename(&best, &old).map_err(|e| TrainError::resource(&best, e))?;
        }
        fs::rename(&staging, &best).map_err(|e| TrainError::resource(&best, e))?;
        if old.exists() {
            if let Err(e) = fs::remove_dir_all(&old) {
                tracing::warn!("Could not remove '{}': {e}", old.display());
            }
        }

        tracing::debug!("Saved best checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Overwrite `summary.json` with the given epoch's metrics.
    pub fn save_summary(&self, summary: &RunSummary) -> Result<(), TrainError> {
        let path = self.dir.join("summary.json");
        write_json(&path, summary)?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    pub fn load_summary(&self) -> anyhow::Result<RunSummary> {
        let path = self.dir.join("summary.json");
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read summary from '{}'", path.display()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load the best checkpoint's weights into `model`.
    ///
    /// The model must have the architecture the checkpoint was saved with.
    pub fn load_model<B: Backend>(
        &self,
        model:  SanModel<B>,
        device: &B::Device,
    ) -> Result<SanModel<B>, TrainError> {
        let path = self.best_dir().join("model");
        let record = <CompactRecorder as Recorder<B>>::load(&self.recorder, path.clone(), device)
            .map_err(|e| recorder_error(&path, e))?;

        if let Some(state) = self.best_state()? {
            tracing::info!("Loaded checkpoint from epoch {}", state.epoch);
        }
        Ok(model.load_record(record))
    }

    /// `None` if no checkpoint has been written yet.
    pub fn best_state(&self) -> Result<Option<CheckpointState>, TrainError> {
        let path = self.best_dir().join("state.json");
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|e| TrainError::resource(&path, e))?;
        serde_json::from_str(&json)
            .map(Some)
            .map_err(|e| TrainError::resource(&path, io::Error::other(e)))
    }

    /// Save the training configuration to JSON.
    ///
    /// Written before training starts so `evaluate` can rebuild the model.
    pub fn save_config(&self, cfg: &TrainConfig) -> anyhow::Result<()> {
        let path = self.dir.join("train_config.json");
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> anyhow::Result<TrainConfig> {
        let path = self.dir.join("train_config.json");
        let json = fs::read_to_string(&path).with_context(|| {
            format!(
                "Cannot read config from '{}'. \
                 Make sure you have run 'train' before 'evaluate'.",
                path.display()
            )
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
