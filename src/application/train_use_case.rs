// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Validate the configuration      (Layer 2)
//   Step 2: Create the experiment directory (Layer 6 - infra)
//   Step 3: Load the corpus                 (Layer 4 - data)
//   Step 4: Split train/validation          (Layer 4 - data)
//   Step 5: Build / load the vocabulary     (Layer 6 - infra)
//   Step 6: Tokenise into datasets          (Layer 4 - data)
//   Step 7: Save config for evaluation      (Layer 6 - infra)
//   Step 8: Run training loop               (Layer 5 - ml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::{
    dataset::SanDataset,
    loader::TsvCorpusLoader,
    splitter::split_train_val,
};
use crate::domain::error::TrainError;
use crate::domain::summary::TrainReport;
use crate::domain::traits::{CorpusSource, NullSink, ScalarSink};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{CsvScalarSink, MetricsLogger},
    tokenizer_store::TokenizerStore,
};
use crate::ml::model::SanConfig;
use crate::ml::trainer::{run_training, BackendKind, RunOutputs, TrainerConfig, FIXED_SEED};

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run. Saved next to the checkpoint
// as train_config.json so `evaluate` can rebuild the same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    // ── data ──
    pub train_path:      String,
    /// Held-out corpus; None → keep `train_fraction` of the training corpus, validate on the rest
    pub validation_path: Option<String>,
    /// Share of the training corpus kept for training when splitting
    pub train_fraction:  f64,
    pub min_freq:        usize,
    /// None → experiments/{model_type}/epochs_…_batch_size_…_learning_rate_…
    pub output_dir:      Option<String>,

    // ── model ──
    pub model_type:      String,
    pub num_classes:     usize,
    pub embedding_dim:   usize,
    pub lstm_hidden_dim: usize,
    pub da:              usize,
    pub r:               usize,
    pub hidden_dim:      usize,
    pub max_len:         usize,
    pub dropout:         f64,

    // ── optimisation ──
    pub epochs:          usize,
    pub batch_size:      usize,
    pub learning_rate:   f64,
    pub summary_step:    usize,
    pub patience:        usize,
    pub seed_fixed:      bool,
    pub num_workers:     usize,
    pub backend:         BackendKind,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_path:      "data/train.txt".to_string(),
            validation_path: None,
            train_fraction:  0.9,
            min_freq:        1,
            output_dir:      None,

            model_type:      "SAN".to_string(),
            num_classes:     2,
            embedding_dim:   300,
            lstm_hidden_dim: 128,
            da:              64,
            r:               8,
            hidden_dim:      512,
            max_len:         64,
            dropout:         0.0,

            epochs:          5,
            batch_size:      256,
            learning_rate:   1e-3,
            summary_step:    500,
            patience:        5,
            seed_fixed:      false,
            num_workers:     1,
            backend:         BackendKind::Wgpu,
        }
    }
}

/// Architecture overrides read from `--model-config <json>`.
/// Every field is optional; absent ones keep the CLI value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelFileConfig {
    #[serde(rename = "type")]
    pub model_type:      Option<String>,
    pub num_classes:     Option<usize>,
    pub embedding_dim:   Option<usize>,
    pub lstm_hidden_dim: Option<usize>,
    pub da:              Option<usize>,
    pub r:               Option<usize>,
    pub hidden_dim:      Option<usize>,
    pub max_len:         Option<usize>,
    pub dropout:         Option<f64>,
}

impl ModelFileConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read model config '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Invalid model config '{}'", path.display()))
    }
}

impl TrainConfig {
    pub fn apply_model_file(&mut self, m: ModelFileConfig) {
        if let Some(v) = m.model_type      { self.model_type      = v; }
        if let Some(v) = m.num_classes     { self.num_classes     = v; }
        if let Some(v) = m.embedding_dim   { self.embedding_dim   = v; }
        if let Some(v) = m.lstm_hidden_dim { self.lstm_hidden_dim = v; }
        if let Some(v) = m.da              { self.da              = v; }
        if let Some(v) = m.r               { self.r               = v; }
        if let Some(v) = m.hidden_dim      { self.hidden_dim      = v; }
        if let Some(v) = m.max_len         { self.max_len         = v; }
        if let Some(v) = m.dropout         { self.dropout         = v; }
    }

    /// Reject configurations the model or the loop cannot run with.
    pub fn validate(&self) -> Result<(), TrainError> {
        let positive = [
            ("embedding_dim",   self.embedding_dim),
            ("lstm_hidden_dim", self.lstm_hidden_dim),
            ("da",              self.da),
            ("r",               self.r),
            ("hidden_dim",      self.hidden_dim),
            ("max_len",         self.max_len),
            ("epochs",          self.epochs),
            ("batch_size",      self.batch_size),
            ("summary_step",    self.summary_step),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(TrainError::Config(format!("{name} must be greater than 0")));
        }
        if self.num_classes < 2 {
            return Err(TrainError::Config(format!(
                "num_classes must be at least 2, got {}", self.num_classes
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(TrainError::Config(format!(
                "learning_rate must be positive, got {}", self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(TrainError::Config(format!(
                "dropout must be in [0, 1), got {}", self.dropout
            )));
        }
        if self.validation_path.is_none() && !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(TrainError::Config(format!(
                "train_fraction must be in (0, 1), got {}", self.train_fraction
            )));
        }
        Ok(())
    }

    /// Where checkpoints, summaries and logs for this run go.
    pub fn experiment_dir(&self) -> PathBuf {
        match &self.output_dir {
            Some(dir) => PathBuf::from(dir),
            None => Path::new("experiments").join(&self.model_type).join(format!(
                "epochs_{}_batch_size_{}_learning_rate_{}",
                self.epochs, self.batch_size, self.learning_rate
            )),
        }
    }

    pub fn model_config(&self, vocab_size: usize) -> SanConfig {
        SanConfig::new(
            vocab_size,
            self.embedding_dim,
            self.lstm_hidden_dim,
            self.da,
            self.r,
            self.hidden_dim,
            self.num_classes,
            self.max_len,
        )
        .with_dropout(self.dropout)
    }

    /// Keep `train_fraction` of the corpus for training, validate on the rest.
    /// Seeded runs split with the fixed seed as well.
    pub fn split_corpus<T>(&self, sentences: Vec<T>) -> (Vec<T>, Vec<T>) {
        let seed = self.seed_fixed.then_some(FIXED_SEED);
        split_train_val(sentences, self.train_fraction, seed)
    }

    pub fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig::new(self.epochs, self.batch_size, self.learning_rate)
            .with_summary_step(self.summary_step)
            .with_patience(self.patience)
            .with_seed_fixed(self.seed_fixed)
            .with_num_workers(self.num_workers)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainReport> {
        let cfg = &self.config;

        // ── Step 1: Validate ──────────────────────────────────────────────────
        cfg.validate()?;

        // ── Step 2: Experiment directory ──────────────────────────────────────
        let exp_dir = cfg.experiment_dir();
        fs::create_dir_all(&exp_dir)
            .with_context(|| format!("Cannot create '{}'", exp_dir.display()))?;
        tracing::info!("Experiment directory: '{}'", exp_dir.display());

        // ── Step 3: Load the corpus ───────────────────────────────────────────
        let train_sentences = TsvCorpusLoader::new(&cfg.train_path).load_all()?;

        // ── Step 4: Validation set ────────────────────────────────────────────
        let (train_sentences, val_sentences) = match &cfg.validation_path {
            Some(path) => (train_sentences, TsvCorpusLoader::new(path).load_all()?),
            None       => cfg.split_corpus(train_sentences),
        };
        tracing::info!(
            "Split: {} train, {} validation",
            train_sentences.len(),
            val_sentences.len()
        );

        // ── Step 5: Vocabulary ────────────────────────────────────────────────
        // Built from training sentences only
        let texts: Vec<String> = train_sentences.iter().map(|s| s.text.clone()).collect();
        let tokenizer  = TokenizerStore::new(&exp_dir).load_or_build(&texts, cfg.min_freq)?;
        let vocab_size = tokenizer.get_vocab_size(true);
        tracing::info!("Vocabulary size: {}", vocab_size);

        // ── Step 6: Datasets ──────────────────────────────────────────────────
        let train_dataset = SanDataset::encode(&train_sentences, &tokenizer, cfg.max_len, cfg.num_classes)?;
        let val_dataset   = SanDataset::encode(&val_sentences,   &tokenizer, cfg.max_len, cfg.num_classes)?;

        // ── Step 7: Save config for evaluation ────────────────────────────────
        let checkpoints = CheckpointManager::new(&exp_dir)?;
        checkpoints.save_config(cfg)?;

        // ── Step 8: Train ─────────────────────────────────────────────────────
        // Logging outputs are best-effort: a run without them still trains
        let sink: Box<dyn ScalarSink> = match CsvScalarSink::new(exp_dir.join("runs")) {
            Ok(sink) => Box::new(sink),
            Err(e) => {
                tracing::warn!("Loss curve disabled: {e:#}");
                Box::new(NullSink)
            }
        };
        let epoch_log = MetricsLogger::new(&exp_dir)
            .map_err(|e| tracing::warn!("Epoch metrics disabled: {e:#}"))
            .ok();

        let mut outputs = RunOutputs { checkpoints, sink, epoch_log };
        let report = run_training(
            &cfg.trainer_config(),
            &cfg.model_config(vocab_size),
            cfg.backend,
            train_dataset,
            val_dataset,
            &mut outputs,
        )?;

        if !report.lost_checkpoints.is_empty() {
            tracing::warn!(
                "Checkpoints for epochs {:?} could not be written",
                report.lost_checkpoints
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            TrainConfig { num_classes: 1, ..TrainConfig::default() },
            TrainConfig { learning_rate: 0.0, ..TrainConfig::default() },
            TrainConfig { batch_size: 0, ..TrainConfig::default() },
            TrainConfig { r: 0, ..TrainConfig::default() },
            TrainConfig { dropout: 1.0, ..TrainConfig::default() },
            TrainConfig { train_fraction: 1.0, ..TrainConfig::default() },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(TrainError::Config(_))), "{cfg:?}");
        }
    }

    #[test]
    fn test_train_fraction_is_the_training_share() {
        let cfg = TrainConfig { train_fraction: 0.8, seed_fixed: true, ..TrainConfig::default() };
        let (train, val) = cfg.split_corpus((0..10).collect::<Vec<u32>>());
        assert_eq!(train.len(), 8);
        assert_eq!(val.len(), 2);
    }

    #[test]
    fn test_experiment_dir_naming() {
        let cfg = TrainConfig::default();
        assert_eq!(
            cfg.experiment_dir(),
            PathBuf::from("experiments/SAN/epochs_5_batch_size_256_learning_rate_0.001")
        );

        let cfg = TrainConfig { output_dir: Some("/tmp/run".into()), ..TrainConfig::default() };
        assert_eq!(cfg.experiment_dir(), PathBuf::from("/tmp/run"));
    }

    #[test]
    fn test_model_file_overrides_only_given_fields() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("san.json");
        fs::write(&path, r#"{"type": "SAN-small", "r": 4, "da": 16}"#).unwrap();

        let mut cfg = TrainConfig::default();
        cfg.apply_model_file(ModelFileConfig::load(&path).unwrap());

        assert_eq!(cfg.model_type, "SAN-small");
        assert_eq!(cfg.r, 4);
        assert_eq!(cfg.da, 16);
        assert_eq!(cfg.hidden_dim, TrainConfig::default().hidden_dim);
    }

    #[test]
    fn test_config_json_round_trip_keeps_backend() {
        let cfg  = TrainConfig { backend: BackendKind::NdArray, ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains(r#""backend":"ndarray""#));
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.backend, BackendKind::NdArray);
    }

    #[test]
    fn test_model_config_carries_vocab_and_dims() {
        let cfg = TrainConfig::default();
        let m   = cfg.model_config(1234);
        assert_eq!(m.vocab_size, 1234);
        assert_eq!(m.r, cfg.r);
        assert_eq!(m.max_len, cfg.max_len);
    }
}
