// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Scores a trained experiment directory on a labelled corpus:
//
//   train_config.json  → architecture + max_len + num_classes
//   tokenizer.json     → the vocabulary training used
//   best/model.mpk.gz  → weights of the best epoch
//   --data corpus.tsv  → sentences to score
//
// Runs on the plain (non-autodiff) backend; nothing is written.

use anyhow::{Context, Result};
use burn::{data::dataloader::DataLoaderBuilder, prelude::*};
use std::path::PathBuf;

use crate::application::train_use_case::TrainConfig;
use crate::data::{batcher::SanBatcher, dataset::SanDataset, loader::TsvCorpusLoader};
use crate::domain::error::TrainError;
use crate::domain::summary::MetricSummary;
use crate::domain::traits::CorpusSource;
use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::TokenizerStore};
use crate::ml::evaluator::{evaluate, metric, AccuracyMetric, BatchMetric, CrossEntropyMetric};
use crate::ml::model::{SanConfig, SanModel};
use crate::ml::trainer::BackendKind;

pub struct EvaluateUseCase {
    output_dir: PathBuf,
    backend:    BackendKind,
}

impl EvaluateUseCase {
    pub fn new(output_dir: impl Into<PathBuf>, backend: BackendKind) -> Self {
        Self { output_dir: output_dir.into(), backend }
    }

    pub fn execute(&self, data_path: &str) -> Result<MetricSummary> {
        let ckpt = CheckpointManager::new(&self.output_dir)?;
        let cfg: TrainConfig = ckpt.load_config()?;

        let tokenizer = TokenizerStore::new(&self.output_dir)
            .load()
            .context("Make sure you have run 'train' before 'evaluate'")?;
        let model_cfg = cfg.model_config(tokenizer.get_vocab_size(true));

        let sentences = TsvCorpusLoader::new(data_path).load_all()?;
        let dataset   = SanDataset::encode(&sentences, &tokenizer, cfg.max_len, cfg.num_classes)?;
        tracing::info!("Evaluating {} sentences from '{}'", dataset.items().len(), data_path);

        let summary = match self.backend {
            BackendKind::Wgpu => {
                let device = burn::backend::wgpu::WgpuDevice::default();
                score::<burn::backend::Wgpu>(&ckpt, &model_cfg, dataset, cfg.batch_size, &device)?
            }
            BackendKind::NdArray => {
                let device = burn::backend::ndarray::NdArrayDevice::default();
                score::<burn::backend::NdArray<f32>>(&ckpt, &model_cfg, dataset, cfg.batch_size, &device)?
            }
        };
        Ok(summary)
    }
}

/// Load the best checkpoint and compute loss + accuracy over `dataset`.
fn score<B: Backend>(
    ckpt:       &CheckpointManager,
    model_cfg:  &SanConfig,
    dataset:    SanDataset,
    batch_size: usize,
    device:     &B::Device,
) -> Result<MetricSummary, TrainError> {
    let model: SanModel<B> = ckpt.load_model(model_cfg.init(device), device)?;

    let loader = DataLoaderBuilder::new(SanBatcher::<B>::new(model_cfg.max_len))
        .batch_size(batch_size)
        .build(dataset);

    let metrics: [(&str, &dyn BatchMetric<B>); 2] =
        [("loss", &CrossEntropyMetric), ("acc", &AccuracyMetric)];
    let summary = evaluate(&model, loader.iter(), &metrics)?;

    Ok(MetricSummary::new(metric(&summary, "loss"), metric(&summary, "acc")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainUseCase;
    use crate::test_util::backend_lock;
    use std::fs;

    const CORPUS: &str = "id\tdocument\tlabel\n\
        1\tgreat movie loved it\t1\n\
        2\tterrible plot and acting\t0\n\
        3\tloved the acting\t1\n\
        4\tboring and terrible\t0\n\
        5\tgreat fun great cast\t1\n\
        6\tplot was boring\t0\n\
        7\tloved it great\t1\n\
        8\tterrible boring movie\t0\n";

    #[test]
    fn test_train_then_evaluate_on_ndarray() {
        let _guard = backend_lock();
        let dir    = tempfile::tempdir().unwrap();
        let data   = dir.path().join("corpus.tsv");
        fs::write(&data, CORPUS).unwrap();
        let out    = dir.path().join("run");

        let cfg = TrainConfig {
            train_path:      data.display().to_string(),
            validation_path: Some(data.display().to_string()),
            output_dir:      Some(out.display().to_string()),
            embedding_dim:   6,
            lstm_hidden_dim: 4,
            da:              5,
            r:               2,
            hidden_dim:      8,
            max_len:         6,
            epochs:          2,
            batch_size:      4,
            summary_step:    1,
            seed_fixed:      true,
            backend:         BackendKind::NdArray,
            ..TrainConfig::default()
        };
        let report = TrainUseCase::new(cfg).execute().unwrap();
        assert_eq!(report.epochs.len(), 2);
        assert!(report.best_epoch.is_some());
        assert!(out.join("tokenizer.json").exists());
        assert!(out.join("train_config.json").exists());
        assert!(out.join("runs").join("loss.csv").exists());

        let summary = EvaluateUseCase::new(&out, BackendKind::NdArray)
            .execute(&data.display().to_string())
            .unwrap();
        assert!(summary.loss.is_finite());
        assert!((0.0..=1.0).contains(&summary.acc));
        // same data as the best epoch's validation pass; weights reload at half precision
        assert!((summary.loss - report.best_val_loss).abs() < 5e-2);
    }

    #[test]
    fn test_evaluate_without_training_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = EvaluateUseCase::new(dir.path(), BackendKind::NdArray)
            .execute("missing.tsv")
            .unwrap_err();
        assert!(format!("{err:#}").contains("train_config.json"));
    }
}
