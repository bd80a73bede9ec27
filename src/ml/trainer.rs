// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Adam over CE + attention penalty, with periodic validation,
// a reduce-on-plateau learning rate and best-only checkpoints.
//
//   for epoch:
//     for batch:                      (full batches only)
//       forward(Train) → CE + P → backward → Adam step
//       every summary_step global steps:
//         validation loss → ScalarSink("loss", {train, val})
//     validation loss + acc          (model.valid(), Mode::Eval)
//     scheduler.step(val_loss)
//     selector.consider(...)         → best/ + summary.json
//
// Backends:
//   - training runs on B (an AutodiffBackend)
//   - model.valid() is SanModel<B::InnerBackend>, so evaluation
//     records no graph and cannot touch the training weights
//   - the validation batcher therefore builds inner-backend tensors
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use burn::{
    data::{dataloader::DataLoaderBuilder, dataset::Dataset},
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::data::{batcher::SanBatcher, dataset::SanDataset};
use crate::domain::error::TrainError;
use crate::domain::summary::{EpochSummary, MetricSummary, RunSummary, TrainReport};
use crate::domain::traits::ScalarSink;
use crate::infra::checkpoint::CheckpointManager;
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::evaluator::{
    batch_accuracy, evaluate, metric, AccuracyMetric, BatchMetric, CrossEntropyMetric,
};
use crate::ml::model::{SanConfig, SanModel};
use crate::ml::scheduler::PlateauScheduler;
use crate::ml::selector::{CheckpointSelector, Decision};

/// Seed for the backend RNG and the shuffle order when `seed_fixed` is set.
pub const FIXED_SEED: u64 = 777;

#[derive(Config, Debug)]
pub struct TrainerConfig {
    pub epochs:        usize,
    pub batch_size:    usize,
    pub learning_rate: f64,
    /// Validate and emit `loss/{train,val}` every this many global steps
    #[config(default = 100)]
    pub summary_step:  usize,
    /// Non-improving epochs before the learning rate is cut
    #[config(default = 5)]
    pub patience:      usize,
    #[config(default = false)]
    pub seed_fixed:    bool,
    #[config(default = 1)]
    pub num_workers:   usize,
}

/// Which Burn backend to train on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Wgpu,
    NdArray,
}

/// Where a run writes its side effects.
pub struct RunOutputs {
    pub checkpoints: CheckpointManager,
    pub sink:        Box<dyn ScalarSink>,
    pub epoch_log:   Option<MetricsLogger>,
}

/// Mutable state that lives for exactly one run.
struct RunState {
    selector:  CheckpointSelector,
    scheduler: PlateauScheduler,
}

pub struct TrainOutcome<B: Backend> {
    pub model:  SanModel<B>,
    pub report: TrainReport,
}

pub struct Trainer<'a> {
    cfg:       &'a TrainerConfig,
    model_cfg: &'a SanConfig,
}

impl<'a> Trainer<'a> {
    pub fn new(cfg: &'a TrainerConfig, model_cfg: &'a SanConfig) -> Self {
        Self { cfg, model_cfg }
    }

    pub fn run<B: AutodiffBackend>(
        &self,
        train_dataset: SanDataset,
        val_dataset:   SanDataset,
        outputs:       &mut RunOutputs,
        device:        &B::Device,
    ) -> Result<TrainOutcome<B>, TrainError> {
        let cfg = self.cfg;
        if cfg.batch_size == 0 || cfg.summary_step == 0 {
            return Err(TrainError::Config("batch_size and summary_step must be positive".into()));
        }

        // Partial final batches are dropped, so this is exact
        let steps_per_epoch = train_dataset.len() / cfg.batch_size;
        if steps_per_epoch == 0 {
            return Err(TrainError::EmptyDataset("training"));
        }

        // ── Seeding ───────────────────────────────────────────────────────────
        let shuffle_seed = if cfg.seed_fixed {
            B::seed(FIXED_SEED);
            FIXED_SEED
        } else {
            rand::random()
        };

        // ── Build model + Adam ────────────────────────────────────────────────
        let mut model: SanModel<B> = self.model_cfg.init(device);
        let mut optim = AdamConfig::new().init();
        tracing::info!(
            "Model ready: vocab={}, r={}, da={}, lstm_hidden={}",
            self.model_cfg.vocab_size, self.model_cfg.r, self.model_cfg.da, self.model_cfg.lstm_hidden_dim,
        );

        // ── Data loaders ──────────────────────────────────────────────────────
        tracing::info!(
            "Training on {} sentences ({} steps/epoch), validating on {}",
            train_dataset.len(), steps_per_epoch, val_dataset.len(),
        );
        let train_loader = DataLoaderBuilder::new(SanBatcher::<B>::new(self.model_cfg.max_len))
            .batch_size(cfg.batch_size)
            .shuffle(shuffle_seed)
            .num_workers(cfg.num_workers)
            .build(train_dataset);

        let val_loader = DataLoaderBuilder::new(SanBatcher::<B::InnerBackend>::new(self.model_cfg.max_len))
            .batch_size(cfg.batch_size)
            .num_workers(cfg.num_workers)
            .build(val_dataset);

        let loss_only: [(&str, &dyn BatchMetric<B::InnerBackend>); 1] =
            [("loss", &CrossEntropyMetric)];
        let full: [(&str, &dyn BatchMetric<B::InnerBackend>); 2] =
            [("loss", &CrossEntropyMetric), ("acc", &AccuracyMetric)];

        let mut state = RunState {
            selector:  CheckpointSelector::new(),
            scheduler: PlateauScheduler::new(cfg.learning_rate, cfg.patience),
        };
        let mut report = TrainReport::new();

        // ── Epoch loop ────────────────────────────────────────────────────────
        for epoch in 0..cfg.epochs {
            let mut loss_sum = 0.0f64;
            let mut acc_sum  = 0.0f64;
            let mut batches  = 0usize;

            for (step, batch) in train_loader.iter().enumerate() {
                if batch.labels.dims()[0] < cfg.batch_size {
                    continue;
                }

                let labels = batch.labels.clone();
                let out = model
                    .forward_loss(batch.tokens, batch.labels)
                    .map_err(|e| e.at(epoch + 1, step))?;

                let loss_val: f64 = out.loss.clone().into_scalar().elem::<f64>();
                if !loss_val.is_finite() {
                    return Err(TrainError::Numerical(format!("total loss is {loss_val}")).at(epoch + 1, step));
                }
                let acc = batch_accuracy(out.output.logits.detach(), labels);

                let grads = GradientsParams::from_grads(out.loss.backward(), &model);
                model = optim.step(state.scheduler.lr(), model, grads);

                loss_sum += loss_val;
                acc_sum  += acc;
                batches  += 1;

                let global_step = epoch * steps_per_epoch + step;
                if global_step % cfg.summary_step == 0 {
                    let val      = evaluate(&model.valid(), val_loader.iter(), &loss_only)
                        .map_err(|e| e.at(epoch + 1, step))?;
                    let val_loss = metric(&val, "loss");
                    let running  = loss_sum / batches as f64;
                    tracing::debug!("step {global_step}: train={running:.4} val={val_loss:.4}");

                    if let Err(e) = outputs.sink.add_scalars(
                        "loss",
                        &[("train", running), ("val", val_loss)],
                        global_step,
                    ) {
                        tracing::warn!("Scalar sink failed at step {global_step}: {e:#}");
                    }
                }
            }

            if batches == 0 {
                return Err(TrainError::EmptyDataset("training"));
            }

            // ── Epoch evaluation ──────────────────────────────────────────────
            // reported as the step after the last training step
            let val = evaluate(&model.valid(), val_loader.iter(), &full)
                .map_err(|e| e.at(epoch + 1, steps_per_epoch))?;
            let summary = RunSummary {
                train:      MetricSummary::new(loss_sum / batches as f64, acc_sum / batches as f64),
                validation: MetricSummary::new(metric(&val, "loss"), metric(&val, "acc")),
            };

            state.scheduler.step(summary.validation.loss);

            // ── Checkpoint decision ───────────────────────────────────────────
            let improved = match state.selector.consider(epoch + 1, &summary, |ep, s| {
                outputs.checkpoints.save_best(&model, &optim, ep)?;
                outputs.checkpoints.save_summary(s)
            }) {
                Ok(Decision::Saved) => {
                    report.best_epoch = Some(epoch + 1);
                    true
                }
                Ok(Decision::Skipped) => false,
                Err(e) => {
                    tracing::error!("Epoch {} improved but its checkpoint was lost: {e}", epoch + 1);
                    report.lost_checkpoints.push(epoch + 1);
                    false
                }
            };
            report.best_val_loss = state.selector.best_val_loss();

            let epoch_summary = EpochSummary {
                epoch: epoch + 1,
                summary,
                lr: state.scheduler.lr(),
                improved,
            };

            println!(
                "Epoch {:>3}/{} | train_loss={:.4} | train_acc={:.1}% | val_loss={:.4} | val_acc={:.1}% | lr={:.1e}{}",
                epoch + 1, cfg.epochs,
                summary.train.loss, summary.train.acc * 100.0,
                summary.validation.loss, summary.validation.acc * 100.0,
                epoch_summary.lr,
                if improved { " *" } else { "" },
            );

            if let Some(log) = &outputs.epoch_log {
                if let Err(e) = log.log(&EpochMetrics::from(&epoch_summary)) {
                    tracing::warn!("Could not log epoch {}: {e:#}", epoch + 1);
                }
            }
            report.epochs.push(epoch_summary);
        }

        tracing::info!(
            "Training complete! best val_loss={:.4} (epoch {:?})",
            report.best_val_loss, report.best_epoch,
        );
        Ok(TrainOutcome { model, report })
    }
}

/// Train on the selected backend's default device.
pub fn run_training(
    cfg:           &TrainerConfig,
    model_cfg:     &SanConfig,
    backend:       BackendKind,
    train_dataset: SanDataset,
    val_dataset:   SanDataset,
    outputs:       &mut RunOutputs,
) -> Result<TrainReport, TrainError> {
    let trainer = Trainer::new(cfg, model_cfg);
    match backend {
        BackendKind::Wgpu => {
            type B = burn::backend::Autodiff<burn::backend::Wgpu>;
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            trainer.run::<B>(train_dataset, val_dataset, outputs, &device).map(|o| o.report)
        }
        BackendKind::NdArray => {
            type B = burn::backend::Autodiff<burn::backend::NdArray<f32>>;
            let device = burn::backend::ndarray::NdArrayDevice::default();
            tracing::info!("Using NdArray device: {:?}", device);
            trainer.run::<B>(train_dataset, val_dataset, outputs, &device).map(|o| o.report)
        }
    }
}
