// ============================================================
// Layer 5 — Evaluation Runner
// ============================================================
// One gradient-free pass over a dataset, computing any set of
// named metrics:
//
//   metrics = [("loss", &CrossEntropyMetric), ("acc", &AccuracyMetric)]
//   evaluate(&model.valid(), loader.iter(), &metrics)
//     → { "acc": 0.81, "loss": 0.43 }
//
// The caller passes a model on the inner (non-autodiff) backend,
// so no graph is recorded and the training model is untouched.
// Each batch value is weighted by its batch size, which keeps a
// short final batch from skewing the average.

use std::collections::BTreeMap;

use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};

use crate::domain::error::TrainError;
use crate::data::batcher::SanBatch;
use crate::ml::model::{Mode, SanModel};

/// Metric name → value averaged over every example in the dataset.
pub type Summary = BTreeMap<String, f64>;

/// A metric computed from one batch of logits and labels.
pub trait BatchMetric<B: Backend> {
    fn compute(&self, logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> f64;
}

/// Mean cross-entropy (the classification loss, without the penalty).
pub struct CrossEntropyMetric;

impl<B: Backend> BatchMetric<B> for CrossEntropyMetric {
    fn compute(&self, logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> f64 {
        CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits, labels)
            .into_scalar()
            .elem::<f64>()
    }
}

/// Fraction of examples whose argmax matches the label.
pub struct AccuracyMetric;

impl<B: Backend> BatchMetric<B> for AccuracyMetric {
    fn compute(&self, logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> f64 {
        batch_accuracy(logits, labels)
    }
}

pub fn batch_accuracy<B: Backend>(logits: Tensor<B, 2>, labels: Tensor<B, 1, Int>) -> f64 {
    let [batch_size, _] = logits.dims();
    if batch_size == 0 {
        return 0.0;
    }

    // argmax(1) returns [batch, 1] — flatten before comparing with [batch]
    let correct: i64 = logits
        .argmax(1)
        .reshape([batch_size])
        .equal(labels)
        .int()
        .sum()
        .into_scalar()
        .elem();

    correct as f64 / batch_size as f64
}

/// Look a metric up, NaN if it was not computed.
pub fn metric(summary: &Summary, name: &str) -> f64 {
    summary.get(name).copied().unwrap_or(f64::NAN)
}

pub fn evaluate<B, I>(
    model:   &SanModel<B>,
    batches: I,
    metrics: &[(&str, &dyn BatchMetric<B>)],
) -> Result<Summary, TrainError>
where
    B: Backend,
    I: IntoIterator<Item = SanBatch<B>>,
{
    let mut totals: Summary = metrics.iter().map(|(name, _)| (name.to_string(), 0.0)).collect();
    let mut examples = 0usize;

    for batch in batches {
        let batch_size = batch.labels.dims()[0];
        let output     = model.forward(batch.tokens, Mode::Eval)?;

        for (name, m) in metrics {
            let value = m.compute(output.logits.clone(), batch.labels.clone());
            *totals.entry(name.to_string()).or_default() += value * batch_size as f64;
        }
        examples += batch_size;
    }

    if examples == 0 {
        return Err(TrainError::EmptyDataset("evaluation"));
    }

    for value in totals.values_mut() {
        *value /= examples as f64;
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::SanBatcher;
    use crate::test_util::{backend_lock, tiny_config, tiny_dataset, TestBackend};
    use burn::data::dataloader::batcher::Batcher;

    fn batches(batch_size: usize) -> Vec<SanBatch<TestBackend>> {
        let batcher = SanBatcher::<TestBackend>::new(5);
        let items   = tiny_dataset().items().to_vec();
        items
            .chunks(batch_size)
            .map(|chunk| batcher.batch(chunk.to_vec(), &Default::default()))
            .collect()
    }

    fn params(model: &SanModel<TestBackend>) -> Vec<Vec<f32>> {
        vec![
            model.encoder.embedding.weight.val().into_data().to_vec().unwrap(),
            model.encoder.ws1.weight.val().into_data().to_vec().unwrap(),
            model.encoder.ws2.weight.val().into_data().to_vec().unwrap(),
            model.classifier.fc1.weight.val().into_data().to_vec().unwrap(),
            model.classifier.fc2.weight.val().into_data().to_vec().unwrap(),
        ]
    }

    #[test]
    fn test_accuracy_counts_argmax_matches() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(vec![2.0f32, 1.0, 0.0, 3.0, 5.0, 1.0], [3, 2]),
            &device,
        );
        let labels = Tensor::<TestBackend, 1, Int>::from_data(TensorData::new(vec![0, 1, 1], [3]), &device);
        assert!((batch_accuracy(logits, labels) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_evaluation_leaves_parameters_untouched() {
        let _guard = backend_lock();
        let model: SanModel<TestBackend> = tiny_config().init(&Default::default());
        let before = params(&model);

        let metrics: [(&str, &dyn BatchMetric<TestBackend>); 2] =
            [("loss", &CrossEntropyMetric), ("acc", &AccuracyMetric)];
        let summary = evaluate(&model, batches(2), &metrics).unwrap();

        assert_eq!(params(&model), before);
        assert!(metric(&summary, "loss").is_finite());
        let acc = metric(&summary, "acc");
        assert!((0.0..=1.0).contains(&acc));
    }

    #[test]
    fn test_partial_final_batch_is_weighted_by_size() {
        let _guard = backend_lock();
        let model: SanModel<TestBackend> = tiny_config().init(&Default::default());
        let metrics: [(&str, &dyn BatchMetric<TestBackend>); 1] = [("loss", &CrossEntropyMetric)];

        // batches of 3 + 1 and 4 must agree: both are per-example means
        let split = metric(&evaluate(&model, batches(3), &metrics).unwrap(), "loss");
        let whole = metric(&evaluate(&model, batches(4), &metrics).unwrap(), "loss");
        assert!((split - whole).abs() < 1e-5, "{split} vs {whole}");
    }

    #[test]
    fn test_empty_dataset_is_an_error() {
        let _guard = backend_lock();
        let model: SanModel<TestBackend> = tiny_config().init(&Default::default());
        let metrics: [(&str, &dyn BatchMetric<TestBackend>); 1] = [("acc", &AccuracyMetric)];
        let result = evaluate(&model, Vec::new(), &metrics);
        assert!(matches!(result, Err(TrainError::EmptyDataset(_))));
    }
}
