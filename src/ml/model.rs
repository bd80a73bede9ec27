use burn::{
    nn::loss::CrossEntropyLossConfig,
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::domain::error::TrainError;
use crate::ml::classifier::{Classifier, ClassifierConfig};
use crate::ml::encoder::{AttentionEncoder, AttentionEncoderConfig};
use crate::ml::penalty::frobenius_penalty;

/// Whether a forward pass is part of a training step or an evaluation.
///
/// Passed explicitly to every forward call; the model itself carries no mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

#[derive(Config, Debug)]
pub struct SanConfig {
    pub vocab_size:      usize,
    pub embedding_dim:   usize,
    pub lstm_hidden_dim: usize,
    pub da:              usize,
    pub r:               usize,
    pub hidden_dim:      usize,
    pub num_classes:     usize,
    pub max_len:         usize,
    #[config(default = 0.0)]
    pub dropout:         f64,
}

impl SanConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SanModel<B> {
        let encoder_cfg = AttentionEncoderConfig::new(
            self.vocab_size, self.embedding_dim, self.lstm_hidden_dim,
            self.da, self.r, self.max_len,
        );
        let head_cfg = ClassifierConfig::new(
            self.r, encoder_cfg.hidden_dim(), self.hidden_dim, self.num_classes,
        )
        .with_dropout(self.dropout);

        SanModel {
            encoder:    encoder_cfg.init(device),
            classifier: head_cfg.init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct SanModel<B: Backend> {
    pub encoder:    AttentionEncoder<B>,
    pub classifier: Classifier<B>,
}

pub struct SanOutput<B: Backend> {
    /// [batch, num_classes]
    pub logits:     Tensor<B, 2>,
    /// [batch, r, T]
    pub attention:  Tensor<B, 3>,
    /// [batch, r, H]
    pub embeddings: Tensor<B, 3>,
}

/// Everything one optimisation step needs from the forward pass.
pub struct SanStep<B: Backend> {
    /// cross-entropy + penalty, the value that gets backpropagated
    pub loss:    Tensor<B, 1>,
    pub penalty: Tensor<B, 1>,
    pub output:  SanOutput<B>,
}

impl<B: Backend> SanModel<B> {
    /// tokens: [batch, max_len] → logits, attention, sentence embeddings
    pub fn forward(&self, tokens: Tensor<B, 2, Int>, mode: Mode) -> Result<SanOutput<B>, TrainError> {
        let encoded = self.encoder.forward(tokens)?;
        let logits  = self.classifier.forward(encoded.embeddings.clone(), mode);

        Ok(SanOutput {
            logits,
            attention:  encoded.attention,
            embeddings: encoded.embeddings,
        })
    }

    /// Train-mode forward pass plus total loss.
    pub fn forward_loss(
        &self,
        tokens: Tensor<B, 2, Int>,
        labels: Tensor<B, 1, Int>,
    ) -> Result<SanStep<B>, TrainError>
    where
        B: AutodiffBackend,
    {
        let output = self.forward(tokens, Mode::Train)?;

        let ce = CrossEntropyLossConfig::new()
            .init(&output.logits.device())
            .forward(output.logits.clone(), labels);
        let penalty = frobenius_penalty(output.attention.clone());

        Ok(SanStep { loss: ce + penalty.clone(), penalty, output })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{backend_lock, tiny_config, TestAutodiffBackend};

    #[test]
    fn test_forward_loss_is_finite_and_includes_penalty() {
        let _guard = backend_lock();
        let device = Default::default();
        let model: SanModel<TestAutodiffBackend> = tiny_config().init(&device);

        let tokens = Tensor::<TestAutodiffBackend, 2, Int>::from_data(
            TensorData::new(vec![2, 3, 4, 0, 0, 5, 6, 7, 8, 9], [2, 5]),
            &device,
        );
        let labels = Tensor::<TestAutodiffBackend, 1, Int>::from_data(
            TensorData::new(vec![0, 1], [2]),
            &device,
        );

        let step = model.forward_loss(tokens, labels).unwrap();
        let loss: f32    = step.loss.clone().into_scalar();
        let penalty: f32 = step.penalty.into_scalar();

        assert!(loss.is_finite());
        assert!(penalty >= 0.0);
        assert!(loss >= penalty);
        assert_eq!(step.output.logits.dims(), [2, 2]);

        // gradients flow back to the attention projection
        let grads = step.loss.backward();
        assert!(model.encoder.ws1.weight.val().grad(&grads).is_some());
    }
}
