// ============================================================
// Layer 5 — Classification Head
// ============================================================
// M [B, r, H] → flatten [B, r·H] → dropout (train only)
//   → Linear(r·H → hidden) → ReLU → Linear(hidden → C) → logits

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::model::Mode;

#[derive(Config, Debug)]
pub struct ClassifierConfig {
    /// Number of attention rows feeding the head
    pub r:           usize,
    /// Width of one sentence-embedding row
    pub encoder_dim: usize,
    pub hidden_dim:  usize,
    pub num_classes: usize,
    #[config(default = 0.0)]
    pub dropout:     f64,
}

impl ClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Classifier<B> {
        Classifier {
            fc1:     LinearConfig::new(self.r * self.encoder_dim, self.hidden_dim).init(device),
            fc2:     LinearConfig::new(self.hidden_dim, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct Classifier<B: Backend> {
    pub fc1:     Linear<B>,
    pub fc2:     Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> Classifier<B> {
    /// embeddings: [B, r, H] → logits: [B, num_classes]
    pub fn forward(&self, embeddings: Tensor<B, 3>, mode: Mode) -> Tensor<B, 2> {
        let [batch_size, r, width] = embeddings.dims();
        let flat = embeddings.reshape([batch_size, r * width]);

        let flat = match mode {
            Mode::Train => self.dropout.forward(flat),
            Mode::Eval  => flat,
        };

        self.fc2.forward(relu(self.fc1.forward(flat)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{backend_lock, TestAutodiffBackend};

    #[test]
    fn test_logit_shape() {
        let _guard = backend_lock();
        let device = Default::default();
        let head: Classifier<TestAutodiffBackend> = ClassifierConfig::new(2, 4, 8, 3).init(&device);
        let logits = head.forward(Tensor::ones([5, 2, 4], &device), Mode::Eval);
        assert_eq!(logits.dims(), [5, 3]);
    }

    #[test]
    fn test_eval_mode_skips_dropout() {
        let _guard = backend_lock();
        let device = Default::default();
        let head: Classifier<TestAutodiffBackend> = ClassifierConfig::new(2, 4, 8, 3)
            .with_dropout(0.9)
            .init(&device);
        let input = Tensor::<TestAutodiffBackend, 3>::ones([4, 2, 4], &device);

        let a: Vec<f32> = head.forward(input.clone(), Mode::Eval).into_data().to_vec().unwrap();
        let b: Vec<f32> = head.forward(input, Mode::Eval).into_data().to_vec().unwrap();
        assert_eq!(a, b);
    }
}
