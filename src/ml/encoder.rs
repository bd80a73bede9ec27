// ============================================================
// Layer 5 — Structured Self-Attention Encoder
// ============================================================
// tokens [B, T]
//   │  Embedding                       → [B, T, E]
//   │  BiLstm                          → H = [B, T, 2·lstm_hidden]
//   │  W_s2 · tanh(W_s1 · H)           → scores [B, T, r]
//   │  PAD positions ← −∞, softmax(T)  → A  [B, r, T]
//   ▼  A · H                           → M  [B, r, 2·lstm_hidden]
//
// Each of the r attention rows is a distribution over the real
// (non-padding) timesteps of its sentence.
//
// Reference: Lin et al. (2017) A Structured Self-attentive
//            Sentence Embedding

use burn::{
    nn::{BiLstm, BiLstmConfig, Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};

use crate::data::batcher::PAD_ID;
use crate::domain::error::TrainError;

#[derive(Config, Debug)]
pub struct AttentionEncoderConfig {
    pub vocab_size:      usize,
    pub embedding_dim:   usize,
    pub lstm_hidden_dim: usize,
    /// Width of the attention projection (d_a)
    pub da:              usize,
    /// Number of attention rows
    pub r:               usize,
    /// Fixed number of timesteps every batch is padded to
    pub max_len:         usize,
}

impl AttentionEncoderConfig {
    /// Width of one hidden state / one sentence-embedding row.
    pub fn hidden_dim(&self) -> usize {
        2 * self.lstm_hidden_dim
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> AttentionEncoder<B> {
        AttentionEncoder {
            embedding: EmbeddingConfig::new(self.vocab_size, self.embedding_dim).init(device),
            bilstm:    BiLstmConfig::new(self.embedding_dim, self.lstm_hidden_dim, true).init(device),
            ws1:       LinearConfig::new(self.hidden_dim(), self.da).with_bias(false).init(device),
            ws2:       LinearConfig::new(self.da, self.r).with_bias(false).init(device),
            r:          self.r,
            max_len:    self.max_len,
            hidden_dim: self.hidden_dim(),
        }
    }
}

#[derive(Module, Debug)]
pub struct AttentionEncoder<B: Backend> {
    pub embedding:  Embedding<B>,
    pub bilstm:     BiLstm<B>,
    pub ws1:        Linear<B>,
    pub ws2:        Linear<B>,
    pub r:          usize,
    pub max_len:    usize,
    pub hidden_dim: usize,
}

pub struct EncoderOutput<B: Backend> {
    /// Sentence embedding rows — [B, r, H]
    pub embeddings: Tensor<B, 3>,
    /// Attention weights — [B, r, T], each row sums to 1
    pub attention:  Tensor<B, 3>,
}

impl<B: Backend> AttentionEncoder<B> {
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> Result<EncoderOutput<B>, TrainError> {
        let [batch_size, seq_len] = tokens.dims();
        if seq_len != self.max_len {
            return Err(TrainError::Shape(format!(
                "batch has {seq_len} timesteps, model expects {}", self.max_len
            )));
        }

        // true where the token is padding — [B, T]
        let padding = tokens.clone().equal_elem(PAD_ID as i64);
        self.check_no_empty_rows(padding.clone(), batch_size)?;

        let embedded  = self.embedding.forward(tokens);
        let (hidden, _) = self.bilstm.forward(embedded, None);

        let [_, _, width] = hidden.dims();
        if width != self.hidden_dim {
            return Err(TrainError::Shape(format!(
                "encoder produced hidden width {width}, expected {}", self.hidden_dim
            )));
        }

        // [B, T, r]
        let scores = self.ws2.forward(self.ws1.forward(hidden.clone()).tanh());
        let mask   = padding.unsqueeze_dim::<3>(2).repeat_dim(2, self.r);
        let scores = scores.mask_fill(mask, f32::NEG_INFINITY);

        // normalise over time, then rows first: [B, r, T]
        let attention  = softmax(scores, 1).swap_dims(1, 2);
        let embeddings = attention.clone().matmul(hidden);

        Ok(EncoderOutput { embeddings, attention })
    }

    /// A sentence with no real tokens would softmax over nothing but −∞.
    fn check_no_empty_rows(&self, padding: Tensor<B, 2, Bool>, batch_size: usize) -> Result<(), TrainError> {
        let real_tokens = padding.bool_not().int().sum_dim(1).reshape([batch_size]);
        let fewest: i64 = real_tokens.clone().min().into_scalar().elem();
        if fewest == 0 {
            let item: i64 = real_tokens.argmin(0).into_scalar().elem();
            return Err(TrainError::Numerical(format!(
                "sequence {item} in batch is entirely padding; attention is undefined"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{backend_lock, TestBackend};

    fn encoder(max_len: usize) -> AttentionEncoder<TestBackend> {
        AttentionEncoderConfig::new(12, 6, 4, 5, 3, max_len).init(&Default::default())
    }

    fn tokens(rows: &[[i32; 5]]) -> Tensor<TestBackend, 2, Int> {
        let flat: Vec<i32> = rows.iter().flatten().copied().collect();
        Tensor::from_data(TensorData::new(flat, [rows.len(), 5]), &Default::default())
    }

    #[test]
    fn test_output_shapes() {
        let _guard = backend_lock();
        let out = encoder(5).forward(tokens(&[[3, 4, 5, 0, 0], [1, 2, 3, 4, 5]])).unwrap();
        assert_eq!(out.attention.dims(),  [2, 3, 5]);
        assert_eq!(out.embeddings.dims(), [2, 3, 8]);
    }

    #[test]
    fn test_rows_sum_to_one_and_padding_gets_zero() {
        let _guard = backend_lock();
        let out = encoder(5).forward(tokens(&[[3, 4, 5, 0, 0], [1, 2, 3, 4, 5]])).unwrap();
        let weights: Vec<f32> = out.attention.into_data().to_vec().unwrap();

        // layout [item][row][t]
        for item in 0..2 {
            for row in 0..3 {
                let start = (item * 3 + row) * 5;
                let dist  = &weights[start..start + 5];
                let total: f32 = dist.iter().sum();
                assert!((total - 1.0).abs() < 1e-5, "row sums to {total}");
                assert!(dist.iter().all(|w| *w >= 0.0));
                if item == 0 {
                    assert_eq!(dist[3], 0.0);
                    assert_eq!(dist[4], 0.0);
                }
            }
        }
    }

    #[test]
    fn test_wrong_sequence_length_is_shape_error() {
        let _guard = backend_lock();
        let err = encoder(7).forward(tokens(&[[1, 2, 3, 4, 5]])).err().unwrap();
        assert!(matches!(err, TrainError::Shape(_)));
    }

    #[test]
    fn test_all_padding_sequence_is_numerical_error() {
        let _guard = backend_lock();
        let err = encoder(5).forward(tokens(&[[1, 2, 0, 0, 0], [0, 0, 0, 0, 0]])).err().unwrap();
        assert!(err.is_numerical());
        assert!(err.to_string().contains("sequence 1"));
    }
}
