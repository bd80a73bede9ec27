// ============================================================
// Layer 4 — Sentence Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<SanItem> into
// fixed-shape tensors:
//
//   tokens: [batch_size, max_len]  (Int, right-padded with PAD_ID)
//   labels: [batch_size]           (Int)
//
// Every batch has the same width regardless of the longest
// sentence in it, so the encoder can check T against its config.

use std::marker::PhantomData;

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::SanItem;

/// Token id reserved for padding; `[PAD]` in the vocabulary.
pub const PAD_ID: u32 = 0;

#[derive(Debug, Clone)]
pub struct SanBatch<B: Backend> {
    /// Token ids — shape: [batch_size, max_len]
    pub tokens: Tensor<B, 2, Int>,

    /// Class labels — shape: [batch_size]
    pub labels: Tensor<B, 1, Int>,
}

#[derive(Clone, Debug)]
pub struct SanBatcher<B: Backend> {
    max_len:  usize,
    _backend: PhantomData<B>,
}

impl<B: Backend> SanBatcher<B> {
    pub fn new(max_len: usize) -> Self {
        Self { max_len, _backend: PhantomData }
    }
}

impl<B: Backend> Batcher<B, SanItem, SanBatch<B>> for SanBatcher<B> {
    fn batch(&self, items: Vec<SanItem>, device: &B::Device) -> SanBatch<B> {
        let batch_size = items.len();

        // Pad (or cut) every row to exactly max_len
        let tokens: Vec<i32> = items
            .iter()
            .flat_map(|item| {
                item.token_ids
                    .iter()
                    .copied()
                    .chain(std::iter::repeat(PAD_ID))
                    .take(self.max_len)
                    .map(|id| id as i32)
            })
            .collect();

        let labels: Vec<i32> = items.iter().map(|item| item.label as i32).collect();

        let tokens = Tensor::<B, 2, Int>::from_data(
            TensorData::new(tokens, [batch_size, self.max_len]),
            device,
        );
        let labels = Tensor::<B, 1, Int>::from_data(
            TensorData::new(labels, [batch_size]),
            device,
        );

        SanBatch { tokens, labels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TestBackend;

    #[test]
    fn test_pads_and_truncates_to_max_len() {
        let device  = Default::default();
        let batcher = SanBatcher::<TestBackend>::new(4);
        let batch = batcher.batch(
            vec![
                SanItem { token_ids: vec![5, 6], label: 1 },
                SanItem { token_ids: vec![2, 3, 4, 5, 6, 7], label: 0 },
            ],
            &device,
        );

        assert_eq!(batch.tokens.dims(), [2, 4]);
        let tokens: Vec<i64> = batch.tokens.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(tokens, vec![5, 6, 0, 0, 2, 3, 4, 5]);

        let labels: Vec<i64> = batch.labels.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(labels, vec![1, 0]);
    }
}
