use anyhow::{bail, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::data::batcher::PAD_ID;
use crate::domain::sentence::LabeledSentence;

/// One tokenised sentence. Ids are truncated to `max_len` but NOT
/// padded; the batcher pads every batch to the fixed model width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanItem {
    pub token_ids: Vec<u32>,
    pub label:     usize,
}

#[derive(Debug, Clone)]
pub struct SanDataset {
    items: Vec<SanItem>,
}

impl SanDataset {
    pub fn new(items: Vec<SanItem>) -> Self { Self { items } }

    /// Tokenise sentences, truncating each to `max_len` ids.
    ///
    /// Sentences that tokenise to nothing would be all padding and
    /// break the attention softmax, so they are skipped with a warning.
    pub fn encode(
        sentences:   &[LabeledSentence],
        tokenizer:   &Tokenizer,
        max_len:     usize,
        num_classes: usize,
    ) -> Result<Self> {
        let mut items   = Vec::with_capacity(sentences.len());
        let mut skipped = 0usize;

        for sentence in sentences {
            if sentence.label >= num_classes {
                bail!(
                    "label {} out of range for {} classes (sentence: '{}')",
                    sentence.label, num_classes, sentence.text
                );
            }

            let enc = tokenizer
                .encode(sentence.text.as_str(), false)
                .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;

            // Id 0 is reserved for padding; a vocabulary saved with [PAD]
            // as an added token could still produce it from text.
            let mut token_ids = enc.get_ids().to_vec();
            token_ids.retain(|&id| id != PAD_ID);
            if token_ids.is_empty() {
                skipped += 1;
                continue;
            }
            token_ids.truncate(max_len);

            items.push(SanItem { token_ids, label: sentence.label });
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} sentences with no tokens", skipped);
        }
        Ok(Self { items })
    }

    pub fn items(&self) -> &[SanItem] { &self.items }
}

impl Dataset<SanItem> for SanDataset {
    fn get(&self, index: usize) -> Option<SanItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
