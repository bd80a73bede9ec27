// ============================================================
// Layer 3 — LabeledSentence Domain Type
// ============================================================
// One raw example from a classification corpus: the sentence
// text and its integer class label. Tokenisation happens later
// (Layer 4), so this type never carries token ids.

use serde::{Deserialize, Serialize};

/// A raw labelled sentence loaded from a corpus file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledSentence {
    /// The sentence text, already cleaned by the preprocessor
    pub text: String,

    /// Class index in `0..num_classes`
    pub label: usize,
}

impl LabeledSentence {
    pub fn new(text: impl Into<String>, label: usize) -> Self {
        Self { text: text.into(), label }
    }
}
