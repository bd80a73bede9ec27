// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds, saves and loads the word-level vocabulary.
//
// The vocabulary is a HuggingFace WordLevel tokenizer written
// straight to tokenizer.json (no trainer round-trip):
//
//   [PAD] = 0   padding, masked out of attention
//   [UNK] = 1   any word below min_freq
//   2..        corpus words, most frequent first
//
// Counting uses the same lowercase + whitespace/punctuation
// split the tokenizer applies at encode time, so every counted
// word is reachable.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use tokenizers::Tokenizer;

use crate::data::batcher::PAD_ID;

pub const PAD_TOKEN: &str = "[PAD]";
pub const UNK_TOKEN: &str = "[UNK]";

const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load an existing tokenizer or build a new one from the training texts
    pub fn load_or_build(&self, texts: &[String], min_freq: usize) -> Result<Tokenizer> {
        if self.dir.join(TOKENIZER_FILE).exists() {
            tracing::info!("Loading existing tokenizer from '{}'", self.dir.display());
            self.load()
        } else {
            tracing::info!("Building new vocabulary (min_freq={})", min_freq);
            self.build_and_save(texts, min_freq)
        }
    }

    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.dir.join(TOKENIZER_FILE);
        Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))
    }

    /// Count words, keep those seen at least `min_freq` times, and write
    /// a WordLevel tokenizer JSON that `Tokenizer::from_file` accepts.
    pub fn build_and_save(&self, texts: &[String], min_freq: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Word frequencies ──────────────────────────────────────────
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for word in pre_tokenize(text) {
                *freq.entry(word).or_insert(0) += 1;
            }
        }

        // Frequency descending, then alphabetical so ids are stable
        let mut words: Vec<(String, usize)> = freq
            .into_iter()
            .filter(|(_, n)| *n >= min_freq.max(1))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        // ── Step 2: Vocab JSON ────────────────────────────────────────────────
        let mut vocab = serde_json::Map::new();
        vocab.insert(PAD_TOKEN.into(), serde_json::json!(PAD_ID));
        vocab.insert(UNK_TOKEN.into(), serde_json::json!(1));
        for (word, _) in &words {
            let next_id = vocab.len();
            vocab.entry(word.clone()).or_insert_with(|| serde_json::json!(next_id));
        }
        let vocab_size = vocab.len();

        // ── Step 3: HuggingFace tokenizer JSON ────────────────────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            // Specials live only in the vocab, so corpus text can never
            // be extracted as [PAD] or [UNK].
            "added_tokens": [],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let tok_path = self.dir.join(TOKENIZER_FILE);
        std::fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!(
            "Vocabulary built with {} entries, saved to '{}'",
            vocab_size,
            tok_path.display()
        );

        Tokenizer::from_file(&tok_path)
            .map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

/// Lowercase, then split into runs of word characters and runs of
/// punctuation, mirroring the `Whitespace` pre-tokenizer.
fn pre_tokenize(text: &str) -> Vec<String> {
    let mut words   = Vec::new();
    let mut current = String::new();
    let mut in_word = false;

    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        let is_word = c.is_alphanumeric() || c == '_';
        if !current.is_empty() && is_word != in_word {
            words.push(std::mem::take(&mut current));
        }
        in_word = is_word;
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_tokenize_splits_punctuation() {
        assert_eq!(pre_tokenize("Great movie!!  Loved_it"), vec!["great", "movie", "!!", "loved_it"]);
    }

    #[test]
    fn test_special_ids_and_unknown_words() {
        let dir   = tempfile::tempdir().unwrap();
        let texts = vec!["good good movie".to_string(), "bad".to_string()];
        let tok   = TokenizerStore::new(dir.path()).build_and_save(&texts, 2).unwrap();

        assert_eq!(tok.token_to_id(PAD_TOKEN), Some(PAD_ID));
        assert_eq!(tok.token_to_id(UNK_TOKEN), Some(1));
        // only "good" reaches min_freq = 2
        assert_eq!(tok.get_vocab_size(true), 3);

        let enc = tok.encode("Good bad", false).unwrap();
        assert_eq!(enc.get_ids(), &[2, 1]);
    }

    #[test]
    fn test_literal_special_tokens_in_text_are_plain_words() {
        let dir   = tempfile::tempdir().unwrap();
        let texts = vec!["good [PAD] movie".to_string(), "[UNK] bad".to_string()];
        let tok   = TokenizerStore::new(dir.path()).build_and_save(&texts, 1).unwrap();

        let ids = tok.encode("[PAD]", false).unwrap().get_ids().to_vec();
        assert!(!ids.is_empty());
        assert!(!ids.contains(&PAD_ID));

        let ids = tok.encode("good [PAD] movie [UNK]", false).unwrap().get_ids().to_vec();
        assert!(!ids.contains(&PAD_ID));
        // "[", "pad", "]" are ordinary vocabulary entries here
        assert!(!ids.contains(&1));
    }

    #[test]
    fn test_load_or_build_reuses_saved_vocab() {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let first = store.load_or_build(&["a b c".to_string()], 1).unwrap();
        let again = store.load_or_build(&["completely different".to_string()], 1).unwrap();
        assert_eq!(first.get_vocab_size(true), again.get_vocab_size(true));
    }
}
