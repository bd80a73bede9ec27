// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a corpus file to fixed-shape tensor batches:
//
//   corpus.tsv
//       │
//       ▼
//   TsvCorpusLoader   → reads rows, cleans text (Preprocessor)
//       │
//       ▼
//   split_train_val   → only if no validation file is given
//       │
//       ▼
//   SanDataset        → tokenised sentences (Burn Dataset)
//       │
//       ▼
//   SanBatcher        → [batch, max_len] token / [batch] label tensors
//       │
//       ▼
//   DataLoader        → feeds batches to the training loop

pub mod loader;

pub mod preprocessor;

pub mod dataset;

pub mod batcher;

pub mod splitter;
