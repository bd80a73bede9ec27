// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the output directory:
//
//   checkpoint.rs      — best/ checkpoint (model + optimizer +
//                        epoch) swapped in atomically, plus
//                        summary.json and train_config.json
//
//   tokenizer_store.rs — builds the WordLevel vocabulary from
//                        the training sentences, or reloads the
//                        saved tokenizer.json so evaluation sees
//                        the same ids
//
//   metrics.rs         — per-epoch metrics.csv and the CSV
//                        scalar sink behind runs/loss.csv

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer training, saving, and loading
pub mod tokenizer_store;

/// Training metrics CSV logger
pub mod metrics;
