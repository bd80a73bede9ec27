// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, enums and traits that define the core
// concepts of the system:
//
//   sentence.rs — a labelled sentence from the corpus
//   summary.rs  — per-epoch metrics and the run report
//   error.rs    — the training error taxonomy
//   traits.rs   — collaborator seams (corpus, scalar sink)
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

pub mod error;

pub mod sentence;

pub mod summary;

pub mod traits;
