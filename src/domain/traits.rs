// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The seams between the training core and its collaborators:
//
//   CorpusSource — anything that yields labelled sentences
//                  (TSV files today, anything else later)
//   ScalarSink   — anything that accepts loss curves for
//                  visualisation (CSV files, in-memory, ...)
//
// The training loop only sees these traits, so tests can plug
// in in-memory implementations.

use anyhow::Result;

use crate::domain::sentence::LabeledSentence;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can load a labelled sentence corpus.
///
/// Implementations:
///   - TsvCorpusLoader → `id \t document \t label` files
pub trait CorpusSource {
    fn load_all(&self) -> Result<Vec<LabeledSentence>>;
}

// ─── ScalarSink ───────────────────────────────────────────────────────────────
/// Receives scalar time series (e.g. train / validation loss by global step).
///
/// Failures are reported to the caller, which logs them and carries on:
/// training correctness never depends on a sink being available.
pub trait ScalarSink {
    fn add_scalars(&mut self, tag: &str, values: &[(&str, f64)], step: usize) -> Result<()>;
}

/// Sink that drops everything. Used when no run directory is wanted.
#[derive(Debug, Default)]
pub struct NullSink;

impl ScalarSink for NullSink {
    fn add_scalars(&mut self, _tag: &str, _values: &[(&str, f64)], _step: usize) -> Result<()> {
        Ok(())
    }
}
