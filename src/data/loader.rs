// ============================================================
// Layer 4 — TSV Corpus Loader
// ============================================================
// Loads a labelled sentence corpus from a tab-separated file.
//
// Expected layout (NSMC style, header line optional):
//
//   id        document                 label
//   9976970   아 더빙.. 진짜 짜증나네요    0
//   3819312   흠...포스터보고 초딩영화줄   1
//
// Only the last two columns matter: the second-to-last is the
// sentence, the last is the integer class label. A first line
// whose label column is not a number is treated as the header.

use anyhow::{bail, Context, Result};
use std::{fs, path::PathBuf};

use crate::data::preprocessor::Preprocessor;
use crate::domain::sentence::LabeledSentence;
use crate::domain::traits::CorpusSource;

/// Loads one `.tsv` / `.txt` corpus file.
/// Implements the CorpusSource trait from Layer 3.
pub struct TsvCorpusLoader {
    path:         PathBuf,
    preprocessor: Preprocessor,
}

impl TsvCorpusLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), preprocessor: Preprocessor::new() }
    }

    /// Parse corpus text that has already been read into memory.
    pub fn parse(&self, contents: &str) -> Result<Vec<LabeledSentence>> {
        let mut sentences = Vec::new();

        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 2 {
                bail!(
                    "{}:{}: expected at least 2 tab-separated columns, found {}",
                    self.path.display(), line_no + 1, columns.len()
                );
            }

            let text  = columns[columns.len() - 2];
            let label = columns[columns.len() - 1].trim();

            let label: usize = match label.parse() {
                Ok(label) => label,
                // Header row
                Err(_) if line_no == 0 => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!(
                        "{}:{}: label '{}' is not a class index",
                        self.path.display(), line_no + 1, label
                    ));
                }
            };

            sentences.push(LabeledSentence::new(self.preprocessor.clean(text), label));
        }

        Ok(sentences)
    }
}

impl CorpusSource for TsvCorpusLoader {
    fn load_all(&self) -> Result<Vec<LabeledSentence>> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read corpus '{}'", self.path.display()))?;

        let sentences = self.parse(&contents)?;
        tracing::info!("Loaded {} sentences from '{}'", sentences.len(), self.path.display());
        Ok(sentences)
    }
}
