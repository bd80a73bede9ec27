// ============================================================
// Layer 3 — Training Error Taxonomy
// ============================================================
// Every failure the model, the training loop or the checkpoint
// writer can raise. The CLI layer wraps these in anyhow and
// exits non-zero; nothing below the CLI recovers from them.
//
//   Shape      — batch dimensions disagree with the model config
//   Numerical  — NaN / Inf loss, or an all-padding sequence
//   Resource   — a checkpoint or summary write failed
//   Config     — a hyperparameter is out of range
//
// `at(epoch, step)` attaches the failing position so the final
// message names the batch that broke the run.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building, running or checkpointing the model.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("numerical error: {0}")]
    Numerical(String),

    #[error("failed to persist '{path}': {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0} dataset produced no batches")]
    EmptyDataset(&'static str),

    #[error("epoch {epoch}, step {step}: {source}")]
    AtStep {
        epoch: usize,
        step: usize,
        #[source]
        source: Box<TrainError>,
    },
}

impl TrainError {
    /// Tag an error with the (1-based) epoch and the in-epoch step it came from.
    pub fn at(self, epoch: usize, step: usize) -> Self {
        TrainError::AtStep { epoch, step, source: Box::new(self) }
    }

    pub fn resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrainError::Resource { path: path.into(), source }
    }

    /// True for the NaN / Inf family, including when wrapped by `at`.
    pub fn is_numerical(&self) -> bool {
        match self {
            TrainError::Numerical(_) => true,
            TrainError::AtStep { source, .. } => source.is_numerical(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_step_names_position() {
        let err = TrainError::Numerical("total loss is NaN".into()).at(2, 17);
        let msg = err.to_string();
        assert!(msg.contains("epoch 2"));
        assert!(msg.contains("step 17"));
        assert!(err.is_numerical());
    }

    #[test]
    fn test_shape_is_not_numerical() {
        assert!(!TrainError::Shape("T".into()).at(1, 0).is_numerical());
    }
}
