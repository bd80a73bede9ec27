// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// The self-attentive classifier and everything that trains it:
//
//   encoder.rs    — Embedding → BiLSTM → r-row structured
//                   self-attention → sentence embedding M
//   penalty.rs    — ‖A·Aᵀ − I‖_F redundancy penalty
//   classifier.rs — flatten(M) → MLP → logits
//   model.rs      — encoder + head, the loss used for training
//
//   evaluator.rs  — gradient-free pass computing named metrics
//   scheduler.rs  — reduce-on-plateau learning rate
//   selector.rs   — keeps only the best-validation checkpoint
//   trainer.rs    — the epoch loop tying it all together
//
// Reference: Lin et al. (2017) A Structured Self-attentive
//            Sentence Embedding
//            Burn Book §3 (Building Blocks), §5 (Training)

pub mod encoder;

pub mod penalty;

pub mod classifier;

pub mod model;

/// Loss / accuracy over a whole dataset
pub mod evaluator;

pub mod scheduler;

pub mod selector;

/// Full training loop with validation and checkpointing
pub mod trainer;
