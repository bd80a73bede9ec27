// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: no model math, no printing.
//
//   train_use_case    — corpus → vocabulary → datasets → training
//   evaluate_use_case — experiment dir + corpus → loss / accuracy

pub mod train_use_case;

pub mod evaluate_use_case;
