// Shared fixtures for unit tests.
//
// Burn's NdArray backend draws every random initialisation from one
// process-wide RNG. Tests that build models or seed that RNG take
// `backend_lock()` so parallel tests cannot interleave draws.

use std::sync::{Mutex, MutexGuard};

use burn::backend::{Autodiff, NdArray};

use crate::data::dataset::{SanDataset, SanItem};
use crate::ml::model::SanConfig;

pub type TestBackend         = NdArray<f32>;
pub type TestAutodiffBackend = Autodiff<TestBackend>;

static BACKEND_LOCK: Mutex<()> = Mutex::new(());

pub fn backend_lock() -> MutexGuard<'static, ()> {
    BACKEND_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// vocab 12, max_len 5, r = 2, two classes.
pub fn tiny_config() -> SanConfig {
    SanConfig::new(12, 6, 4, 5, 2, 8, 2, 5)
}

/// Four fixed sentences of length ≤ 5 over two classes.
pub fn tiny_dataset() -> SanDataset {
    SanDataset::new(vec![
        SanItem { token_ids: vec![2, 3, 4, 5, 6],  label: 0 },
        SanItem { token_ids: vec![7, 8, 9],        label: 1 },
        SanItem { token_ids: vec![2, 4, 6, 8, 10], label: 0 },
        SanItem { token_ids: vec![11, 9, 7, 5],    label: 1 },
    ])
}
