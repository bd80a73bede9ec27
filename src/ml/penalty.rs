// ============================================================
// Layer 5 — Attention Diversity Penalty
// ============================================================
// P = mean over batch of ‖ A·Aᵀ − I ‖_F
//
//   A      [B, r, T]   attention rows of one sentence
//   A·Aᵀ   [B, r, r]   row-by-row dot products
//
// The norm is taken per sentence and only then averaged; the
// identity is broadcast over the batch axis. P = 0 exactly when
// every sentence's rows are orthonormal.

use burn::prelude::*;

pub fn frobenius_penalty<B: Backend>(attention: Tensor<B, 3>) -> Tensor<B, 1> {
    per_item_penalty(attention).mean()
}

/// ‖A·Aᵀ − I‖_F for every batch item — [B]
pub fn per_item_penalty<B: Backend>(attention: Tensor<B, 3>) -> Tensor<B, 1> {
    let [batch_size, r, _] = attention.dims();
    let device = attention.device();

    let sim      = attention.clone().matmul(attention.swap_dims(1, 2));
    let identity = Tensor::<B, 2>::eye(r, &device).unsqueeze::<3>();

    (sim - identity)
        .powf_scalar(2.0)
        .sum_dim(2)
        .sum_dim(1)
        .sqrt()
        .reshape([batch_size])
}
