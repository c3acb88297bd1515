//! Softmax and top-k ranking of classifier output

use crate::classifier::candle_err;
use crate::label_map::LabelMap;
use candle_core::{DType, Tensor, D};
use std::cmp::Ordering;
use threatscan_core::{Error, Prediction, Result};

/// Probability distribution over classes from raw logits
pub fn softmax(logits: &Tensor) -> Result<Vec<f32>> {
    let flat = logits
        .flatten_all()
        .and_then(|t| t.to_dtype(DType::F32))
        .map_err(candle_err("Failed to flatten logits"))?;

    candle_nn::ops::softmax(&flat, D::Minus1)
        .map_err(candle_err("Softmax failed"))?
        .to_vec1::<f32>()
        .map_err(candle_err("Failed to convert to vec"))
}

/// Clamp a requested `top_k` into `[1, num_classes]`
pub fn clamp_top_k(top_k: usize, num_classes: usize) -> usize {
    top_k.max(1).min(num_classes)
}

/// Indices and values of the `k` largest probabilities, highest first.
/// Ties keep the lower class index first.
pub fn top_k(probs: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut indexed: Vec<(usize, f32)> = probs.iter().copied().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| {
        b.partial_cmp(a).unwrap_or(Ordering::Equal).then(ia.cmp(ib))
    });
    indexed.truncate(k);
    indexed
}

/// Rank a probability distribution into labelled predictions
pub fn rank(probs: &[f32], requested: usize, labels: &LabelMap) -> Result<Vec<Prediction>> {
    if probs.is_empty() {
        return Err(Error::classifier("Classifier produced no class scores"));
    }

    let k = clamp_top_k(requested, probs.len());
    Ok(top_k(probs, k)
        .into_iter()
        .map(|(idx, score)| Prediction::new(labels.label_for(idx), score.clamp(0.0, 1.0)))
        .collect())
}
