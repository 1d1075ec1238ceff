// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding model seam
//!
//! The HTTP layer only sees `EmbeddingModel`. The process loads one
//! implementation at startup and shares it behind an `Arc`.

use anyhow::Result;
use ndarray::Array2;

/// A loaded, read-only sentence embedding model
///
/// Implementations must be safe to call from several blocking threads
/// at once. Any interior locking is the implementation's concern.
pub trait EmbeddingModel: Send + Sync {
    /// Model name (e.g., "all-MiniLM-L6-v2")
    fn model_name(&self) -> &str;

    /// Length of every vector this model produces
    fn dimension(&self) -> usize;

    /// Embeds `texts` in order
    ///
    /// Returns an array of shape `[texts.len(), self.dimension()]` where
    /// row `i` is the embedding of `texts[i]`. Blocking and CPU-bound.
    fn encode(&self, texts: &[String]) -> Result<Array2<f32>>;
}
