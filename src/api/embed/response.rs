// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbeddingResponse type and the array-to-list conversion

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Response body for POST /embeddings
///
/// `embeddings[i]` is the vector for `texts[i]` of the request.
///
/// # Example
/// ```json
/// { "embeddings": [[0.1, 0.2, ...], [0.3, 0.4, ...]] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub embeddings: Vec<Vec<f32>>,
}

impl EmbeddingResponse {
    /// Returns the number of embeddings in the response
    pub fn embedding_count(&self) -> usize {
        self.embeddings.len()
    }

    /// Common vector length, or `None` if the response is empty
    pub fn dimension(&self) -> Option<usize> {
        self.embeddings.first().map(Vec::len)
    }
}

impl From<Array2<f32>> for EmbeddingResponse {
    /// Converts a `[n, dim]` model output into nested lists
    ///
    /// Rows keep their order and every value is copied unchanged.
    fn from(array: Array2<f32>) -> Self {
        let embeddings = array
            .axis_iter(Axis(0))
            .map(|row| row.to_vec())
            .collect();

        EmbeddingResponse { embeddings }
    }
}
