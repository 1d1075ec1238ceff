// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Sentence embedding models
//!
//! `artifact` resolves a model name to files, `onnx_model` runs it, and
//! `EmbeddingModel` is what the HTTP layer depends on.

pub mod artifact;
pub mod model;
pub mod onnx_model;

pub use artifact::{resolve, ArtifactError, ArtifactSource, ModelArtifact};
pub use model::EmbeddingModel;
pub use onnx_model::{OnnxEmbeddingModel, OnnxModelOptions};

use anyhow::{Context, Result};
use std::sync::Arc;

/// Resolves and loads the named model once for the whole process
///
/// Blocking: downloads (if needed), builds the session and runs a probe.
pub fn load_model(
    name: &str,
    source: &ArtifactSource,
    options: OnnxModelOptions,
) -> Result<Arc<dyn EmbeddingModel>> {
    let artifact = resolve(name, source)
        .with_context(|| format!("Failed to resolve model artifact {}", name))?;

    let model = OnnxEmbeddingModel::new(
        artifact.name,
        artifact.model_path,
        artifact.tokenizer_path,
        options,
    )?;

    Ok(Arc::new(model))
}
