// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Model artifact resolution
//!
//! Maps a model name such as "all-MiniLM-L6-v2" to the ONNX graph and
//! tokenizer files on disk, either from a local directory or from the
//! Hugging Face hub cache (downloading on first use).

use hf_hub::api::sync::{Api, ApiBuilder};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Organisation that bare model names are looked up under
pub const DEFAULT_HUB_ORG: &str = "sentence-transformers";

/// ONNX graph location inside a sentence-transformers hub repo
pub const HUB_MODEL_FILE: &str = "onnx/model.onnx";

pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Candidate ONNX graph locations inside a local model directory
const LOCAL_MODEL_FILES: &[&str] = &["model.onnx", "onnx/model.onnx"];

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Model directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("ONNX model file not found in {0} (looked for model.onnx, onnx/model.onnx)")]
    ModelFileMissing(PathBuf),

    #[error("Tokenizer file not found: {0}")]
    TokenizerMissing(PathBuf),

    #[error("Invalid model name: {0:?}")]
    InvalidName(String),

    #[error("Failed to fetch {file} from hub repo {repo}: {source}")]
    Hub {
        repo: String,
        file: String,
        #[source]
        source: hf_hub::api::sync::ApiError,
    },
}

/// Where to look for a model's files
#[derive(Debug, Clone)]
pub enum ArtifactSource {
    /// A directory already holding the exported files
    LocalDir(PathBuf),
    /// The Hugging Face hub, with an optional cache directory override
    Hub { cache_dir: Option<PathBuf> },
}

/// Resolved on-disk location of a pretrained model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelArtifact {
    pub name: String,
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
}

/// Resolves `name` to local files using `source`
///
/// Hub lookups block on network I/O; call from a blocking context.
pub fn resolve(name: &str, source: &ArtifactSource) -> Result<ModelArtifact, ArtifactError> {
    if name.trim().is_empty() {
        return Err(ArtifactError::InvalidName(name.to_string()));
    }

    match source {
        ArtifactSource::LocalDir(dir) => resolve_local(name, dir),
        ArtifactSource::Hub { cache_dir } => resolve_hub(name, cache_dir.as_deref()),
    }
}

/// Hub repo id for a model name; bare names map to sentence-transformers
pub fn hub_repo_id(name: &str) -> String {
    if name.contains('/') {
        name.to_string()
    } else {
        format!("{}/{}", DEFAULT_HUB_ORG, name)
    }
}

fn resolve_local(name: &str, dir: &Path) -> Result<ModelArtifact, ArtifactError> {
    if !dir.is_dir() {
        return Err(ArtifactError::DirectoryNotFound(dir.to_path_buf()));
    }

    let model_path = LOCAL_MODEL_FILES
        .iter()
        .map(|file| dir.join(file))
        .find(|path| path.is_file())
        .ok_or_else(|| ArtifactError::ModelFileMissing(dir.to_path_buf()))?;

    let tokenizer_path = dir.join(TOKENIZER_FILE);
    if !tokenizer_path.is_file() {
        return Err(ArtifactError::TokenizerMissing(tokenizer_path));
    }

    debug!("Resolved {} from local directory {}", name, dir.display());

    Ok(ModelArtifact {
        name: name.to_string(),
        model_path,
        tokenizer_path,
    })
}

fn resolve_hub(name: &str, cache_dir: Option<&Path>) -> Result<ModelArtifact, ArtifactError> {
    let repo_id = hub_repo_id(name);
    let hub_error = |file: &str, source| ArtifactError::Hub {
        repo: repo_id.clone(),
        file: file.to_string(),
        source,
    };

    let api = match cache_dir {
        Some(dir) => ApiBuilder::new().with_cache_dir(dir.to_path_buf()).build(),
        None => Api::new(),
    }
    .map_err(|e| hub_error("<api>", e))?;

    info!("Fetching {} from hub repo {}", name, repo_id);
    let repo = api.model(repo_id.clone());

    let model_path = repo
        .get(HUB_MODEL_FILE)
        .map_err(|e| hub_error(HUB_MODEL_FILE, e))?;
    let tokenizer_path = repo
        .get(TOKENIZER_FILE)
        .map_err(|e| hub_error(TOKENIZER_FILE, e))?;

    Ok(ModelArtifact {
        name: name.to_string(),
        model_path,
        tokenizer_path,
    })
}
