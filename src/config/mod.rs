// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Server configuration
//!
//! Values come from command-line flags, falling back to environment
//! variables (optionally loaded from a `.env` file) and then to defaults.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::embeddings::{ArtifactSource, OnnxModelOptions};

/// Default pretrained artifact served by the endpoint
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

/// Embedding server configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "embed-server")]
#[command(version)]
#[command(about = "Serves sentence embeddings over HTTP", long_about = None)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to
    #[arg(long, env = "EMBED_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind the HTTP listener to
    #[arg(long, env = "EMBED_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Name of the pretrained artifact to load at startup
    #[arg(long, env = "EMBED_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Local directory containing model.onnx and tokenizer.json
    #[arg(long, env = "EMBED_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Override for the Hugging Face hub cache directory
    #[arg(long, env = "EMBED_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// ONNX Runtime intra-op thread count
    #[arg(long, env = "EMBED_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Maximum tokens per input text; longer inputs are truncated
    #[arg(long, env = "EMBED_MAX_LENGTH", default_value_t = 256)]
    pub max_length: usize,

    /// Largest accepted request body in bytes; unlimited when unset
    #[arg(long, env = "EMBED_MAX_BODY_BYTES")]
    pub max_body_bytes: Option<usize>,
}

impl ServerConfig {
    /// Loads `.env` (if present) and parses flags and environment
    pub fn load() -> Self {
        dotenv::dotenv().ok();
        Self::parse()
    }

    /// Socket address the server binds to
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse::<SocketAddr>()
            .map_err(|e| anyhow::anyhow!("Invalid bind address {}: {}", addr, e))
    }

    /// Where the model artifact should be resolved from
    pub fn artifact_source(&self) -> ArtifactSource {
        match &self.model_dir {
            Some(dir) => ArtifactSource::LocalDir(dir.clone()),
            None => ArtifactSource::Hub {
                cache_dir: self.cache_dir.clone(),
            },
        }
    }

    pub fn model_options(&self) -> OnnxModelOptions {
        OnnxModelOptions {
            intra_threads: self.intra_threads,
            max_length: self.max_length,
        }
    }
}
