// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! This module provides a wrapper around ONNX Runtime for running
//! sentence-transformers exports such as all-MiniLM-L6-v2.
//!
//! Features:
//! - ONNX model loading from disk (CPU execution provider)
//! - BERT tokenization with truncation and per-call padding
//! - One session run per request, however many texts it carries
//! - Attention-masked mean pooling followed by L2 normalization
//! - Output dimension discovered from the model at load time

use anyhow::{Context, Result};
use ndarray::{Array2, ArrayView3, Axis, Ix3};
use ort::ep::CPU as CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokenizers::{Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::embeddings::EmbeddingModel;

/// Text used to probe the graph's output shape at load time
const PROBE_TEXT: &str = "validation test";

/// Session and tokenizer tuning
#[derive(Debug, Clone, Copy)]
pub struct OnnxModelOptions {
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
    /// Token limit per text; longer inputs are truncated
    pub max_length: usize,
}

impl Default for OnnxModelOptions {
    fn default() -> Self {
        Self {
            intra_threads: 4,
            max_length: 256,
        }
    }
}

/// ONNX-based sentence embedding model
///
/// Runs the transformer graph and applies the sentence-transformers
/// pooling head (mean pooling + normalize) on the host.
///
/// # Thread Safety
/// The session needs exclusive access per run, so it sits behind a
/// `Mutex`; concurrent `encode` calls are serialized.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    /// ONNX Runtime session
    session: Arc<Mutex<Session>>,

    /// BERT tokenizer (truncation configured)
    tokenizer: Arc<Tokenizer>,

    /// Model name (e.g., "all-MiniLM-L6-v2")
    model_name: String,

    /// Output dimension (384 for all-MiniLM-L6-v2)
    dimension: usize,

    /// Maximum sequence length
    max_length: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

/// Token tensors for one session run, all shaped `[batch, max_len]`
struct EncodedBatch {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
}

impl OnnxEmbeddingModel {
    /// Loads an ONNX embedding model from disk paths
    ///
    /// # Errors
    /// Returns error if:
    /// - Model or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - The probe inference does not yield `[batch, seq_len, hidden]`
    ///
    /// # Example
    /// ```ignore
    /// let model = OnnxEmbeddingModel::new(
    ///     "all-MiniLM-L6-v2",
    ///     "./models/all-MiniLM-L6-v2/model.onnx",
    ///     "./models/all-MiniLM-L6-v2/tokenizer.json",
    ///     OnnxModelOptions::default(),
    /// )?;
    /// ```
    pub fn new<P: AsRef<Path>>(
        model_name: impl Into<String>,
        model_path: P,
        tokenizer_path: P,
        options: OnnxModelOptions,
    ) -> Result<Self> {
        let model_name = model_name.into();
        let model_path = model_path.as_ref();
        let tokenizer_path = tokenizer_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        info!(
            "Initializing ONNX embedding model {} ({} intra threads)",
            model_name, options.intra_threads
        );

        let mut session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(ort::Error::<()>::from)
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort::Error::<()>::from)
            .context("Failed to set optimization level")?
            .with_intra_threads(options.intra_threads)
            .map_err(ort::Error::<()>::from)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load ONNX model from {}",
                model_path.display()
            ))?;

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: options.max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("Failed to configure truncation: {}", e))?;
        // Padding is applied per call to the longest text in the batch
        tokenizer.with_padding(None);

        // Probe once to learn the hidden size; outputs drop before the move
        let dimension = {
            let batch = encode_texts(&tokenizer, &[PROBE_TEXT.to_string()])?;
            let hidden = run_session(&mut session, batch)?;
            let (_, _, hidden_dim) = hidden.dim();
            if hidden_dim == 0 {
                anyhow::bail!("Model reports a zero-width hidden state");
            }
            hidden_dim
        };

        info!(
            "ONNX embedding model {} loaded ({} dimensions, max {} tokens)",
            model_name, dimension, options.max_length
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension,
            max_length: options.max_length,
        })
    }

    /// Generates embeddings for multiple texts in one session run
    ///
    /// Returns `[texts.len(), dimension]`. An empty slice short-circuits
    /// without touching the session.
    pub fn embed_batch(&self, texts: &[String]) -> Result<Array2<f32>> {
        if texts.is_empty() {
            return Ok(Array2::zeros((0, self.dimension)));
        }

        let batch = encode_texts(&self.tokenizer, texts)?;
        let attention_mask = batch.attention_mask.clone();

        let hidden = {
            let mut session = lock_session(&self.session);
            run_session(&mut session, batch)?
        };

        let mut pooled = mean_pool(hidden.view(), &attention_mask);
        l2_normalize(&mut pooled);

        if pooled.dim() != (texts.len(), self.dimension) {
            anyhow::bail!(
                "Unexpected embedding shape: {:?} (expected ({}, {}))",
                pooled.dim(),
                texts.len(),
                self.dimension
            );
        }

        debug!("Embedded {} texts with {}", texts.len(), self.model_name);
        Ok(pooled)
    }
}

impl EmbeddingModel for OnnxEmbeddingModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, texts: &[String]) -> Result<Array2<f32>> {
        self.embed_batch(texts)
    }
}

/// Locks the session, recovering it if an earlier run panicked
///
/// A session holds no per-request state, so a poisoned lock is safe
/// to reuse.
fn lock_session<T>(session: &Mutex<T>) -> MutexGuard<'_, T> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tokenizes texts and pads every row to the longest sequence
fn encode_texts(tokenizer: &Tokenizer, texts: &[String]) -> Result<EncodedBatch> {
    let encodings = texts
        .iter()
        .map(|text| {
            tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))
        })
        .collect::<Result<Vec<_>>>()?;

    let max_len = encodings
        .iter()
        .map(|enc| enc.get_ids().len())
        .max()
        .unwrap_or(0);

    let mut input_ids = Array2::<i64>::zeros((texts.len(), max_len));
    let mut attention_mask = Array2::<i64>::zeros((texts.len(), max_len));
    let mut token_type_ids = Array2::<i64>::zeros((texts.len(), max_len));

    for (row, encoding) in encodings.iter().enumerate() {
        let ids = encoding.get_ids();
        let mask = encoding.get_attention_mask();
        let type_ids = encoding.get_type_ids();

        for col in 0..ids.len() {
            input_ids[[row, col]] = ids[col] as i64;
            attention_mask[[row, col]] = mask[col] as i64;
            token_type_ids[[row, col]] = type_ids[col] as i64;
        }
    }

    Ok(EncodedBatch {
        input_ids,
        attention_mask,
        token_type_ids,
    })
}

/// Runs the graph and returns token-level embeddings `[batch, seq_len, hidden]`
fn run_session(session: &mut Session, batch: EncodedBatch) -> Result<ndarray::Array3<f32>> {
    let outputs = session.run(ort::inputs![
        "input_ids" => Value::from_array(batch.input_ids)?,
        "attention_mask" => Value::from_array(batch.attention_mask)?,
        "token_type_ids" => Value::from_array(batch.token_type_ids)?
    ])?;

    // Use index [0] instead of name since exports differ in output naming
    let output = outputs[0]
        .try_extract_array::<f32>()
        .context("Failed to extract output tensor")?;

    let shape = output.shape().to_vec();
    let hidden = output
        .into_dimensionality::<Ix3>()
        .map_err(|_| {
            anyhow::anyhow!(
                "Model outputs unexpected dimensions: {:?} (expected [batch, seq_len, hidden])",
                shape
            )
        })?
        .to_owned();

    Ok(hidden)
}

/// Mean pooling over the sequence axis, weighted by the attention mask
///
/// Padding positions (mask 0) do not contribute. A row with an all-zero
/// mask pools to zeros.
pub(crate) fn mean_pool(hidden: ArrayView3<f32>, attention_mask: &Array2<i64>) -> Array2<f32> {
    let (batch, seq_len, hidden_dim) = hidden.dim();
    let mut pooled = Array2::<f32>::zeros((batch, hidden_dim));

    for (b, item) in hidden.axis_iter(Axis(0)).enumerate() {
        let mut sum_mask = 0.0f32;
        let mut row = pooled.row_mut(b);

        for i in 0..seq_len {
            let mask_value = attention_mask[[b, i]] as f32;
            if mask_value == 0.0 {
                continue;
            }
            sum_mask += mask_value;
            row.scaled_add(mask_value, &item.row(i));
        }

        row /= sum_mask.max(1e-9);
    }

    pooled
}

/// Scales each row to unit L2 norm; zero rows stay zero
pub(crate) fn l2_normalize(embeddings: &mut Array2<f32>) {
    for mut row in embeddings.axis_iter_mut(Axis(0)) {
        let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
        row /= norm.max(1e-12);
    }
}
