// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! In-process model doubles and request helpers for router tests

use anyhow::{anyhow, Result};
use axum::{
    body::Body,
    http::{Request, Response, StatusCode},
    Router,
};
use embed_server::{api::create_router, AppState, EmbeddingModel};
use ndarray::Array2;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_DIMENSION: usize = 16;

/// Deterministic model: vectors derived from a hash of each text
pub struct HashEmbeddingModel {
    dimension: usize,
    calls: AtomicUsize,
}

impl HashEmbeddingModel {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let mut current_seed = hasher.finish();

        (0..self.dimension)
            .map(|i| {
                // Linear congruential step, mapped into [-1, 1]
                current_seed =
                    (current_seed.wrapping_mul(1664525).wrapping_add(1013904223)) ^ (i as u64);
                ((current_seed as f64 / u64::MAX as f64) * 2.0 - 1.0) as f32
            })
            .collect()
    }
}

impl EmbeddingModel for HashEmbeddingModel {
    fn model_name(&self) -> &str {
        "hash-test-model"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, texts: &[String]) -> Result<Array2<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let flat: Vec<f32> = texts.iter().flat_map(|t| self.vector_for(t)).collect();
        Ok(Array2::from_shape_vec((texts.len(), self.dimension), flat)?)
    }
}

/// Model whose inference always fails
pub struct FailingModel;

impl EmbeddingModel for FailingModel {
    fn model_name(&self) -> &str {
        "failing-model"
    }

    fn dimension(&self) -> usize {
        TEST_DIMENSION
    }

    fn encode(&self, _texts: &[String]) -> Result<Array2<f32>> {
        Err(anyhow!("session run failed"))
    }
}

/// Model that drops the last row of its output
pub struct ShortModel;

impl EmbeddingModel for ShortModel {
    fn model_name(&self) -> &str {
        "short-model"
    }

    fn dimension(&self) -> usize {
        TEST_DIMENSION
    }

    fn encode(&self, texts: &[String]) -> Result<Array2<f32>> {
        Ok(Array2::zeros((texts.len().saturating_sub(1), TEST_DIMENSION)))
    }
}

/// Model that panics inside the blocking task
pub struct PanickingModel;

impl EmbeddingModel for PanickingModel {
    fn model_name(&self) -> &str {
        "panicking-model"
    }

    fn dimension(&self) -> usize {
        TEST_DIMENSION
    }

    fn encode(&self, _texts: &[String]) -> Result<Array2<f32>> {
        panic!("corrupted model state");
    }
}

pub fn router_with(model: Arc<dyn EmbeddingModel>) -> Router {
    create_router(AppState::new(model))
}

pub async fn post_json(router: Router, uri: &str, body: &str) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    router.oneshot(request).await.unwrap()
}

pub async fn read_json(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}
