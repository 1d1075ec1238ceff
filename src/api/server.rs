// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::embed::embed_handler;
use crate::embeddings::EmbeddingModel;

/// Shared state handed to every handler
///
/// The model is loaded once before the router is built and is never
/// replaced while the process runs.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn EmbeddingModel>,
    /// Request body cap in bytes; `None` accepts bodies of any size
    pub max_body_bytes: Option<usize>,
}

impl AppState {
    pub fn new(model: Arc<dyn EmbeddingModel>) -> Self {
        Self {
            model,
            max_body_bytes: None,
        }
    }

    pub fn with_body_limit(mut self, max_body_bytes: Option<usize>) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub dimension: usize,
    pub version: String,
}

pub fn create_router(state: AppState) -> Router {
    let body_limit = match state.max_body_bytes {
        Some(bytes) => DefaultBodyLimit::max(bytes),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/embeddings", post(embed_handler))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until Ctrl+C, then drains in-flight requests
pub async fn start_server(listener: TcpListener, state: AppState) -> anyhow::Result<()> {
    info!("API server listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.model.model_name().to_string(),
        dimension: state.model.dimension(),
        version: crate::version::VERSION_NUMBER.to_string(),
    })
}
