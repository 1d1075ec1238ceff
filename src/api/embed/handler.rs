// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embeddings HTTP handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::api::embed::{EmbeddingRequest, EmbeddingResponse};
use crate::api::server::AppState;
use crate::api::ApiError;

/// POST /embeddings handler
///
/// Generates one embedding per input text with the process-wide model.
///
/// # Request Body
/// ```json
/// { "texts": ["text1", "text2", ...] }
/// ```
///
/// # Response Body
/// ```json
/// { "embeddings": [[0.1, 0.2, ...], [0.3, 0.4, ...]] }
/// ```
///
/// # Errors
/// - 400 Bad Request: body is not readable JSON
/// - 413 Payload Too Large: body exceeds the configured size limit
/// - 422 Unprocessable Entity: `texts` missing or not a list of strings
/// - 500 Internal Server Error: inference failed
pub async fn embed_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<EmbeddingResponse>, ApiError> {
    // 1. Parse and validate before touching the model
    let Json(body) = payload.map_err(|rejection| {
        warn!("Rejected embeddings body: {}", rejection.body_text());
        ApiError::from(rejection)
    })?;

    let request = EmbeddingRequest::from_value(&body).map_err(|e| {
        warn!("Embeddings validation failed: {}", e);
        e
    })?;

    let count = request.texts.len();
    debug!("Embedding {} texts with {}", count, state.model.model_name());

    // 2. Inference is CPU-bound; keep it off the async workers
    let model = state.model.clone();
    let texts = request.texts;
    let array = tokio::task::spawn_blocking(move || model.encode(&texts))
        .await
        .map_err(|e| {
            error!("Inference task aborted: {}", e);
            ApiError::InternalError(format!("Inference task aborted: {}", e))
        })?
        .map_err(|e| {
            error!("Inference failed: {:#}", e);
            ApiError::InternalError(format!("Inference failed: {:#}", e))
        })?;

    // 3. Positional correspondence with the input
    if array.nrows() != count {
        error!(
            "Model returned {} embeddings for {} texts",
            array.nrows(),
            count
        );
        return Err(ApiError::InternalError(format!(
            "Model returned {} embeddings for {} texts",
            array.nrows(),
            count
        )));
    }

    Ok(Json(EmbeddingResponse::from(array)))
}
