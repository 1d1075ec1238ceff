// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbeddingRequest type for POST /embeddings
//!
//! The schema is checked explicitly against the parsed JSON value so a
//! rejected body names the offending field and never reaches the model.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiError;

/// Request body for POST /embeddings
///
/// # Example
/// ```json
/// { "texts": ["Hello world", "Another text"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text strings to embed, in output order
    pub texts: Vec<String>,
}

impl EmbeddingRequest {
    /// Validates a parsed body against the request schema
    ///
    /// # Validation Rules
    /// 1. The body must be a JSON object
    /// 2. **texts** must be present and be an array
    /// 3. Every element of **texts** must be a string
    ///
    /// An empty array is valid. Unknown fields are ignored.
    pub fn from_value(body: &Value) -> Result<Self, ApiError> {
        let object = body.as_object().ok_or_else(|| ApiError::ValidationError {
            field: "body".to_string(),
            message: format!("expected a JSON object, got {}", kind(body)),
        })?;

        let texts = object.get("texts").ok_or_else(|| ApiError::ValidationError {
            field: "texts".to_string(),
            message: "field required".to_string(),
        })?;

        let items = texts.as_array().ok_or_else(|| ApiError::ValidationError {
            field: "texts".to_string(),
            message: format!("expected a list of strings, got {}", kind(texts)),
        })?;

        let texts = items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| ApiError::ValidationError {
                        field: format!("texts[{}]", index),
                        message: format!("expected a string, got {}", kind(item)),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { texts })
    }
}

/// Maps axum's JSON extractor failure (bad syntax, wrong content type,
/// unreadable or oversized body) to a client error
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::InvalidRequest(rejection.body_text())
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
