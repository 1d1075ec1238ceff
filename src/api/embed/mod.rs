// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Embedding API Module
//!
//! This module provides the POST /embeddings endpoint: request schema,
//! response conversion and the handler tying them to the model.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::embed_handler;
pub use request::EmbeddingRequest;
pub use response::EmbeddingResponse;
