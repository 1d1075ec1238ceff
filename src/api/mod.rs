// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod embed;
pub mod errors;
pub mod server;

pub use embed::{embed_handler, EmbeddingRequest, EmbeddingResponse};
pub use errors::{ApiError, ErrorResponse};
pub use server::{create_router, start_server, AppState, HealthResponse};
