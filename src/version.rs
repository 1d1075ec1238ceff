// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the embedding server

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2026-10-14";

/// Routes served by this build
pub const ROUTES: &[&str] = &["POST /embeddings", "GET /health"];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("embed-server {} ({})", VERSION_NUMBER, BUILD_DATE)
}
