// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use embed_server::{
    api::{start_server, AppState},
    config::ServerConfig,
    embeddings,
    version,
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::load();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    tracing::info!("Starting {}", version::get_version_string());

    let addr = config.bind_addr()?;

    // Load the model once; any failure here is fatal
    tracing::info!("Loading embedding model {}", config.model);
    let model = {
        let name = config.model.clone();
        let source = config.artifact_source();
        let options = config.model_options();
        tokio::task::spawn_blocking(move || embeddings::load_model(&name, &source, options))
            .await
            .context("Model loading task panicked")??
    };
    tracing::info!(
        "Embedding model ready: {} ({} dimensions)",
        model.model_name(),
        model.dimension()
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    println!("\nAPI Endpoints:");
    for route in version::ROUTES {
        println!("  {:<18} http://{}", route, addr);
    }
    println!("\nPress Ctrl+C to shutdown...\n");

    let state = AppState::new(model).with_body_limit(config.max_body_bytes);
    start_server(listener, state).await
}
