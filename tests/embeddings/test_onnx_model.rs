// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Model tests for embedding generation
//!
//! Tests against the real all-MiniLM-L6-v2 export are `#[ignore]`d;
//! run them with `--ignored` after placing model.onnx and tokenizer.json
//! in `EMBED_MODEL_DIR` (default ./models/all-MiniLM-L6-v2).

use embed_server::embeddings::{
    load_model, ArtifactSource, EmbeddingModel, OnnxEmbeddingModel, OnnxModelOptions,
};
use std::path::PathBuf;
use std::sync::Arc;

fn model_dir() -> PathBuf {
    std::env::var("EMBED_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./models/all-MiniLM-L6-v2"))
}

fn load_real_model() -> Arc<dyn EmbeddingModel> {
    load_model(
        "all-MiniLM-L6-v2",
        &ArtifactSource::LocalDir(model_dir()),
        OnnxModelOptions::default(),
    )
    .expect("Failed to load model")
}

fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod onnx_model_tests {
    use super::*;

    #[test]
    fn test_missing_model_file_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let result = OnnxEmbeddingModel::new(
            "all-MiniLM-L6-v2",
            dir.path().join("model.onnx"),
            dir.path().join("tokenizer.json"),
            OnnxModelOptions::default(),
        );

        let err = result.unwrap_err();
        assert!(err.to_string().contains("ONNX model file not found"));
    }

    #[test]
    fn test_load_model_reports_unresolvable_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_model(
            "all-MiniLM-L6-v2",
            &ArtifactSource::LocalDir(dir.path().join("absent")),
            OnnxModelOptions::default(),
        );

        let err = result.err().expect("load should fail");
        assert!(format!("{:#}", err).contains("Failed to resolve model artifact"));
    }

    #[test]
    #[ignore] // Only run if model files are downloaded
    fn test_model_reports_384_dimensions() {
        let model = load_real_model();

        assert_eq!(model.model_name(), "all-MiniLM-L6-v2");
        assert_eq!(model.dimension(), 384);
    }

    #[test]
    #[ignore] // Only run if model files are downloaded
    fn test_hello_world_shapes_and_norms() {
        let model = load_real_model();

        let embeddings = model.encode(&texts(&["hello", "world"])).unwrap();

        assert_eq!(embeddings.dim(), (2, 384));
        for row in embeddings.rows() {
            let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-4, "norm was {}", norm);
        }
    }

    #[test]
    #[ignore] // Only run if model files are downloaded
    fn test_encode_is_deterministic() {
        let model = load_real_model();
        let input = texts(&["The quick brown fox", "jumps over the lazy dog"]);

        let first = model.encode(&input).unwrap();
        let second = model.encode(&input).unwrap();

        for (a, b) in first.iter().zip(second.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    #[ignore] // Only run if model files are downloaded
    fn test_batch_matches_single() {
        // Padding to the longest text must not change shorter rows
        let model = load_real_model();

        let batch = model
            .encode(&texts(&["short", "a considerably longer sentence than the first"]))
            .unwrap();
        let single = model.encode(&texts(&["short"])).unwrap();

        for (a, b) in batch.row(0).iter().zip(single.row(0).iter()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    #[ignore] // Only run if model files are downloaded
    fn test_similar_texts_are_closer() {
        let model = load_real_model();

        let e = model
            .encode(&texts(&[
                "A cat sits on the mat",
                "A kitten is sitting on a rug",
                "Quarterly revenue grew by ten percent",
            ]))
            .unwrap();
        // Rows are unit-norm, so the dot product is cosine similarity
        let near = e.row(0).dot(&e.row(1));
        let far = e.row(0).dot(&e.row(2));

        assert!(near > far, "near={} far={}", near, far);
    }

    #[test]
    #[ignore] // Only run if model files are downloaded
    fn test_long_input_is_truncated_not_rejected() {
        let model = load_real_model();
        let long = "token ".repeat(5_000);

        let embeddings = model.encode(&[long, String::new()]).unwrap();

        assert_eq!(embeddings.dim(), (2, 384));
    }
}
