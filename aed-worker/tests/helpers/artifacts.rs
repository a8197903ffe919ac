//! Model artifact fixtures

use aed_worker::FEATURE_COUNT;
use std::path::{Path, PathBuf};

/// Binary logistic regression ignoring its input: always class 1 with
/// probability `sigmoid(bias)`
pub fn constant_logistic_json(bias: f64) -> String {
    serde_json::json!({
        "kind": "logistic_regression",
        "classes": [0, 1],
        "coefficients": [vec![0.0; FEATURE_COUNT]],
        "intercepts": [bias],
    })
    .to_string()
}

pub fn write_artifact(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write artifact");
    path
}
