//! End-to-end tests: model directory → request loop → output records
//!
//! Real WAV files are decoded through symphonia, so these cover the whole
//! per-request path.

mod helpers;

use aed_worker::model::{DirectoryModelProvider, ModelProvider};
use aed_worker::worker::{self, LoopStats};
use aed_worker::{FeatureExtractor, InferencePipeline, LoudnessGate, FEATURE_COUNT};
use helpers::{constant_logistic_json, generate_test_wav, write_artifact, AudioConfig};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::BufReader;

fn load_pipeline(model_dir: &Path) -> Arc<InferencePipeline> {
    let model = DirectoryModelProvider::new(model_dir)
        .load()
        .expect("Failed to load model");
    Arc::new(InferencePipeline::from_model(model, LoudnessGate::default()))
}

async fn serve(pipeline: Arc<InferencePipeline>, input: String) -> (LoopStats, Vec<Value>) {
    let mut output = Vec::new();
    let stats = worker::run(pipeline, BufReader::new(input.as_bytes()), &mut output)
        .await
        .expect("Request loop failed");

    let records = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (stats, records)
}

fn request(id: Value, path: &Path) -> String {
    format!(
        "{}\n",
        json!({"id": id, "audioPath": path.to_string_lossy()})
    )
}

fn message(record: &Value) -> Value {
    serde_json::from_str(record["message"].as_str().expect("message is a string"))
        .expect("message is JSON")
}

#[tokio::test]
async fn test_silent_file_is_overridden() {
    let temp = TempDir::new().unwrap();
    write_artifact(temp.path(), "model.json", &constant_logistic_json(3.0));
    let wav = generate_test_wav(&temp.path().join("silence.wav"), &AudioConfig::silent()).unwrap();

    let (_, records) = serve(load_pipeline(temp.path()), request(json!(1), &wav)).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["type"], "response");
    assert_eq!(records[0]["id"], 1);

    let result = message(&records[0]);
    assert_eq!(result["prediction"], 0);
    assert_eq!(result["confidence"], 1.0);
    assert_eq!(result["probabilities"], json!([1.0, 0.0]));
    assert_eq!(result["classes"], json!([0, 1]));
    assert_eq!(result["num_features"], FEATURE_COUNT);
    assert_eq!(result["rms_energy"], 0.0);
    assert_eq!(result["max_amplitude"], 0.0);
    assert_eq!(result["was_overridden"], true);
    assert_eq!(result["original_prediction"], 1);
}

#[tokio::test]
async fn test_loud_file_passes_classifier_output() {
    let temp = TempDir::new().unwrap();
    write_artifact(temp.path(), "model.json", &constant_logistic_json(3.0));
    let wav = generate_test_wav(&temp.path().join("tone.wav"), &AudioConfig::default()).unwrap();

    let (_, records) = serve(load_pipeline(temp.path()), request(json!("a"), &wav)).await;
    let result = message(&records[0]);

    // sigmoid(3) = 0.952574...
    assert_eq!(result["prediction"], 1);
    assert_eq!(result["confidence"], 0.9526);
    assert_eq!(result["probabilities"], json!([0.047426, 0.952574]));
    assert_eq!(result["was_overridden"], false);
    assert_eq!(result["original_prediction"], Value::Null);

    let rms = result["rms_energy"].as_f64().unwrap();
    assert!((rms - 0.5 / 2f64.sqrt()).abs() < 0.01, "rms was {}", rms);
}

#[tokio::test]
async fn test_not_json_then_valid_request() {
    let temp = TempDir::new().unwrap();
    write_artifact(temp.path(), "model.json", &constant_logistic_json(1.0));
    let wav = generate_test_wav(&temp.path().join("tone.wav"), &AudioConfig::default()).unwrap();

    let input = format!("not json\n{}", request(json!(2), &wav));
    let (stats, records) = serve(load_pipeline(temp.path()), input).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["type"], "error");
    assert!(records[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("Inference error:"));
    assert_eq!(records[1]["type"], "response");
    assert_eq!(records[1]["id"], 2);
    assert_eq!(
        stats,
        LoopStats {
            requests: 2,
            responses: 1,
            errors: 1
        }
    );
}

#[tokio::test]
async fn test_nonexistent_audio_path() {
    let temp = TempDir::new().unwrap();
    write_artifact(temp.path(), "model.json", &constant_logistic_json(1.0));
    let missing = temp.path().join("missing.wav");
    let wav = generate_test_wav(&temp.path().join("tone.wav"), &AudioConfig::default()).unwrap();

    let input = format!("{}{}", request(json!(7), &missing), request(json!(8), &wav));
    let (_, records) = serve(load_pipeline(temp.path()), input).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["type"], "error");
    assert_eq!(records[0]["id"], 7);
    assert_eq!(records[1]["type"], "response");
}

#[tokio::test]
async fn test_non_audio_file_is_error_record() {
    let temp = TempDir::new().unwrap();
    write_artifact(temp.path(), "model.json", &constant_logistic_json(1.0));
    let bogus = temp.path().join("clip.wav");
    std::fs::write(&bogus, b"definitely not a wave file").unwrap();

    let (_, records) = serve(load_pipeline(temp.path()), request(json!(1), &bogus)).await;
    assert_eq!(records[0]["type"], "error");
}

#[tokio::test]
async fn test_repeated_file_gives_identical_message() {
    let temp = TempDir::new().unwrap();
    write_artifact(temp.path(), "model.json", &constant_logistic_json(0.5));
    let wav = generate_test_wav(&temp.path().join("tone.wav"), &AudioConfig::default()).unwrap();

    let input = format!("{}{}", request(json!(1), &wav), request(json!(1), &wav));
    let (_, records) = serve(load_pipeline(temp.path()), input).await;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["message"], records[1]["message"]);
}

#[tokio::test]
async fn test_stereo_44k_file_is_resampled() {
    let temp = TempDir::new().unwrap();
    write_artifact(temp.path(), "model.json", &constant_logistic_json(1.0));
    let config = AudioConfig {
        sample_rate: 44100,
        channels: 2,
        ..Default::default()
    };
    let wav = generate_test_wav(&temp.path().join("stereo.wav"), &config).unwrap();

    let (_, records) = serve(load_pipeline(temp.path()), request(json!(1), &wav)).await;
    assert_eq!(records[0]["type"], "response");

    let result = message(&records[0]);
    assert_eq!(result["num_features"], FEATURE_COUNT);
    assert_eq!(result["was_overridden"], false);
}

#[tokio::test]
async fn test_feature_width_mismatch_is_prediction_error() {
    let temp = TempDir::new().unwrap();
    let narrow = json!({
        "kind": "logistic_regression",
        "classes": [0, 1],
        "coefficients": [[0.0, 0.0]],
        "intercepts": [0.0],
    });
    write_artifact(temp.path(), "narrow.json", &narrow.to_string());
    let wav = generate_test_wav(&temp.path().join("tone.wav"), &AudioConfig::default()).unwrap();

    let (_, records) = serve(load_pipeline(temp.path()), request(json!(4), &wav)).await;

    assert_eq!(records[0]["type"], "response");
    assert_eq!(records[0]["id"], 4);
    assert!(records[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("Prediction error:"));
}

#[tokio::test]
async fn test_wrapped_artifact_with_scaler() {
    let temp = TempDir::new().unwrap();
    let wrapped = json!({
        "model": serde_json::from_str::<Value>(&constant_logistic_json(2.0)).unwrap(),
        "scaler": {
            "kind": "standard",
            "mean": vec![0.0; FEATURE_COUNT],
            "scale": vec![1.0; FEATURE_COUNT],
        },
        "model_name": "door-knock",
    });
    write_artifact(temp.path(), "bundle.json", &wrapped.to_string());

    let model = DirectoryModelProvider::new(temp.path()).load().unwrap();
    assert_eq!(model.display_name, "door-knock");
    assert!(model.scaler.is_some());

    let wav = generate_test_wav(&temp.path().join("tone.wav"), &AudioConfig::default()).unwrap();
    let pipeline = Arc::new(InferencePipeline::from_model(model, LoudnessGate::default()));
    let (_, records) = serve(pipeline, request(json!(1), &wav)).await;
    assert_eq!(message(&records[0])["prediction"], 1);
}

#[tokio::test]
async fn test_bare_artifact_without_scaler_scores_unscaled() {
    let temp = TempDir::new().unwrap();
    write_artifact(temp.path(), "model.json", &constant_logistic_json(-2.0));

    let model = DirectoryModelProvider::new(temp.path()).load().unwrap();
    assert!(model.scaler.is_none());

    let wav = generate_test_wav(&temp.path().join("tone.wav"), &AudioConfig::default()).unwrap();
    let pipeline = Arc::new(InferencePipeline::from_model(model, LoudnessGate::default()));
    let (_, records) = serve(pipeline, request(json!(1), &wav)).await;
    assert_eq!(message(&records[0])["prediction"], 0);
}

#[tokio::test]
async fn test_decoded_file_extracts_identically_twice() {
    use aed_worker::audio::{AudioSource, SymphoniaSource};

    let temp = TempDir::new().unwrap();
    let wav = generate_test_wav(&temp.path().join("tone.wav"), &AudioConfig::default()).unwrap();

    let waveform = SymphoniaSource.decode(&wav, 22050).unwrap();
    let extractor = FeatureExtractor::new();
    let first = extractor.extract(&waveform.samples, waveform.sample_rate).unwrap();
    let second = extractor.extract(&waveform.samples, waveform.sample_rate).unwrap();

    assert_eq!(first.len(), FEATURE_COUNT);
    assert_eq!(first, second);
}
