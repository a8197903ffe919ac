//! Error types for aed-worker
//!
//! Startup errors (artifact discovery and loading) are fatal. Every other
//! variant is local to a single request and never ends the request loop.

use std::path::PathBuf;
use thiserror::Error;

/// Audio Source failures
#[derive(Debug, Error)]
pub enum AudioDecodeError {
    #[error("Failed to open audio file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported or unreadable audio format in {path}: {reason}")]
    Probe { path: PathBuf, reason: String },

    #[error("No audio track found in {0}")]
    NoAudioTrack(PathBuf),

    #[error("Sample rate unknown for {0}")]
    UnknownSampleRate(PathBuf),

    #[error("Decoding failed for {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Resampling failed: {0}")]
    Resample(String),
}

/// Feature extraction failures; no partial vector is ever returned
#[derive(Debug, Error)]
pub enum FeatureExtractionError {
    #[error("Audio buffer is empty")]
    EmptyAudio,

    #[error("Audio buffer is not finite everywhere (sample {index} = {value})")]
    NonFiniteSample { index: usize, value: f32 },

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),
}

/// Classifier or scaler failures while scoring a feature vector
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredictionError {
    #[error("X has {actual} features, but the classifier expects {expected} features as input")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("X has {actual} features, but the scaler expects {expected} features as input")]
    ScalerMismatch { expected: usize, actual: usize },

    #[error("Classifier produced a non-finite score")]
    NonFiniteScore,

    #[error("Classifier does not support {0}")]
    Unsupported(&'static str),
}

/// Top-level worker error taxonomy
#[derive(Debug, Error)]
pub enum WorkerError {
    /// No usable classifier artifact in the model directory
    #[error("No .json model artifact found in {}", dir.display())]
    ArtifactNotFound { dir: PathBuf },

    /// Artifact could not be read or deserialized
    #[error("Failed to load artifact {}: {reason}", path.display())]
    ArtifactLoad { path: PathBuf, reason: String },

    #[error(transparent)]
    AudioDecode(#[from] AudioDecodeError),

    #[error("Decoded audio is empty")]
    EmptyAudio,

    #[error("Failed to extract audio features: {0}")]
    FeatureExtraction(#[from] FeatureExtractionError),

    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictionError),

    #[error("Malformed request: {0}")]
    MalformedRequest(#[from] aed_common::protocol::MalformedRequest),

    /// Blocking task panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Common error: {0}")]
    Common(#[from] aed_common::Error),
}

/// Convenience Result type using WorkerError
pub type Result<T> = std::result::Result<T, WorkerError>;
