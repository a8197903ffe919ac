//! # aed-worker
//!
//! Long-lived audio event classification worker. Loads one classifier
//! artifact at startup, then answers newline-delimited JSON requests, each
//! naming an audio file, with a classification verdict.
//!
//! **Per-request flow:** decode → loudness gate → feature extraction →
//! classifier → decision engine

pub mod adapter;
pub mod audio;
pub mod decision;
pub mod error;
pub mod features;
pub mod loudness;
pub mod model;
pub mod pipeline;
pub mod worker;

pub use adapter::{ClassifierAdapter, ClassifierResult};
pub use decision::{decide, DecisionResult};
pub use error::{Result, WorkerError};
pub use features::{FeatureExtractor, FeatureVector, FEATURE_COUNT};
pub use loudness::{LoudnessGate, LoudnessMetrics};
pub use pipeline::{InferencePipeline, Verdict};
