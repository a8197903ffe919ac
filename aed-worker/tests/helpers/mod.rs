//! Test Helper Utilities
//!
//! Shared utilities for testing aed-worker

#![allow(dead_code)]

pub mod artifacts;
pub mod audio_generator;

pub use artifacts::{constant_logistic_json, write_artifact};
pub use audio_generator::{generate_test_wav, AudioConfig};
