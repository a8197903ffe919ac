//! # AED Common Library
//!
//! Shared code for the audio event detection worker:
//! - Error types
//! - Configuration loading (TOML bootstrap, environment, CLI priority)
//! - Wire protocol records exchanged with the supervising process

pub mod config;
pub mod error;
pub mod protocol;

pub use error::{Error, Result};
