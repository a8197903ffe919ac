//! Wire records exchanged with the supervising process
//!
//! Framing is newline-delimited JSON: one request object per input line,
//! one record per output line. Records are tagged by a `type` field.

use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One inference request read from the input channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Opaque request identifier, echoed back verbatim (`null` when absent)
    #[serde(default)]
    pub id: Value,

    /// Filesystem path of the audio clip to classify
    #[serde(default, rename = "audioPath")]
    pub audio_path: String,
}

/// A line that could not be turned into an [`InferenceRequest`]
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct MalformedRequest {
    /// Request id, when the line was a JSON object carrying one
    pub id: Option<Value>,
    pub reason: String,
}

impl InferenceRequest {
    /// Parse one trimmed input line
    ///
    /// The id is recovered even when the rest of the object is invalid, so
    /// the error record can still be correlated by the caller.
    pub fn parse(line: &str) -> std::result::Result<Self, MalformedRequest> {
        let value: Value = serde_json::from_str(line).map_err(|e| MalformedRequest {
            id: None,
            reason: e.to_string(),
        })?;

        let id = value
            .as_object()
            .and_then(|object| object.get("id"))
            .filter(|id| !id.is_null())
            .cloned();

        serde_json::from_value(value).map_err(|e| MalformedRequest {
            id,
            reason: e.to_string(),
        })
    }
}

/// Records written to the output channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerRecord {
    /// Model loaded, worker accepting requests
    Ready { message: String },

    /// Result for one request; `message` holds the stringified outcome
    Response { id: Value, message: String },

    /// Startup failure or per-request failure
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<Value>,
        message: String,
    },
}

impl WorkerRecord {
    /// Startup acknowledgement naming the loaded model
    pub fn ready(model_info: &str) -> Self {
        WorkerRecord::Ready {
            message: format!("Loaded model: {}", model_info),
        }
    }

    pub fn response(id: Value, message: String) -> Self {
        WorkerRecord::Response { id, message }
    }

    /// Error record without request correlation
    pub fn error(message: impl Into<String>) -> Self {
        WorkerRecord::Error {
            id: None,
            message: message.into(),
        }
    }

    /// Per-request failure; a `null` id is left out of the record
    pub fn inference_error(id: Option<Value>, cause: impl std::fmt::Display) -> Self {
        WorkerRecord::Error {
            id: id.filter(|id| !id.is_null()),
            message: format!("Inference error: {}", cause),
        }
    }

    /// Encode as a single newline-terminated line
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
