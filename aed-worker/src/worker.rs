//! Request loop
//!
//! Reads newline-delimited JSON requests and answers each with exactly one
//! record, strictly in order. Audio work runs on the blocking pool and is
//! awaited before the next line is read, so requests never overlap.

use crate::error::{Result, WorkerError};
use crate::loudness::LoudnessGate;
use crate::model::ModelProvider;
use crate::pipeline::InferencePipeline;
use aed_common::protocol::{InferenceRequest, MalformedRequest, WorkerRecord};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

/// Counters reported when the loop ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Non-blank lines read
    pub requests: u64,
    pub responses: u64,
    pub errors: u64,
}

/// Load the model and announce the outcome on `writer`
///
/// On success the pipeline is built and a single `ready` record is written.
/// On failure a single `error` record is written and `None` is returned;
/// the caller must not enter the request loop.
pub async fn start<W>(
    provider: &dyn ModelProvider,
    gate: LoudnessGate,
    sample_rate: u32,
    writer: &mut W,
) -> Result<Option<Arc<InferencePipeline>>>
where
    W: AsyncWrite + Unpin,
{
    let model = match provider.load() {
        Ok(model) => model,
        Err(e) => {
            let message = match &e {
                WorkerError::ArtifactNotFound { .. } => e.to_string(),
                _ => format!("Failed to load model: {}", e),
            };
            report_startup_failure(writer, message).await?;
            return Ok(None);
        }
    };

    info!(
        rms_threshold = gate.rms_threshold(),
        amplitude_threshold = gate.amplitude_threshold(),
        sample_rate,
        "Loudness gate configured"
    );

    let display_name = model.display_name.clone();
    let pipeline =
        Arc::new(InferencePipeline::from_model(model, gate).with_sample_rate(sample_rate));

    write_record(writer, &WorkerRecord::ready(&display_name)).await?;
    Ok(Some(pipeline))
}

/// Log a fatal startup problem and emit it as the only `error` record
pub async fn report_startup_failure<W>(writer: &mut W, message: String) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    error!("{}", message);
    write_record(writer, &WorkerRecord::error(message)).await
}

/// Serve requests until the input reaches end of stream
///
/// Per-request failures become error records and the loop continues. A
/// failed write to `writer` ends the loop with an error, since nobody is
/// left to read the answers.
pub async fn run<R, W>(
    pipeline: Arc<InferencePipeline>,
    mut reader: R,
    mut writer: W,
) -> Result<LoopStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut stats = LoopStats::default();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }

        let record = match std::str::from_utf8(&buf) {
            Ok(text) => {
                let line = text.trim();
                if line.is_empty() {
                    continue;
                }
                stats.requests += 1;
                process_line(&pipeline, line).await
            }
            Err(e) => {
                stats.requests += 1;
                let malformed = MalformedRequest {
                    id: None,
                    reason: format!("request is not valid UTF-8: {}", e),
                };
                warn!("{}", malformed);
                WorkerRecord::inference_error(None, WorkerError::from(malformed))
            }
        };

        match &record {
            WorkerRecord::Response { .. } => stats.responses += 1,
            _ => stats.errors += 1,
        }
        write_record(&mut writer, &record).await?;
    }

    info!(
        requests = stats.requests,
        responses = stats.responses,
        errors = stats.errors,
        "Input closed, request loop finished"
    );
    Ok(stats)
}

/// Write one record as a single line and flush it
pub async fn write_record<W>(writer: &mut W, record: &WorkerRecord) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = record.to_line()?;
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

async fn process_line(pipeline: &Arc<InferencePipeline>, line: &str) -> WorkerRecord {
    let request = match InferenceRequest::parse(line) {
        Ok(request) => request,
        Err(malformed) => {
            warn!("Malformed request: {}", malformed);
            let id = malformed.id.clone();
            return WorkerRecord::inference_error(id, WorkerError::from(malformed));
        }
    };

    debug!(id = %request.id, path = %request.audio_path, "Processing request");

    let path = PathBuf::from(&request.audio_path);
    let task_pipeline = Arc::clone(pipeline);
    let outcome = tokio::task::spawn_blocking(move || task_pipeline.handle(&path))
        .await
        .map_err(|e| WorkerError::Task(e.to_string()))
        .and_then(|handled| handled)
        .and_then(|verdict| verdict.message());

    match outcome {
        Ok(message) => WorkerRecord::response(request.id, message),
        Err(e) => {
            error!(id = %request.id, path = %request.audio_path, "Inference failed: {}", e);
            WorkerRecord::inference_error(Some(request.id), e)
        }
    }
}
