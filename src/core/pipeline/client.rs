//! HTTP Body Ingestion
//!
//! Reads a generation service response into a [`NormalizedBody`], handling
//! the three content-type branches: event-stream (incremental accumulation
//! with rate-limited partial snapshots), JSON, and anything else as text.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::Instant;

use super::normalize::{normalize_envelope, normalize_text, NormalizedBody};
use super::types::GenerationError;

/// Classify a transport-level failure.
pub fn classify_transport_error(e: &reqwest::Error) -> GenerationError {
    if e.is_timeout() {
        GenerationError::timeout(format!("request timed out: {e}"))
    } else if e.is_connect() {
        GenerationError::network(format!("connection failed: {e}"))
    } else {
        GenerationError::unknown(format!("request failed: {e}"))
    }
}

/// Read a successful response into a normalized body.
///
/// Event-stream responses are accumulated chunk by chunk and published as
/// partial snapshots on `progress` (full text so far, at most once per
/// `publish_interval`); the terminal result always comes from the complete
/// accumulated buffer, so partial publication never affects correctness.
pub async fn read_body(
    response: reqwest::Response,
    progress: Option<&mpsc::Sender<String>>,
    publish_interval: Duration,
) -> Result<NormalizedBody, GenerationError> {
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if content_type.starts_with("text/event-stream") {
        let accumulated = accumulate_stream(response, progress, publish_interval).await?;
        return Ok(normalize_text(&accumulated));
    }

    if content_type.starts_with("application/json") {
        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerationError::unknown(format!("invalid JSON body: {e}")))?;
        return Ok(normalize_envelope(value));
    }

    // Unknown content type: take the body as text, let normalization decide.
    let text = response
        .text()
        .await
        .map_err(|e| classify_transport_error(&e))?;
    Ok(normalize_text(&text))
}

/// Accumulate a chunked body, publishing rate-limited partial snapshots.
///
/// Bytes are accumulated raw and decoded over the whole buffer: chunk
/// boundaries can split a multi-byte UTF-8 character, so per-chunk decoding
/// would mangle it.
async fn accumulate_stream(
    response: reqwest::Response,
    progress: Option<&mpsc::Sender<String>>,
    publish_interval: Duration,
) -> Result<String, GenerationError> {
    let mut stream = response.bytes_stream();
    let mut accumulated: Vec<u8> = Vec::new();
    let mut last_publish: Option<Instant> = None;

    while let Some(chunk) = stream.next().await {
        let bytes = chunk.map_err(|e| classify_transport_error(&e))?;
        accumulated.extend_from_slice(&bytes);

        let due = last_publish
            .map(|t| t.elapsed() >= publish_interval)
            .unwrap_or(true);
        if due {
            if let Some(tx) = progress {
                // Best-effort: a slow consumer must not stall ingestion.
                let _ = tx.try_send(String::from_utf8_lossy(&accumulated).into_owned());
            }
            last_publish = Some(Instant::now());
        }
    }

    let text = String::from_utf8_lossy(&accumulated).into_owned();

    // Final snapshot so consumers see the complete text.
    if let Some(tx) = progress {
        let _ = tx.try_send(text.clone());
    }

    log::debug!("Accumulated {} bytes from event stream", accumulated.len());
    Ok(text)
}
