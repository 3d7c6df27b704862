//! Generation Service Wire Types
//!
//! Request payloads for the three call modes (refinement question, final
//! generation, edit regeneration), the normalized result, and the error
//! taxonomy surfaced to the wizard.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Request Types
// ============================================================================

/// One prior exchange sent back to the service with a question request.
///
/// Assistant entries carry `question`, user entries carry `answer`; the
/// service relies on that asymmetry, so both fields are optional here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl HistoryEntry {
    pub fn assistant(question: impl Into<String>, options: Option<Vec<String>>) -> Self {
        Self {
            role: "assistant".to_string(),
            question: Some(question.into()),
            answer: None,
            options,
        }
    }

    pub fn user(answer: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            question: None,
            answer: Some(answer.into()),
            options: None,
        }
    }
}

/// Request for the next refinement question.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    pub phase: String,
    pub conversation_history: Vec<HistoryEntry>,
    pub keyword: String,
    pub style: String,
    pub script_length: u32,
    pub tone: String,
    pub language: String,
}

impl QuestionRequest {
    pub const PHASE: &'static str = "refinement-question-only";
}

/// Request for final script generation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRequest {
    pub text: String,
    pub style: String,
    pub length: u32,
    pub tone: String,
    pub language: String,
    pub cta_inclusion: bool,
    pub output_type: String,
    pub refinement_context: Option<String>,
    pub phase: String,
}

impl ScriptRequest {
    pub const OUTPUT_TYPE: &'static str = "script";
    pub const PHASE: &'static str = "final";
}

/// Request for regeneration with an edit instruction.
///
/// `text` carries `"{keyword} - {instruction}"`; the previous script rides
/// along so the service can apply the edit rather than start over.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateRequest {
    pub text: String,
    pub style: String,
    pub length: u32,
    pub tone: String,
    pub language: String,
    pub cta_inclusion: bool,
    pub output_type: String,
    pub previous_script: String,
}

// ============================================================================
// Question Response
// ============================================================================

/// Service response to a question request. `question: None` signals the
/// refinement loop is done.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefinementQuestion {
    pub question: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
}

impl RefinementQuestion {
    pub fn none() -> Self {
        Self::default()
    }
}

// ============================================================================
// Generation Result
// ============================================================================

/// A scene transition cue within the script timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    #[serde(default)]
    pub time_offset: Value,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

/// Suggested b-roll footage for a time range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BRollCue {
    #[serde(default)]
    pub time_range: Value,
    #[serde(default)]
    pub content: String,
}

/// On-screen text overlay cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOverlay {
    #[serde(default)]
    pub time: Value,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub style: Option<String>,
}

/// Sound effect cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundCue {
    #[serde(default)]
    pub time: Value,
    #[serde(default)]
    pub effect: String,
}

/// Structured script document with production metadata.
///
/// Every field is optional; unknown fields the service sends are preserved
/// in `extra` so nothing is lost across a save/restore cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,
    #[serde(default, rename = "bRoll", skip_serializing_if = "Vec::is_empty")]
    pub b_roll: Vec<BRollCue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_overlays: Vec<TextOverlay>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sound_effects: Vec<SoundCue>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Final outcome of a generation call, replaced wholesale on regeneration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum GenerationResult {
    /// Plain script text with no structured metadata.
    Plain(String),
    /// Structured script document.
    Script(ScriptDocument),
    /// Object the service sent that fits no known shape; passed through.
    Raw(Value),
}

impl GenerationResult {
    /// The script text, wherever it lives in this result shape.
    pub fn script_text(&self) -> Option<&str> {
        match self {
            GenerationResult::Plain(text) => Some(text),
            GenerationResult::Script(doc) => doc.script.as_deref(),
            GenerationResult::Raw(value) => value.get("script").and_then(Value::as_str),
        }
    }
}

// ============================================================================
// Error Taxonomy
// ============================================================================

/// Failure class of a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    Server,
    Unknown,
}

/// Classified failure surfaced to the caller. Cleared on the next attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{kind:?} error: {message}")]
pub struct GenerationError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl GenerationError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Network,
            message: message.into(),
            retryable: true,
        }
    }

    /// Timeout cancellations are always retryable.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Timeout,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn server(message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind: ErrorKind::Server,
            message: message.into(),
            retryable,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            message: message.into(),
            retryable: true,
        }
    }
}
