//! Wizard Domain Types
//!
//! Core types for the script-generation wizard:
//! - [`WizardStep`]: the five-step ordered state machine
//! - [`WizardState`]: single source of truth for a session
//! - [`ScriptStyle`] / [`Tone`]: parameter enums with display metadata
//! - [`WizardError`]: error types for wizard operations
//!
//! # Architecture
//!
//! The wizard uses a state machine pattern where each step collects specific
//! data and transitions forward or backward through the flow. `Refinement`
//! sits between `Settings` and `Result` as a real enum variant: entering it
//! is a distinct transition from `Settings`, and leaving it backward clears
//! the conversation so a re-entry restarts the Q&A from scratch.
//!
//! # Serialization
//!
//! All types implement `Serialize`/`Deserialize` for session persistence
//! and IPC with a host shell.

use serde::{Deserialize, Serialize};

use crate::core::chat::ChatTurn;
use crate::core::pipeline::{GenerationError, GenerationResult};
use crate::core::score::QualityScore;

// ============================================================================
// Steps
// ============================================================================

/// The ordered steps of the wizard. `Result` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    /// Pick a script style (or "other" with a custom label).
    Style,
    /// Enter the topic keyword.
    Topic,
    /// Choose duration, tone, language, CTA preference.
    Settings,
    /// Conversational refinement Q&A.
    Refinement,
    /// Generation and review. Terminal.
    Result,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::Style,
        WizardStep::Topic,
        WizardStep::Settings,
        WizardStep::Refinement,
        WizardStep::Result,
    ];

    pub fn next(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Style => Some(WizardStep::Topic),
            WizardStep::Topic => Some(WizardStep::Settings),
            WizardStep::Settings => Some(WizardStep::Refinement),
            WizardStep::Refinement => Some(WizardStep::Result),
            WizardStep::Result => None,
        }
    }

    pub fn previous(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Style => None,
            WizardStep::Topic => Some(WizardStep::Style),
            WizardStep::Settings => Some(WizardStep::Topic),
            WizardStep::Refinement => Some(WizardStep::Settings),
            WizardStep::Result => Some(WizardStep::Refinement),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Style => "style",
            WizardStep::Topic => "topic",
            WizardStep::Settings => "settings",
            WizardStep::Refinement => "refinement",
            WizardStep::Result => "result",
        }
    }

    /// Zero-based position in the flow, for progress display.
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|s| s == self).unwrap_or(0)
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Parameter Enums
// ============================================================================

/// Script style selection. `Other` carries its label in
/// [`WizardState::custom_style_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStyle {
    Educational,
    Storytelling,
    Comedy,
    Motivational,
    ProductShowcase,
    DayInTheLife,
    Other,
}

impl ScriptStyle {
    pub fn display_name(&self) -> &'static str {
        match self {
            ScriptStyle::Educational => "Educational",
            ScriptStyle::Storytelling => "Storytelling",
            ScriptStyle::Comedy => "Comedy",
            ScriptStyle::Motivational => "Motivational",
            ScriptStyle::ProductShowcase => "Product Showcase",
            ScriptStyle::DayInTheLife => "Day in the Life",
            ScriptStyle::Other => "Other",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptStyle::Educational => "educational",
            ScriptStyle::Storytelling => "storytelling",
            ScriptStyle::Comedy => "comedy",
            ScriptStyle::Motivational => "motivational",
            ScriptStyle::ProductShowcase => "product_showcase",
            ScriptStyle::DayInTheLife => "day_in_the_life",
            ScriptStyle::Other => "other",
        }
    }
}

/// Tone of voice for the generated script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Casual,
    Professional,
    Energetic,
    Humorous,
    Inspirational,
    Dramatic,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Casual => "casual",
            Tone::Professional => "professional",
            Tone::Energetic => "energetic",
            Tone::Humorous => "humorous",
            Tone::Inspirational => "inspirational",
            Tone::Dramatic => "dramatic",
        }
    }
}

// ============================================================================
// WizardState
// ============================================================================

/// Default target duration for a short-form script, in seconds.
pub const DEFAULT_DURATION_SECONDS: u32 = 60;

/// Single source of truth for a wizard session.
///
/// Mutated only by the controller's transition handlers and the producer
/// components (chat engine, pipeline) through their defined entry points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardState {
    pub step: WizardStep,
    pub style: Option<ScriptStyle>,
    /// Label for [`ScriptStyle::Other`]; ignored for built-in styles.
    pub custom_style_label: String,
    pub topic_keyword: String,
    pub target_duration_seconds: u32,
    /// Display name; mapped to a wire code at request time. `None` = unset.
    pub language: Option<String>,
    pub tone: Option<Tone>,
    pub include_call_to_action: bool,
    /// Append-only during refinement; cleared on step regression into it.
    pub conversation_history: Vec<ChatTurn>,
    pub result: Option<GenerationResult>,
    /// Derived from `result`; never persisted independently of it.
    pub score: Option<QualityScore>,
    /// Ephemeral: cleared on the next attempt.
    pub last_error: Option<GenerationError>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            step: WizardStep::Style,
            style: None,
            custom_style_label: String::new(),
            topic_keyword: String::new(),
            target_duration_seconds: DEFAULT_DURATION_SECONDS,
            language: None,
            tone: None,
            include_call_to_action: false,
            conversation_history: Vec::new(),
            result: None,
            score: None,
            last_error: None,
        }
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The style string sent to the service: the custom label for `Other`,
    /// the canonical name otherwise.
    pub fn style_for_request(&self) -> Option<String> {
        match self.style? {
            ScriptStyle::Other => {
                let label = self.custom_style_label.trim();
                if label.is_empty() {
                    None
                } else {
                    Some(label.to_string())
                }
            }
            style => Some(style.as_str().to_string()),
        }
    }

    /// Whether the style step is satisfied.
    pub fn has_style(&self) -> bool {
        self.style_for_request().is_some()
    }

    /// Whether the topic step is satisfied.
    pub fn has_topic(&self) -> bool {
        !self.topic_keyword.trim().is_empty()
    }

    /// Whether the settings step is satisfied: tone and language both
    /// explicitly chosen.
    pub fn has_settings(&self) -> bool {
        self.tone.is_some() && self.language.as_deref().map_or(false, |l| !l.trim().is_empty())
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during wizard operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("Invalid step transition: cannot move from {from} to {to}")]
    InvalidTransition { from: WizardStep, to: WizardStep },

    #[error("Step {step} is incomplete: {reason}")]
    IncompleteStep { step: WizardStep, reason: String },

    #[error("No step before {0}")]
    AtFirstStep(WizardStep),

    #[error("No step after {0}")]
    AtLastStep(WizardStep),
}
