//! Quality Score Engine
//!
//! Deterministic heuristics rating a generated script against the session's
//! target parameters. Pure functions, no I/O; recomputed whenever a new
//! result lands. The score is derived locally and never comes from the
//! generation service.

use serde::{Deserialize, Serialize};

/// Words-per-minute assumed for spoken short-form scripts.
const WORDS_PER_MINUTE: f64 = 150.0;

/// Ideal mean sentence length for clarity.
const IDEAL_WORDS_PER_SENTENCE: f64 = 15.0;

/// Call-to-action keywords the engagement heuristic looks for.
const CTA_KEYWORDS: &[&str] = &["subscribe", "follow", "like"];

/// Heuristic 0-100 ratings for a generated script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityScore {
    pub overall: u8,
    pub creativity: u8,
    pub engagement: u8,
    pub clarity: u8,
    pub timing: u8,
}

impl QualityScore {
    fn zero() -> Self {
        Self {
            overall: 0,
            creativity: 0,
            engagement: 0,
            clarity: 0,
            timing: 0,
        }
    }
}

/// Score a script against the target duration and CTA preference.
///
/// A zero-word script scores 0 across every component; all other inputs
/// produce component scores clamped to [0, 100].
pub fn evaluate(text: &str, target_duration_seconds: u32, include_call_to_action: bool) -> QualityScore {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return QualityScore::zero();
    }
    let word_count = words.len() as f64;

    let timing = timing_score(word_count, target_duration_seconds);
    let clarity = clarity_score(text, word_count);
    let engagement = engagement_score(text, include_call_to_action);
    let creativity = creativity_score(text);

    let overall = (timing + clarity + engagement + creativity) / 4.0;

    QualityScore {
        overall: overall.round() as u8,
        creativity: creativity.round() as u8,
        engagement: engagement.round() as u8,
        clarity: clarity.round() as u8,
        timing: timing.round() as u8,
    }
}

/// How close the word count lands to the duration target (150 wpm).
fn timing_score(word_count: f64, target_duration_seconds: u32) -> f64 {
    let expected = f64::from(target_duration_seconds) / 60.0 * WORDS_PER_MINUTE;
    if expected <= 0.0 {
        return 0.0;
    }
    (100.0 - (word_count - expected).abs() / expected * 100.0).max(0.0)
}

/// Penalty for drifting from the ideal mean sentence length.
fn clarity_score(text: &str, word_count: f64) -> f64 {
    let sentence_count = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
        .max(1) as f64;

    let mean_words = word_count / sentence_count;
    (100.0 - (mean_words - IDEAL_WORDS_PER_SENTENCE).abs() * 5.0).max(0.0)
}

/// Base 70, +15 for posing a question, +15 for honoring a requested CTA.
fn engagement_score(text: &str, include_call_to_action: bool) -> f64 {
    let mut score = 70.0;
    if text.contains('?') {
        score += 15.0;
    }
    if include_call_to_action {
        let lowered = text.to_lowercase();
        if CTA_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
            score += 15.0;
        }
    }
    score
}

/// Vocabulary diversity proxy: unique / total tokens, scaled.
fn creativity_score(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let total = tokens.len() as f64;
    let unique = {
        let mut set = std::collections::HashSet::new();
        tokens.iter().filter(|t| set.insert(**t)).count() as f64
    };
    (unique / total * 200.0).min(100.0)
}
