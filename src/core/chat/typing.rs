//! Typing Reveal Simulation
//!
//! Assistant messages are revealed character by character before landing in
//! history. The reveal is presentation, but its completion is a control-flow
//! gate: the engine appends the turn and accepts the next user input only
//! after the reveal finishes.

use std::time::Duration;

use tokio::sync::mpsc;

use super::types::ChatEvent;

/// Drives the character-by-character reveal of assistant text.
#[derive(Debug, Clone)]
pub struct TypingSimulator {
    char_interval: Duration,
}

impl TypingSimulator {
    pub fn new(char_interval: Duration) -> Self {
        Self { char_interval }
    }

    /// Instant reveal, for tests and hosts that render their own animation.
    pub fn instant() -> Self {
        Self {
            char_interval: Duration::ZERO,
        }
    }

    /// Reveal `text`, publishing cumulative snapshots on `events`.
    /// Resolves only when the full text has been revealed.
    pub async fn reveal(&self, text: &str, events: Option<&mpsc::UnboundedSender<ChatEvent>>) {
        if let Some(tx) = events {
            let _ = tx.send(ChatEvent::TypingStarted);
        }

        if self.char_interval.is_zero() {
            if let Some(tx) = events {
                let _ = tx.send(ChatEvent::TypingDelta(text.to_string()));
                let _ = tx.send(ChatEvent::TypingFinished);
            }
            return;
        }

        let mut revealed = String::with_capacity(text.len());
        for c in text.chars() {
            revealed.push(c);
            if let Some(tx) = events {
                let _ = tx.send(ChatEvent::TypingDelta(revealed.clone()));
            }
            tokio::time::sleep(self.char_interval).await;
        }

        if let Some(tx) = events {
            let _ = tx.send(ChatEvent::TypingFinished);
        }
    }
}
