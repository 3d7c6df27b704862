//! Refinement Chat Engine
//!
//! Runs the sequential, service-driven question/answer loop that gathers
//! extra context before final generation. The engine owns the protocol:
//! one fetch in flight at a time, assistant turns revealed via the typing
//! simulation before they land in history, options cleared once answered,
//! and a two-phase skip that bypasses the rest of the loop.
//!
//! Conversation history itself lives in [`WizardState`]; the engine mutates
//! it through the `&mut Vec<ChatTurn>` handed to each call.
//!
//! [`WizardState`]: crate::core::wizard::WizardState

pub mod types;
pub mod typing;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::core::pipeline::{GenerationService, QuestionRequest};

pub use types::{ChatEvent, ChatTurn, Speaker, TurnIdGenerator};
pub use typing::TypingSimulator;

/// Only the most recent turns are kept; older ones are silently dropped to
/// bound memory and request payload size over very long sessions.
pub const MAX_HISTORY_TURNS: usize = 50;

/// Shown when a question fetch fails; the loop degrades instead of erroring.
const FALLBACK_MESSAGE: &str =
    "I couldn't reach the writing assistant just now. Skip ahead whenever \
     you're ready and I'll generate your script from what we have.";

/// Typed when the service signals it has no more questions.
const CLOSING_MESSAGE: &str =
    "Great, that's everything I need. Let me put your script together!";

/// Parameters accompanying every question request, already wire-ready.
#[derive(Debug, Clone)]
pub struct RefinementParams {
    pub keyword: String,
    pub style: String,
    pub script_length: u32,
    pub tone: String,
    pub language: String,
}

/// What a protocol step produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    /// A new assistant question landed in history.
    QuestionPosted,
    /// The fetch failed; the static skip prompt landed instead.
    FallbackPosted,
    /// The service had no more questions; refinement is done.
    Complete,
    /// The user confirmed the skip; refinement is bypassed.
    Skipped,
    /// Nothing happened (duplicate call, or loop already degraded).
    Idle,
}

/// Drives the refinement question/answer loop against the generation service.
pub struct RefinementChatEngine {
    service: Arc<dyn GenerationService>,
    typing: TypingSimulator,
    ids: TurnIdGenerator,
    events: Option<mpsc::UnboundedSender<ChatEvent>>,
    /// Pause between a user answer and the next question fetch.
    answer_delay: Duration,
    /// Pause after the closing acknowledgement before completion fires.
    completion_pause: Duration,
    fetch_attempted: bool,
    fetch_failed: bool,
    skip_pending: bool,
    skipped: bool,
}

impl RefinementChatEngine {
    pub fn new(
        service: Arc<dyn GenerationService>,
        typing: TypingSimulator,
        ids: TurnIdGenerator,
        answer_delay: Duration,
        completion_pause: Duration,
    ) -> Self {
        Self {
            service,
            typing,
            ids,
            events: None,
            answer_delay,
            completion_pause,
            fetch_attempted: false,
            fetch_failed: false,
            skip_pending: false,
            skipped: false,
        }
    }

    /// Subscribe a host UI to typing deltas and turn events.
    pub fn set_event_sink(&mut self, events: mpsc::UnboundedSender<ChatEvent>) {
        self.events = Some(events);
    }

    /// Forget per-entry protocol state. Called on every entry into the
    /// refinement step so the first question is fetched exactly once per
    /// entry; history clearing is the wizard controller's job.
    pub fn reset_for_entry(&mut self) {
        self.fetch_attempted = false;
        self.fetch_failed = false;
        self.skip_pending = false;
        self.skipped = false;
    }

    /// Whether the user skipped refinement (final generation then omits the
    /// refinement context).
    pub fn was_skipped(&self) -> bool {
        self.skipped
    }

    /// Whether a skip confirmation is pending.
    pub fn skip_pending(&self) -> bool {
        self.skip_pending
    }

    /// Fetch and reveal the first question. Idempotent per entry: calling
    /// again, or calling with turns already present, does nothing.
    pub async fn begin(
        &mut self,
        params: &RefinementParams,
        history: &mut Vec<ChatTurn>,
    ) -> ChatOutcome {
        if self.fetch_attempted || !history.is_empty() {
            return ChatOutcome::Idle;
        }
        self.fetch_attempted = true;
        self.fetch_question(params, history).await
    }

    /// Record the user's answer and drive the loop one step further.
    ///
    /// Clears the options on the just-answered question, appends the answer,
    /// waits the fixed pacing delay, then requests the next question with
    /// the full mapped history.
    pub async fn submit_answer(
        &mut self,
        text: impl Into<String>,
        params: &RefinementParams,
        history: &mut Vec<ChatTurn>,
    ) -> ChatOutcome {
        if self.skipped || self.fetch_failed {
            // Degraded loop: the only way forward is skip.
            return ChatOutcome::Idle;
        }

        // Prevent re-answering the question that was just handled.
        if let Some(last) = history
            .iter_mut()
            .rev()
            .find(|t| t.speaker == Speaker::Assistant)
        {
            last.offered_options.clear();
        }

        let turn = ChatTurn::user(self.ids.next_id(), text);
        let id = turn.id;
        history.push(turn);
        Self::cap_history(history);
        self.emit(ChatEvent::TurnAppended(id));

        tokio::time::sleep(self.answer_delay).await;
        self.fetch_question(params, history).await
    }

    /// Phase one of the skip: ask for confirmation.
    pub fn request_skip(&mut self) {
        self.skip_pending = true;
    }

    /// Abandon a pending skip.
    pub fn cancel_skip(&mut self) {
        self.skip_pending = false;
    }

    /// Phase two: commit the skip. Returns `None` when no skip was pending.
    pub fn confirm_skip(&mut self) -> Option<ChatOutcome> {
        if !self.skip_pending {
            return None;
        }
        self.skip_pending = false;
        self.skipped = true;
        tracing::info!("refinement skipped by user");
        Some(ChatOutcome::Skipped)
    }

    async fn fetch_question(
        &mut self,
        params: &RefinementParams,
        history: &mut Vec<ChatTurn>,
    ) -> ChatOutcome {
        let request = QuestionRequest {
            phase: QuestionRequest::PHASE.to_string(),
            conversation_history: history.iter().map(ChatTurn::to_history_entry).collect(),
            keyword: params.keyword.clone(),
            style: params.style.clone(),
            script_length: params.script_length,
            tone: params.tone.clone(),
            language: params.language.clone(),
        };

        match self.service.next_question(request).await {
            Ok(response) => match response.question {
                Some(question) => {
                    self.post_assistant(&question, response.options, history).await;
                    ChatOutcome::QuestionPosted
                }
                None => {
                    self.post_assistant(CLOSING_MESSAGE, Vec::new(), history).await;
                    tokio::time::sleep(self.completion_pause).await;
                    self.emit(ChatEvent::RefinementComplete);
                    ChatOutcome::Complete
                }
            },
            Err(e) => {
                // Never bubbles as user-facing error state: degrade to the
                // static skip prompt and stop fetching for this entry.
                tracing::warn!(error = %e, "question fetch failed, degrading to skip prompt");
                self.fetch_failed = true;
                self.post_assistant(FALLBACK_MESSAGE, Vec::new(), history).await;
                ChatOutcome::FallbackPosted
            }
        }
    }

    /// Reveal assistant text, then append it. The turn enters history only
    /// after the typing reveal completes.
    async fn post_assistant(&mut self, text: &str, options: Vec<String>, history: &mut Vec<ChatTurn>) {
        self.typing.reveal(text, self.events.as_ref()).await;

        let turn = ChatTurn::assistant(self.ids.next_id(), text, options.clone());
        let id = turn.id;
        history.push(turn);
        Self::cap_history(history);

        self.emit(ChatEvent::TurnAppended(id));
        if !options.is_empty() {
            self.emit(ChatEvent::OptionsOffered(options));
        }
    }

    fn cap_history(history: &mut Vec<ChatTurn>) {
        while history.len() > MAX_HISTORY_TURNS {
            history.remove(0);
        }
    }

    fn emit(&self, event: ChatEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

/// Join the conversation into the refinement context string sent with final
/// generation. The engine's own protocol messages (closing acknowledgement,
/// skip fallback) are not questions and are left out. `None` when nothing
/// worth sending remains.
pub fn refinement_context(history: &[ChatTurn]) -> Option<String> {
    let joined = history
        .iter()
        .filter(|turn| turn.text != CLOSING_MESSAGE && turn.text != FALLBACK_MESSAGE)
        .map(|turn| match turn.speaker {
            Speaker::Assistant => format!("Q: {}", turn.text),
            Speaker::User => format!("A: {}", turn.text),
        })
        .collect::<Vec<_>>()
        .join("\n");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}
