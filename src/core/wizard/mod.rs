//! Wizard Controller & Session
//!
//! [`WizardController`] owns the step state machine: validation-gated
//! forward transitions, back-navigation with its history-clearing rule, and
//! the liveness guard that keeps a stale in-flight generation from landing
//! in a session that has since moved on.
//!
//! The controller performs no I/O. Transitions that require work from a
//! producer return a [`StepEffect`]; [`WizardSession`] executes those
//! effects against the chat engine and the generation service, and
//! auto-saves a snapshot after every meaningful change.

pub mod types;

use std::sync::Arc;

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::core::chat::{
    refinement_context, ChatEvent, ChatOutcome, RefinementChatEngine, RefinementParams,
    TurnIdGenerator, TypingSimulator,
};
use crate::core::language::language_code;
use crate::core::pipeline::{
    GenerationError, GenerationPipeline, GenerationResult, GenerationService, PipelineConfig,
    RegenerateRequest, ScriptRequest,
};
use crate::core::score;
use crate::core::session::SessionStore;

pub use types::{ScriptStyle, Tone, WizardError, WizardState, WizardStep, DEFAULT_DURATION_SECONDS};

// ============================================================================
// Controller
// ============================================================================

/// Work a transition asks its caller to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEffect {
    /// Refinement was entered; fetch the opening question.
    FetchFirstQuestion,
    /// The result step was entered; run final generation.
    StartGeneration,
}

/// The wizard step state machine. Pure state, no I/O.
#[derive(Debug, Clone, Default)]
pub struct WizardController {
    pub state: WizardState,
    /// Bumped whenever a new generation starts or the session moves in a way
    /// that invalidates one in flight. Responses carrying an older epoch are
    /// dropped on arrival.
    epoch: u64,
    is_loading: bool,
}

impl WizardController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a controller around a restored state. The quality score is
    /// recomputed from the restored result rather than trusted from disk.
    pub fn from_state(mut state: WizardState) -> Self {
        state.score = state
            .result
            .as_ref()
            .and_then(|r| r.script_text())
            .map(|text| {
                score::evaluate(
                    text,
                    state.target_duration_seconds,
                    state.include_call_to_action,
                )
            });
        state.last_error = None;
        Self {
            state,
            epoch: 0,
            is_loading: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Fraction of the flow completed, for a progress bar. `Style` is 0.0,
    /// `Result` is 1.0.
    pub fn progress(&self) -> f32 {
        self.state.step.index() as f32 / (WizardStep::ALL.len() - 1) as f32
    }

    /// Whether the current step's data is complete enough to move forward.
    ///
    /// `Refinement` always answers `false` here: it is left through
    /// [`complete_refinement`](Self::complete_refinement) or
    /// [`skip_to_result`](Self::skip_to_result), never a generic advance.
    pub fn can_advance(&self) -> bool {
        match self.state.step {
            WizardStep::Style => self.state.has_style(),
            WizardStep::Topic => self.state.has_topic(),
            WizardStep::Settings => self.state.has_settings(),
            WizardStep::Refinement | WizardStep::Result => false,
        }
    }

    /// Advance one step after validating the current one.
    pub fn advance(&mut self) -> Result<Option<StepEffect>, WizardError> {
        let step = self.state.step;
        match step {
            WizardStep::Style | WizardStep::Topic | WizardStep::Settings => {
                if !self.can_advance() {
                    return Err(WizardError::IncompleteStep {
                        step,
                        reason: self.incomplete_reason(step),
                    });
                }
            }
            WizardStep::Refinement => {
                return Err(WizardError::InvalidTransition {
                    from: WizardStep::Refinement,
                    to: WizardStep::Result,
                });
            }
            WizardStep::Result => return Err(WizardError::AtLastStep(step)),
        }

        let next = step.next().ok_or(WizardError::AtLastStep(step))?;
        self.state.step = next;
        tracing::info!(from = %step, to = %next, "wizard advanced");

        Ok(match next {
            WizardStep::Refinement => Some(StepEffect::FetchFirstQuestion),
            _ => None,
        })
    }

    /// Go back one step.
    ///
    /// Leaving `Refinement` backward discards the conversation: a later
    /// re-entry starts the question loop from scratch against the (possibly
    /// changed) settings. Going back while a generation is in flight
    /// invalidates it.
    pub fn retreat(&mut self) -> Result<(), WizardError> {
        let step = self.state.step;
        let previous = step.previous().ok_or(WizardError::AtFirstStep(step))?;

        if step == WizardStep::Refinement {
            self.state.conversation_history.clear();
        }
        if self.is_loading {
            self.invalidate_inflight();
        }

        self.state.step = previous;
        tracing::info!(from = %step, to = %previous, "wizard went back");
        Ok(())
    }

    /// Leave `Refinement` for `Result` because the service ran out of
    /// questions (or the conversation was skipped).
    pub fn complete_refinement(&mut self) -> Result<StepEffect, WizardError> {
        if self.state.step != WizardStep::Refinement {
            return Err(WizardError::InvalidTransition {
                from: self.state.step,
                to: WizardStep::Result,
            });
        }
        self.enter_result();
        Ok(StepEffect::StartGeneration)
    }

    /// Jump straight to generation, bypassing refinement. Valid from
    /// `Settings` (with its data complete) or from inside `Refinement`.
    pub fn skip_to_result(&mut self) -> Result<StepEffect, WizardError> {
        match self.state.step {
            WizardStep::Settings => {
                if !self.can_advance() {
                    return Err(WizardError::IncompleteStep {
                        step: WizardStep::Settings,
                        reason: self.incomplete_reason(WizardStep::Settings),
                    });
                }
                self.enter_result();
                Ok(StepEffect::StartGeneration)
            }
            WizardStep::Refinement => {
                self.state.conversation_history.clear();
                self.enter_result();
                Ok(StepEffect::StartGeneration)
            }
            step => Err(WizardError::InvalidTransition {
                from: step,
                to: WizardStep::Result,
            }),
        }
    }

    /// Start over from a blank state. Anything in flight is invalidated.
    pub fn reset(&mut self) {
        self.invalidate_inflight();
        self.state = WizardState::new();
        tracing::info!("wizard reset");
    }

    /// Mark a generation as started and get the epoch token its result must
    /// present on arrival.
    pub fn begin_generation(&mut self) -> u64 {
        self.epoch += 1;
        self.is_loading = true;
        self.state.last_error = None;
        self.state.result = None;
        self.state.score = None;
        self.epoch
    }

    /// Land a finished generation. Ignored when `epoch` is stale, so a
    /// response from before a reset or back-navigation cannot clobber the
    /// current session.
    pub fn apply_result(&mut self, epoch: u64, result: GenerationResult) {
        if epoch != self.epoch {
            tracing::debug!(epoch, current = self.epoch, "dropping stale generation result");
            return;
        }
        self.is_loading = false;
        self.state.score = result.script_text().map(|text| {
            score::evaluate(
                text,
                self.state.target_duration_seconds,
                self.state.include_call_to_action,
            )
        });
        self.state.result = Some(result);
        self.state.last_error = None;
    }

    /// Land a failed generation, subject to the same staleness rule.
    pub fn apply_error(&mut self, epoch: u64, error: GenerationError) {
        if epoch != self.epoch {
            tracing::debug!(epoch, current = self.epoch, "dropping stale generation error");
            return;
        }
        self.is_loading = false;
        self.state.last_error = Some(error);
    }

    fn enter_result(&mut self) {
        self.state.step = WizardStep::Result;
        self.state.result = None;
        self.state.score = None;
        self.state.last_error = None;
        tracing::info!("wizard entered result step");
    }

    fn invalidate_inflight(&mut self) {
        self.epoch += 1;
        self.is_loading = false;
    }

    fn incomplete_reason(&self, step: WizardStep) -> String {
        match step {
            WizardStep::Style => {
                if self.state.style == Some(ScriptStyle::Other) {
                    "custom style needs a label".to_string()
                } else {
                    "no style selected".to_string()
                }
            }
            WizardStep::Topic => "topic keyword is empty".to_string(),
            WizardStep::Settings => "tone and language must both be chosen".to_string(),
            _ => "step cannot be advanced".to_string(),
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// A full wizard session: controller, chat engine, generation service, and
/// persistence wired together.
pub struct WizardSession {
    pub controller: WizardController,
    chat: RefinementChatEngine,
    service: Arc<dyn GenerationService>,
    store: Option<SessionStore>,
    session_id: String,
    /// Non-fatal problems (failed auto-saves) surfaced to the host.
    notices: Vec<String>,
}

impl WizardSession {
    /// Build a session over an explicit service, used directly by tests and
    /// by hosts that supply their own transport.
    pub fn with_service(service: Arc<dyn GenerationService>, config: &AppConfig) -> Self {
        let chat = RefinementChatEngine::new(
            Arc::clone(&service),
            TypingSimulator::new(config.typing_interval()),
            TurnIdGenerator::new(),
            config.answer_delay(),
            config.completion_pause(),
        );
        Self {
            controller: WizardController::new(),
            chat,
            service,
            store: Some(SessionStore::new(config.data_dir())),
            session_id: Uuid::new_v4().to_string(),
            notices: Vec::new(),
        }
    }

    /// Build a session backed by the HTTP pipeline.
    pub fn new(config: &AppConfig) -> Self {
        let pipeline = GenerationPipeline::new(PipelineConfig::from_app_config(config));
        Self::with_service(Arc::new(pipeline), config)
    }

    /// Resume from a saved snapshot if a fresh one exists. Unreadable
    /// snapshots are reported as a notice and discarded.
    pub fn try_resume(&mut self) {
        let Some(store) = &self.store else { return };
        match store.restore() {
            Ok(Some(state)) => {
                tracing::info!(step = %state.step, "resuming saved session");
                self.controller = WizardController::from_state(state);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "could not restore session snapshot");
                self.notices.push(format!("Saved session ignored: {e}"));
                if let Err(e) = store.clear() {
                    tracing::warn!(error = %e, "could not remove bad snapshot");
                }
            }
        }
    }

    /// Disable persistence (tests, ephemeral hosts).
    pub fn without_persistence(mut self) -> Self {
        self.store = None;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> &WizardState {
        &self.controller.state
    }

    /// Drain accumulated non-fatal notices.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Subscribe a host UI to chat events (typing deltas, turns, options).
    pub fn set_chat_event_sink(&mut self, events: mpsc::UnboundedSender<ChatEvent>) {
        self.chat.set_event_sink(events);
    }

    // ── step navigation ─────────────────────────────────────────────

    /// Advance the wizard, executing whatever the transition requires: on
    /// entry into refinement this fetches (and reveals) the first question,
    /// and a service with no questions at all falls straight through to
    /// generation.
    pub async fn advance(&mut self) -> Result<(), WizardError> {
        let effect = self.controller.advance()?;
        self.autosave();

        if effect == Some(StepEffect::FetchFirstQuestion) {
            self.chat.reset_for_entry();
            let params = self.refinement_params();
            let outcome = self
                .chat
                .begin(&params, &mut self.controller.state.conversation_history)
                .await;
            self.autosave();
            if outcome == ChatOutcome::Complete {
                self.finish_refinement().await?;
            }
        }
        Ok(())
    }

    pub async fn retreat(&mut self) -> Result<(), WizardError> {
        self.controller.retreat()?;
        self.autosave();
        Ok(())
    }

    /// Reset everything, including the saved snapshot.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.chat.reset_for_entry();
        if let Some(store) = &self.store {
            if let Err(e) = store.clear() {
                tracing::warn!(error = %e, "could not clear session snapshot");
                self.notices.push(format!("Could not clear saved session: {e}"));
            }
        }
    }

    // ── refinement ──────────────────────────────────────────────────

    /// Submit the user's answer to the current question. Completes the
    /// refinement step (and starts generation) when the service signals it
    /// has nothing more to ask.
    pub async fn answer(&mut self, text: impl Into<String>) -> Result<(), WizardError> {
        let params = self.refinement_params();
        let outcome = self
            .chat
            .submit_answer(text, &params, &mut self.controller.state.conversation_history)
            .await;
        self.autosave();
        if outcome == ChatOutcome::Complete {
            self.finish_refinement().await?;
        }
        Ok(())
    }

    pub fn request_skip(&mut self) {
        self.chat.request_skip();
    }

    pub fn cancel_skip(&mut self) {
        self.chat.cancel_skip();
    }

    /// Confirm a pending skip and jump to generation.
    pub async fn confirm_skip(&mut self) -> Result<(), WizardError> {
        if self.chat.confirm_skip() == Some(ChatOutcome::Skipped) {
            self.finish_refinement().await?;
        }
        Ok(())
    }

    /// Skip refinement from the settings step entirely.
    pub async fn skip_to_result(&mut self) -> Result<(), WizardError> {
        self.controller.skip_to_result()?;
        self.autosave();
        self.run_generation(None).await;
        Ok(())
    }

    async fn finish_refinement(&mut self) -> Result<(), WizardError> {
        self.controller.complete_refinement()?;
        self.autosave();
        self.run_generation(None).await;
        Ok(())
    }

    // ── generation ──────────────────────────────────────────────────

    /// Run final generation if none has produced a result yet. Safe to call
    /// again on re-entry into the result step; it refuses to double-fire.
    ///
    /// Partial streamed text is published on `progress` when provided.
    pub async fn run_generation(&mut self, progress: Option<mpsc::Sender<String>>) {
        if self.controller.is_loading() || self.controller.state.result.is_some() {
            return;
        }

        let request = self.script_request();
        let epoch = self.controller.begin_generation();
        self.autosave();

        match self.service.generate(request, progress).await {
            Ok(result) => self.controller.apply_result(epoch, result),
            Err(e) => {
                tracing::error!(error = %e, "generation failed");
                self.controller.apply_error(epoch, e);
            }
        }
        self.autosave();
    }

    /// Retry after a failed generation.
    pub async fn retry_generation(&mut self, progress: Option<mpsc::Sender<String>>) {
        self.controller.state.last_error = None;
        self.run_generation(progress).await;
    }

    /// Regenerate the current script with an edit instruction. No-op unless
    /// a result exists to edit.
    pub async fn regenerate(
        &mut self,
        instruction: &str,
        progress: Option<mpsc::Sender<String>>,
    ) {
        let Some(previous) = self
            .controller
            .state
            .result
            .as_ref()
            .and_then(|r| r.script_text())
            .map(str::to_string)
        else {
            tracing::warn!("regenerate requested with no previous script");
            return;
        };

        let state = &self.controller.state;
        let request = RegenerateRequest {
            text: format!("{} - {}", state.topic_keyword.trim(), instruction.trim()),
            style: state.style_for_request().unwrap_or_default(),
            length: state.target_duration_seconds,
            tone: state.tone.map(|t| t.as_str().to_string()).unwrap_or_default(),
            language: self.language_for_request(),
            cta_inclusion: state.include_call_to_action,
            output_type: ScriptRequest::OUTPUT_TYPE.to_string(),
            previous_script: previous,
        };

        let epoch = self.controller.begin_generation();
        self.autosave();

        match self.service.regenerate(request, progress).await {
            Ok(result) => self.controller.apply_result(epoch, result),
            Err(e) => {
                tracing::error!(error = %e, "regeneration failed");
                self.controller.apply_error(epoch, e);
            }
        }
        self.autosave();
    }

    // ── helpers ─────────────────────────────────────────────────────

    fn refinement_params(&self) -> RefinementParams {
        let state = &self.controller.state;
        RefinementParams {
            keyword: state.topic_keyword.trim().to_string(),
            style: state.style_for_request().unwrap_or_default(),
            script_length: state.target_duration_seconds,
            tone: state.tone.map(|t| t.as_str().to_string()).unwrap_or_default(),
            language: self.language_for_request(),
        }
    }

    fn script_request(&self) -> ScriptRequest {
        let state = &self.controller.state;
        // A skipped conversation is not sent along; it only contains the
        // prompts the user chose not to engage with.
        let context = if self.chat.was_skipped() {
            None
        } else {
            refinement_context(&state.conversation_history)
        };
        ScriptRequest {
            text: state.topic_keyword.trim().to_string(),
            style: state.style_for_request().unwrap_or_default(),
            length: state.target_duration_seconds,
            tone: state.tone.map(|t| t.as_str().to_string()).unwrap_or_default(),
            language: self.language_for_request(),
            cta_inclusion: state.include_call_to_action,
            output_type: ScriptRequest::OUTPUT_TYPE.to_string(),
            refinement_context: context,
            phase: ScriptRequest::PHASE.to_string(),
        }
    }

    fn language_for_request(&self) -> String {
        self.controller
            .state
            .language
            .as_deref()
            .map(language_code)
            .unwrap_or("en")
            .to_string()
    }

    fn autosave(&mut self) {
        let Some(store) = &self.store else { return };
        if let Err(e) = store.save(&self.controller.state) {
            tracing::warn!(error = %e, "session auto-save failed");
            self.notices.push(format!("Progress could not be saved: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::{MockGenerationService, RefinementQuestion};
    use rstest::rstest;

    fn filled_controller() -> WizardController {
        let mut c = WizardController::new();
        c.state.style = Some(ScriptStyle::Educational);
        c.state.topic_keyword = "urban beekeeping".to_string();
        c.state.tone = Some(Tone::Casual);
        c.state.language = Some("English".to_string());
        c
    }

    fn controller_at_refinement() -> WizardController {
        let mut c = filled_controller();
        c.advance().unwrap();
        c.advance().unwrap();
        c.advance().unwrap();
        assert_eq!(c.state.step, WizardStep::Refinement);
        c
    }

    #[test]
    fn test_advance_blocked_until_step_complete() {
        let mut c = WizardController::new();
        assert!(!c.can_advance());
        assert!(matches!(
            c.advance(),
            Err(WizardError::IncompleteStep { step: WizardStep::Style, .. })
        ));

        c.state.style = Some(ScriptStyle::Comedy);
        assert_eq!(c.advance().unwrap(), None);
        assert_eq!(c.state.step, WizardStep::Topic);

        assert!(c.advance().is_err());
        c.state.topic_keyword = "  ".to_string();
        assert!(c.advance().is_err());
        c.state.topic_keyword = "cats".to_string();
        assert_eq!(c.advance().unwrap(), None);

        assert!(c.advance().is_err());
        c.state.tone = Some(Tone::Humorous);
        c.state.language = Some("English".to_string());
        assert_eq!(c.advance().unwrap(), Some(StepEffect::FetchFirstQuestion));
        assert_eq!(c.state.step, WizardStep::Refinement);
    }

    #[rstest]
    #[case(None, "", false)] // nothing chosen
    #[case(Some(ScriptStyle::Comedy), "", true)] // built-in style needs no label
    #[case(Some(ScriptStyle::Other), "", false)] // other without label
    #[case(Some(ScriptStyle::Other), "   \t", false)] // whitespace label
    #[case(Some(ScriptStyle::Other), "street food reviews", true)]
    fn test_style_gating_table(
        #[case] style: Option<ScriptStyle>,
        #[case] label: &str,
        #[case] expected: bool,
    ) {
        let mut c = WizardController::new();
        c.state.style = style;
        c.state.custom_style_label = label.to_string();
        assert_eq!(c.can_advance(), expected);
    }

    #[test]
    fn test_refinement_cannot_be_advanced_generically() {
        let mut c = controller_at_refinement();
        assert!(!c.can_advance());
        assert!(matches!(
            c.advance(),
            Err(WizardError::InvalidTransition { .. })
        ));

        assert_eq!(c.complete_refinement().unwrap(), StepEffect::StartGeneration);
        assert_eq!(c.state.step, WizardStep::Result);
        assert!(c.advance().is_err());
    }

    #[test]
    fn test_complete_refinement_only_valid_there() {
        let mut c = filled_controller();
        assert!(c.complete_refinement().is_err());
    }

    #[test]
    fn test_skip_to_result_from_settings_and_refinement() {
        // From Settings, once its data is complete.
        let mut c = filled_controller();
        c.advance().unwrap();
        c.advance().unwrap();
        assert_eq!(c.state.step, WizardStep::Settings);
        assert_eq!(c.skip_to_result().unwrap(), StepEffect::StartGeneration);
        assert_eq!(c.state.step, WizardStep::Result);

        // From inside Refinement, abandoning the conversation.
        let mut c = controller_at_refinement();
        c.state
            .conversation_history
            .push(crate::core::chat::ChatTurn::assistant(0, "Q?", vec![]));
        assert_eq!(c.skip_to_result().unwrap(), StepEffect::StartGeneration);
        assert!(c.state.conversation_history.is_empty());

        // Nowhere else.
        let mut c = WizardController::new();
        assert!(c.skip_to_result().is_err());
    }

    #[test]
    fn test_retreat_from_refinement_clears_conversation() {
        let mut c = controller_at_refinement();
        c.state
            .conversation_history
            .push(crate::core::chat::ChatTurn::assistant(0, "Q?", vec![]));

        c.retreat().unwrap();
        assert_eq!(c.state.step, WizardStep::Settings);
        assert!(c.state.conversation_history.is_empty());

        // Settings data survives the retreat.
        assert!(c.state.has_settings());
    }

    #[test]
    fn test_retreat_floor_and_result_path() {
        let mut c = WizardController::new();
        assert!(matches!(c.retreat(), Err(WizardError::AtFirstStep(_))));

        let mut c = controller_at_refinement();
        c.complete_refinement().unwrap();
        c.retreat().unwrap();
        assert_eq!(c.state.step, WizardStep::Refinement);
    }

    #[test]
    fn test_entering_result_clears_previous_outcome() {
        let mut c = controller_at_refinement();
        c.state.result = Some(GenerationResult::Plain("old".to_string()));
        c.state.last_error = Some(GenerationError::network("old"));

        c.complete_refinement().unwrap();
        assert!(c.state.result.is_none());
        assert!(c.state.score.is_none());
        assert!(c.state.last_error.is_none());
    }

    #[test]
    fn test_apply_result_computes_score_and_clears_loading() {
        let mut c = controller_at_refinement();
        c.complete_refinement().unwrap();
        let epoch = c.begin_generation();
        assert!(c.is_loading());

        c.apply_result(epoch, GenerationResult::Plain("bees are great".to_string()));
        assert!(!c.is_loading());
        assert!(c.state.result.is_some());
        let score = c.state.score.unwrap();
        assert!(score.overall <= 100);
    }

    #[test]
    fn test_stale_result_is_dropped() {
        let mut c = controller_at_refinement();
        c.complete_refinement().unwrap();
        let old_epoch = c.begin_generation();
        let new_epoch = c.begin_generation();

        c.apply_result(old_epoch, GenerationResult::Plain("stale".to_string()));
        assert!(c.state.result.is_none());
        assert!(c.is_loading());

        c.apply_error(old_epoch, GenerationError::timeout("stale"));
        assert!(c.state.last_error.is_none());

        c.apply_result(new_epoch, GenerationResult::Plain("fresh".to_string()));
        assert_eq!(
            c.state.result.as_ref().and_then(|r| r.script_text()),
            Some("fresh")
        );
    }

    #[test]
    fn test_retreat_invalidates_inflight_generation() {
        let mut c = controller_at_refinement();
        c.complete_refinement().unwrap();
        let epoch = c.begin_generation();

        c.retreat().unwrap();
        assert!(!c.is_loading());

        c.apply_result(epoch, GenerationResult::Plain("late".to_string()));
        assert!(c.state.result.is_none());
    }

    #[test]
    fn test_reset_returns_to_blank_state() {
        let mut c = controller_at_refinement();
        c.reset();
        assert_eq!(c.state.step, WizardStep::Style);
        assert!(c.state.style.is_none());
        assert!(!c.is_loading());
    }

    #[test]
    fn test_progress_fraction() {
        let mut c = filled_controller();
        assert_eq!(c.progress(), 0.0);
        c.advance().unwrap();
        c.advance().unwrap();
        c.advance().unwrap();
        c.complete_refinement().unwrap();
        assert_eq!(c.progress(), 1.0);
    }

    #[test]
    fn test_from_state_recomputes_score() {
        let mut state = WizardState::new();
        state.step = WizardStep::Result;
        state.result = Some(GenerationResult::Plain(
            "a short script about bees".to_string(),
        ));
        state.last_error = Some(GenerationError::network("leftover"));

        let c = WizardController::from_state(state);
        assert!(c.state.score.is_some());
        assert!(c.state.last_error.is_none());
    }

    fn test_config(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.data.data_dir = Some(dir.to_path_buf());
        config.chat.typing_interval_ms = 0;
        config.chat.answer_delay_ms = 0;
        config.chat.completion_pause_ms = 0;
        config
    }

    #[tokio::test]
    async fn test_session_skip_omits_refinement_context() {
        let mut service = MockGenerationService::new();
        service
            .expect_next_question()
            .returning(|_| Ok(RefinementQuestion {
                question: Some("Angle?".to_string()),
                options: vec![],
            }));
        service
            .expect_generate()
            .times(1)
            .withf(|req, _| req.refinement_context.is_none() && req.language == "en")
            .returning(|_, _| Ok(GenerationResult::Plain("script".to_string())));

        let dir = tempfile::tempdir().unwrap();
        let mut session =
            WizardSession::with_service(Arc::new(service), &test_config(dir.path()))
                .without_persistence();
        session.controller = controller_at_refinement();
        session.controller.state.step = WizardStep::Settings;

        session.advance().await.unwrap();
        assert_eq!(session.state().step, WizardStep::Refinement);
        assert_eq!(session.state().conversation_history.len(), 1);

        session.request_skip();
        session.confirm_skip().await.unwrap();
        assert_eq!(session.state().step, WizardStep::Result);
        assert!(session.state().result.is_some());
    }

    #[tokio::test]
    async fn test_session_autosaves_and_resumes() {
        let mut service = MockGenerationService::new();
        service
            .expect_next_question()
            .returning(|_| Ok(RefinementQuestion {
                question: Some("Angle?".to_string()),
                options: vec![],
            }));

        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let mut session = WizardSession::with_service(Arc::new(service), &config);
        session.controller.state.style = Some(ScriptStyle::Comedy);
        session.advance().await.unwrap();
        assert_eq!(session.state().step, WizardStep::Topic);

        let empty = Arc::new(MockGenerationService::new());
        let mut resumed = WizardSession::with_service(empty, &config);
        resumed.try_resume();
        assert_eq!(resumed.state().step, WizardStep::Topic);
        assert_eq!(resumed.state().style, Some(ScriptStyle::Comedy));
    }
}
