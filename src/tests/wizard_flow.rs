//! End-to-end wizard flow over a mocked generation service: the happy path
//! from style selection through refinement to a scored result, plus failure
//! and regeneration paths.

use std::sync::Arc;

use serde_json::json;

use crate::config::AppConfig;
use crate::core::pipeline::{
    GenerationError, GenerationResult, MockGenerationService, RefinementQuestion, ScriptDocument,
};
use crate::core::wizard::{ScriptStyle, Tone, WizardSession, WizardStep};

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.chat.typing_interval_ms = 0;
    config.chat.answer_delay_ms = 0;
    config.chat.completion_pause_ms = 0;
    config
}

fn session_over(service: MockGenerationService) -> WizardSession {
    let mut session =
        WizardSession::with_service(Arc::new(service), &test_config()).without_persistence();
    session.controller.state.style = Some(ScriptStyle::Educational);
    session.controller.state.topic_keyword = "urban beekeeping".to_string();
    session.controller.state.tone = Some(Tone::Casual);
    session.controller.state.language = Some("Spanish".to_string());
    session
}

fn question(text: &str) -> RefinementQuestion {
    RefinementQuestion {
        question: Some(text.to_string()),
        options: Vec::new(),
    }
}

#[tokio::test]
async fn test_full_flow_to_scored_result() {
    super::init_tracing();

    let mut service = MockGenerationService::new();
    service
        .expect_next_question()
        .times(1)
        .withf(|req| req.language == "es" && req.conversation_history.is_empty())
        .returning(|_| Ok(question("What's the hook?")));
    service
        .expect_next_question()
        .times(1)
        .withf(|req| req.conversation_history.len() == 2)
        .returning(|_| Ok(RefinementQuestion::none()));
    service
        .expect_generate()
        .times(1)
        .withf(|req, _| {
            let context = req.refinement_context.as_deref().unwrap_or("");
            req.text == "urban beekeeping"
                && req.language == "es"
                && context.contains("Q: What's the hook?")
                && context.contains("A: A myth to bust")
                && !context.contains("everything I need")
        })
        .returning(|_, _| {
            Ok(GenerationResult::Script(ScriptDocument {
                script: Some("Bees are the quiet heroes of every city block.".to_string()),
                ..Default::default()
            }))
        });

    let mut session = session_over(service);

    session.advance().await.unwrap(); // style -> topic
    session.advance().await.unwrap(); // topic -> settings
    session.advance().await.unwrap(); // settings -> refinement, first question
    assert_eq!(session.state().step, WizardStep::Refinement);
    assert_eq!(session.state().conversation_history.len(), 1);

    // The closing acknowledgement lands before the step flips, and the
    // answer drives straight through generation.
    session.answer("A myth to bust").await.unwrap();

    let state = session.state();
    assert_eq!(state.step, WizardStep::Result);
    assert!(!session.controller.is_loading());
    assert!(state.last_error.is_none());
    assert!(state.result.is_some());

    let score = state.score.expect("score derived from result");
    assert!(score.overall > 0 && score.overall <= 100);
}

#[tokio::test]
async fn test_generation_failure_surfaces_error_then_retry_succeeds() {
    let mut service = MockGenerationService::new();
    service
        .expect_next_question()
        .returning(|_| Ok(RefinementQuestion::none()));
    service
        .expect_generate()
        .times(1)
        .returning(|_, _| Err(GenerationError::timeout("generation timed out after 90s")));
    service
        .expect_generate()
        .times(1)
        .returning(|_, _| Ok(GenerationResult::Plain("second time lucky".to_string())));

    let mut session = session_over(service);
    session.advance().await.unwrap();
    session.advance().await.unwrap();
    // A service with no questions at all falls straight through to the
    // result step; the first generation attempt fails.
    session.advance().await.unwrap();

    assert_eq!(session.state().step, WizardStep::Result);
    assert!(session.state().result.is_none());
    let err = session.state().last_error.clone().expect("failure recorded");
    assert!(err.retryable);

    session.retry_generation(None).await;
    assert!(session.state().last_error.is_none());
    assert_eq!(
        session.state().result.as_ref().and_then(|r| r.script_text()),
        Some("second time lucky")
    );
}

#[tokio::test]
async fn test_fallback_then_skip_generates_without_context() {
    let mut service = MockGenerationService::new();
    service
        .expect_next_question()
        .times(1)
        .returning(|_| Err(GenerationError::network("connection refused")));
    service
        .expect_generate()
        .times(1)
        .withf(|req, _| req.refinement_context.is_none())
        .returning(|_, _| Ok(GenerationResult::Plain("generated anyway".to_string())));

    let mut session = session_over(service);
    session.advance().await.unwrap();
    session.advance().await.unwrap();
    session.advance().await.unwrap();

    // Degraded loop: fallback prompt posted, no error surfaced.
    assert_eq!(session.state().step, WizardStep::Refinement);
    assert_eq!(session.state().conversation_history.len(), 1);
    assert!(session.state().last_error.is_none());

    session.request_skip();
    session.confirm_skip().await.unwrap();

    assert_eq!(session.state().step, WizardStep::Result);
    assert!(session.state().result.is_some());
}

#[tokio::test]
async fn test_retreat_from_refinement_restarts_conversation() {
    let mut service = MockGenerationService::new();
    service
        .expect_next_question()
        .times(2)
        .withf(|req| req.conversation_history.is_empty())
        .returning(|_| Ok(question("Fresh start?")));

    let mut session = session_over(service);
    session.advance().await.unwrap();
    session.advance().await.unwrap();
    session.advance().await.unwrap();
    assert_eq!(session.state().conversation_history.len(), 1);

    session.retreat().await.unwrap();
    assert_eq!(session.state().step, WizardStep::Settings);
    assert!(session.state().conversation_history.is_empty());

    // Re-entry fetches the first question again, with empty history.
    session.advance().await.unwrap();
    assert_eq!(session.state().conversation_history.len(), 1);
}

#[tokio::test]
async fn test_regenerate_carries_previous_script_and_instruction() {
    let mut service = MockGenerationService::new();
    service
        .expect_next_question()
        .returning(|_| Ok(RefinementQuestion::none()));
    service
        .expect_generate()
        .times(1)
        .returning(|_, _| {
            Ok(GenerationResult::Raw(json!({
                "script": "version one",
                "mood": "upbeat"
            })))
        });
    service
        .expect_regenerate()
        .times(1)
        .withf(|req, _| {
            req.text == "urban beekeeping - make it funnier"
                && req.previous_script == "version one"
        })
        .returning(|_, _| Ok(GenerationResult::Plain("version two".to_string())));

    let mut session = session_over(service);
    session.advance().await.unwrap();
    session.advance().await.unwrap();
    session.advance().await.unwrap();
    assert_eq!(
        session.state().result.as_ref().and_then(|r| r.script_text()),
        Some("version one")
    );

    session.regenerate("make it funnier", None).await;
    assert_eq!(
        session.state().result.as_ref().and_then(|r| r.script_text()),
        Some("version two")
    );
    assert!(session.state().score.is_some());
}

#[tokio::test]
async fn test_run_generation_refuses_to_double_fire() {
    let mut service = MockGenerationService::new();
    service
        .expect_next_question()
        .returning(|_| Ok(RefinementQuestion::none()));
    service
        .expect_generate()
        .times(1)
        .returning(|_, _| Ok(GenerationResult::Plain("only once".to_string())));

    let mut session = session_over(service);
    session.advance().await.unwrap();
    session.advance().await.unwrap();
    session.advance().await.unwrap();

    // Re-entering the result step must not replace an existing result.
    session.run_generation(None).await;
    session.run_generation(None).await;
    assert_eq!(
        session.state().result.as_ref().and_then(|r| r.script_text()),
        Some("only once")
    );
}
