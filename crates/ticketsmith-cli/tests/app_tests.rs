use std::sync::Arc;

use ticketsmith_cli::app::run_single_request;
use ticketsmith_core::{
    ChatBackend, ChatRequest, ConversationController, GenerationConfig, ModelSession,
    TicketCategory, TicketError,
};

/// Backend that always answers the same way.
struct FixedBackend(Result<&'static str, &'static str>);

#[async_trait::async_trait]
impl ChatBackend for FixedBackend {
    async fn generate(&self, _request: &ChatRequest) -> Result<String, TicketError> {
        match self.0 {
            Ok(text) => Ok(text.to_string()),
            Err(reason) => Err(TicketError::transient(reason)),
        }
    }
}

fn controller(backend: FixedBackend) -> ConversationController {
    ConversationController::new(ModelSession::new(
        Box::new(backend),
        "test-model",
        Arc::new(GenerationConfig::default()),
    ))
}

// ========================================================================
// Single-request mode (app.rs)
// ========================================================================

#[tokio::test]
async fn test_single_request_success() {
    let result = run_single_request(
        controller(FixedBackend(Ok("**Title:** Dark mode"))),
        TicketCategory::Feature,
        "dark mode toggle",
        false,
    )
    .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_single_request_failure_does_not_repeat_the_reason() {
    let err = run_single_request(
        controller(FixedBackend(Err("connection reset by peer"))),
        TicketCategory::Bug,
        "login crashes on submit",
        false,
    )
    .await
    .unwrap_err();

    // The reason was printed once already; the returned error only sets the
    // exit status.
    assert!(!err.to_string().contains("connection reset by peer"));
    assert!(err.downcast_ref::<TicketError>().is_none());
}

#[tokio::test]
async fn test_single_request_with_blank_input_fails() {
    let result = run_single_request(
        controller(FixedBackend(Ok("unused"))),
        TicketCategory::Feature,
        "   ",
        false,
    )
    .await;

    assert!(result.is_err());
}
