use crate::constants::phrases;
use crate::context::{PromptBuilder, Transcript, Turn};
use crate::error::{FailureKind, TicketError};
use crate::ticket::TicketCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    AwaitingReply,
}

/// What to do with the reply once it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExchangeKind {
    /// A user request: clears the pending input on success.
    Request,
    /// The opening greeting.
    Greeting,
}

/// A sent prompt that got no answer, kept for the retry policy.
#[derive(Debug, Clone)]
pub(crate) struct FailedRequest {
    pub prompt: String,
    pub kind: FailureKind,
    pub exchange: ExchangeKind,
}

/// Everything one conversation knows. Only the controller mutates it.
///
/// Transitions are synchronous; the controller performs the backend call
/// between `begin_*` and `finish`.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    transcript: Transcript,
    busy: bool,
    category: TicketCategory,
    pending_input: String,
    prompts: PromptBuilder,
    last_failure: Option<FailedRequest>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn state(&self) -> ControllerState {
        if self.busy {
            ControllerState::AwaitingReply
        } else {
            ControllerState::Idle
        }
    }

    pub fn category(&self) -> TicketCategory {
        self.category
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Kind of the last unanswered request, if the last exchange failed.
    pub fn last_failure(&self) -> Option<FailureKind> {
        self.last_failure.as_ref().map(|f| f.kind)
    }

    pub(crate) fn set_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    pub(crate) fn set_category(&mut self, category: TicketCategory) {
        self.category = category;
    }

    pub(crate) fn add_context(
        &mut self,
        keyword: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Result<(), TicketError> {
        self.prompts.glossary_mut().add(keyword, meaning)
    }

    pub(crate) fn remove_context(&mut self, keyword: &str) -> Option<String> {
        self.prompts.glossary_mut().remove(keyword)
    }

    /// Idle -> AwaitingReply for the pending input.
    ///
    /// Builds the prompt first, so invalid input leaves everything as it
    /// was. On success the raw input is appended as a user turn.
    pub(crate) fn begin_request(&mut self) -> Result<(String, Turn), TicketError> {
        self.ensure_idle()?;
        let prompt = self.prompts.build(self.category, &self.pending_input)?;
        let turn = Turn::user(self.pending_input.clone());
        self.transcript.append(turn.clone());
        self.last_failure = None;
        self.busy = true;
        Ok((prompt, turn))
    }

    /// Idle -> AwaitingReply for the opening greeting. Appends nothing.
    pub(crate) fn begin_greeting(&mut self) -> Result<String, TicketError> {
        self.ensure_idle()?;
        self.busy = true;
        Ok(phrases::GREETING.to_string())
    }

    /// Idle -> AwaitingReply replaying the last failed prompt.
    ///
    /// Only transient failures are replayed. The user turn for the request
    /// is already in the transcript and is not appended again.
    pub(crate) fn begin_retry(&mut self) -> Result<(String, ExchangeKind), TicketError> {
        self.ensure_idle()?;
        let failure = self.last_failure.as_ref().ok_or(TicketError::NothingToRetry)?;
        if !failure.kind.is_retryable() {
            return Err(TicketError::RetryRefused(
                "the model rejected this request; change it before sending again".to_string(),
            ));
        }
        let (prompt, exchange) = (failure.prompt.clone(), failure.exchange);
        self.last_failure = None;
        self.busy = true;
        Ok((prompt, exchange))
    }

    /// AwaitingReply -> Idle.
    ///
    /// A reply becomes a model turn and forgets any earlier failure, so a
    /// later retry cannot land an old answer after newer turns. A failure
    /// appends nothing and is remembered for `begin_retry`. Returns the
    /// appended turn, if any.
    pub(crate) fn finish(
        &mut self,
        prompt: String,
        exchange: ExchangeKind,
        outcome: &Result<String, TicketError>,
    ) -> Option<Turn> {
        self.busy = false;
        match outcome {
            Ok(reply) => {
                let turn = Turn::model(reply.clone());
                self.transcript.append(turn.clone());
                self.last_failure = None;
                if exchange == ExchangeKind::Request {
                    self.pending_input.clear();
                }
                Some(turn)
            }
            Err(e) => {
                self.last_failure = e.failure_kind().map(|kind| FailedRequest {
                    prompt,
                    kind,
                    exchange,
                });
                None
            }
        }
    }

    /// Drop back to Idle without touching the transcript.
    pub(crate) fn release(&mut self) {
        self.busy = false;
    }

    fn ensure_idle(&self) -> Result<(), TicketError> {
        if self.busy {
            Err(TicketError::Busy)
        } else {
            Ok(())
        }
    }
}
