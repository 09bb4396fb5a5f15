use crate::context::{PromptBuilder, Transcript, Turn};
use crate::controller::state::{ControllerState, ConversationState, ExchangeKind};
use crate::error::{FailureKind, TicketError};
use crate::llm::{Content, ModelSession};
use crate::ticket::TicketCategory;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

/// Events emitted as the conversation changes - the interface for renderers.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    StateChanged(ControllerState),
    TurnAppended(Turn),
    Failed { kind: FailureKind, reason: String },
}

/// What a renderer needs: the loading flag and the text to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderView {
    pub busy: bool,
    pub last_text: Option<String>,
}

/// Releases the busy flag if an exchange is abandoned mid-flight.
struct BusyGuard<'a> {
    state: &'a Mutex<ConversationState>,
    armed: bool,
}

impl<'a> BusyGuard<'a> {
    fn new(state: &'a Mutex<ConversationState>) -> Self {
        Self { state, armed: true }
    }

    fn finish(
        mut self,
        prompt: String,
        exchange: ExchangeKind,
        outcome: &Result<String, TicketError>,
    ) -> Option<Turn> {
        self.armed = false;
        lock(self.state).finish(prompt, exchange, outcome)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            lock(self.state).release();
        }
    }
}

fn lock(state: &Mutex<ConversationState>) -> MutexGuard<'_, ConversationState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives one conversation: prompt building, the backend call, and the
/// transcript merge.
///
/// Methods take `&self` so the controller can be shared. Only one exchange
/// is in flight at a time; a second request while awaiting a reply gets
/// `TicketError::Busy`.
pub struct ConversationController {
    session: tokio::sync::Mutex<ModelSession>,
    state: Mutex<ConversationState>,
}

impl ConversationController {
    pub fn new(session: ModelSession) -> Self {
        Self {
            session: tokio::sync::Mutex::new(session),
            state: Mutex::new(ConversationState::new()),
        }
    }

    pub fn with_prompt_builder(self, prompts: PromptBuilder) -> Self {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .with_prompt_builder(prompts);
        Self {
            session: self.session,
            state: Mutex::new(state),
        }
    }

    pub fn set_input(&self, text: impl Into<String>) {
        lock(&self.state).set_input(text);
    }

    pub fn set_category(&self, category: TicketCategory) {
        lock(&self.state).set_category(category);
    }

    /// Add business vocabulary to every later prompt.
    pub fn add_context(
        &self,
        keyword: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Result<(), TicketError> {
        lock(&self.state).add_context(keyword, meaning)
    }

    pub fn remove_context(&self, keyword: &str) -> Option<String> {
        lock(&self.state).remove_context(keyword)
    }

    /// Set category and input, then generate.
    pub async fn submit(
        &self,
        category: TicketCategory,
        text: impl Into<String>,
    ) -> Result<String, TicketError> {
        {
            let mut state = lock(&self.state);
            state.set_category(category);
            state.set_input(text);
        }
        self.generate().await
    }

    /// Generate a ticket for the pending input and category.
    pub async fn generate(&self) -> Result<String, TicketError> {
        let (tx, _rx) = unbounded_channel();
        self.generate_with_events(tx).await
    }

    /// Generate, emitting `ControllerEvent`s through the channel.
    pub async fn generate_with_events(
        &self,
        event_tx: UnboundedSender<ControllerEvent>,
    ) -> Result<String, TicketError> {
        let (prompt, user_turn) = lock(&self.state).begin_request()?;
        let guard = BusyGuard::new(&self.state);
        let _ = event_tx.send(ControllerEvent::TurnAppended(user_turn));
        self.exchange(guard, prompt, ExchangeKind::Request, &event_tx).await
    }

    /// Ask the model to open the conversation. The reply is appended.
    pub async fn greet(&self) -> Result<String, TicketError> {
        let (tx, _rx) = unbounded_channel();
        self.greet_with_events(tx).await
    }

    pub async fn greet_with_events(
        &self,
        event_tx: UnboundedSender<ControllerEvent>,
    ) -> Result<String, TicketError> {
        let prompt = lock(&self.state).begin_greeting()?;
        let guard = BusyGuard::new(&self.state);
        self.exchange(guard, prompt, ExchangeKind::Greeting, &event_tx).await
    }

    /// Send the last failed request again, if it failed transiently.
    pub async fn retry(&self) -> Result<String, TicketError> {
        let (tx, _rx) = unbounded_channel();
        self.retry_with_events(tx).await
    }

    pub async fn retry_with_events(
        &self,
        event_tx: UnboundedSender<ControllerEvent>,
    ) -> Result<String, TicketError> {
        let (prompt, exchange) = lock(&self.state).begin_retry()?;
        let guard = BusyGuard::new(&self.state);
        self.exchange(guard, prompt, exchange, &event_tx).await
    }

    async fn exchange(
        &self,
        guard: BusyGuard<'_>,
        prompt: String,
        exchange: ExchangeKind,
        event_tx: &UnboundedSender<ControllerEvent>,
    ) -> Result<String, TicketError> {
        let _ = event_tx.send(ControllerEvent::StateChanged(ControllerState::AwaitingReply));
        tracing::info!(?exchange, "generation started");

        let outcome = {
            let mut session = self.session.lock().await;
            session.send(&prompt).await
        };

        let appended = guard.finish(prompt, exchange, &outcome);

        match &outcome {
            Ok(_) => tracing::info!(?exchange, "generation finished"),
            Err(e) => {
                tracing::warn!(?exchange, error = %e, "generation failed");
                if let TicketError::GenerationFailed { kind, reason } = e {
                    let _ = event_tx.send(ControllerEvent::Failed {
                        kind: *kind,
                        reason: reason.clone(),
                    });
                }
            }
        }
        if let Some(turn) = appended {
            let _ = event_tx.send(ControllerEvent::TurnAppended(turn));
        }
        let _ = event_tx.send(ControllerEvent::StateChanged(ControllerState::Idle));

        outcome
    }

    pub fn state(&self) -> ControllerState {
        lock(&self.state).state()
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.state).is_busy()
    }

    pub fn category(&self) -> TicketCategory {
        lock(&self.state).category()
    }

    pub fn pending_input(&self) -> String {
        lock(&self.state).pending_input().to_string()
    }

    pub fn last_failure(&self) -> Option<FailureKind> {
        lock(&self.state).last_failure()
    }

    /// A copy of the transcript as it is now.
    pub fn transcript(&self) -> Transcript {
        lock(&self.state).transcript().clone()
    }

    /// A copy of the whole conversation state.
    pub fn snapshot(&self) -> ConversationState {
        lock(&self.state).clone()
    }

    pub fn view(&self) -> RenderView {
        let state = lock(&self.state);
        RenderView {
            busy: state.is_busy(),
            last_text: state.transcript().last().map(|t| t.text().to_string()),
        }
    }

    /// The remote-side history held by the model session.
    pub async fn session_history(&self) -> Vec<Content> {
        self.session.lock().await.history().to_vec()
    }
}
