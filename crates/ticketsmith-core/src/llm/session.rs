use crate::constants::defaults;
use crate::error::TicketError;
use crate::llm::traits::{ChatBackend, ChatRequest, Content, GenerationConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

/// One continuous conversation with the remote model.
///
/// The history the backend sees is kept here, explicitly, rather than inside
/// the transport. Every `send` replays it ahead of the new message and, on
/// success, extends it with the exchanged pair. A failed `send` leaves it
/// untouched.
pub struct ModelSession {
    id: Uuid,
    backend: Box<dyn ChatBackend>,
    model: String,
    config: Arc<GenerationConfig>,
    history: Vec<Content>,
    timeout: Duration,
}

impl ModelSession {
    pub fn new(
        backend: Box<dyn ChatBackend>,
        model: impl Into<String>,
        config: Arc<GenerationConfig>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            backend,
            model: model.into(),
            config,
            history: Vec::new(),
            timeout: Duration::from_secs(defaults::TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Remote-side history accumulated so far, oldest first.
    pub fn history(&self) -> &[Content] {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Send `prompt` in this session and wait for the reply text.
    pub async fn send(&mut self, prompt: &str) -> Result<String, TicketError> {
        let message = Content::user(prompt);
        let mut contents = self.history.clone();
        contents.push(message.clone());

        let request = ChatRequest {
            model: self.model.clone(),
            contents,
            config: Arc::clone(&self.config),
        };

        let span = tracing::info_span!("model_send", session = %self.id, model = %self.model);
        tracing::debug!(
            parent: &span,
            history = self.history.len(),
            prompt_chars = prompt.chars().count(),
            "sending message"
        );

        let reply = match tokio::time::timeout(self.timeout, self.backend.generate(&request))
            .instrument(span.clone())
            .await
        {
            Ok(result) => result,
            Err(_) => Err(TicketError::transient(format!(
                "No reply within {:?}",
                self.timeout
            ))),
        };

        match reply {
            Ok(text) => {
                self.history.push(message);
                self.history.push(Content::model(text.clone()));
                tracing::debug!(parent: &span, reply_chars = text.chars().count(), "reply received");
                Ok(text)
            }
            Err(e) => {
                let e = match e {
                    TicketError::GenerationFailed { .. } => e,
                    other => TicketError::rejected(other.to_string()),
                };
                tracing::warn!(parent: &span, error = %e, "send failed");
                Err(e)
            }
        }
    }
}
