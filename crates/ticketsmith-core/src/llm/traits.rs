use crate::constants::defaults;
use crate::error::TicketError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Author of a piece of remote-side history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    pub text: String,
}

/// One message in the history the backend sees.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part { text: text.into() }],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// All text parts joined together.
    pub fn text(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

impl HarmCategory {
    pub fn all() -> [HarmCategory; 4] {
        [
            Self::Harassment,
            Self::HateSpeech,
            Self::SexuallyExplicit,
            Self::DangerousContent,
        ]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

/// A (harm category, block threshold) pair forwarded verbatim to the backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

/// Sampling parameters and safety thresholds for one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    #[serde(default)]
    pub safety_settings: Vec<SafetySetting>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: defaults::TEMPERATURE,
            top_k: defaults::TOP_K,
            top_p: defaults::TOP_P,
            max_output_tokens: defaults::MAX_OUTPUT_TOKENS,
            safety_settings: HarmCategory::all()
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: HarmBlockThreshold::BlockMediumAndAbove,
                })
                .collect(),
        }
    }
}

/// Everything the backend needs to answer one message in a session.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    /// Prior history followed by the new user message.
    pub contents: Vec<Content>,
    pub config: Arc<GenerationConfig>,
}

impl ChatRequest {
    /// The message being sent, i.e. the last entry of `contents`.
    pub fn latest(&self) -> Option<&Content> {
        self.contents.last()
    }
}

/// The backend boundary: send a message in a session, get the reply text.
///
/// Implementations map every failure to `TicketError::GenerationFailed`
/// with the right `FailureKind`.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn generate(&self, request: &ChatRequest) -> Result<String, TicketError>;
}
