pub mod error;
pub mod constants;
pub mod ticket;
pub mod llm;
pub mod context;
pub mod controller;
pub mod config;

// Re-export key types
pub use error::{FailureKind, TicketError};
pub use ticket::TicketCategory;
pub use llm::{
    ChatBackend, ChatRequest, Content, GeminiClient, GenerationConfig, HarmBlockThreshold,
    HarmCategory, ModelSession, Part, Role, SafetySetting,
};
pub use context::{build_prompt, Glossary, PromptBuilder, Transcript, Turn, TurnRole};
pub use controller::{
    ControllerEvent, ControllerState, ConversationController, ConversationState, RenderView,
};
pub use config::Settings;
