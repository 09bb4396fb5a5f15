mod transcript;
mod prompt;
pub mod glossary;

pub use transcript::{Transcript, Turn, TurnRole};
pub use prompt::{build_prompt, PromptBuilder};
pub use glossary::Glossary;
