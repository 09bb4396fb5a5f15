use crate::context::glossary::Glossary;
use crate::error::TicketError;
use crate::ticket::TicketCategory;

/// Build the instruction sent to the model for a ticket request.
///
/// `request_text` is embedded verbatim. Empty or whitespace-only input is
/// rejected so callers never reach the backend with nothing to ask.
pub fn build_prompt(category: TicketCategory, request_text: &str) -> Result<String, TicketError> {
    if request_text.trim().is_empty() {
        return Err(TicketError::InvalidInput(
            "ticket request must not be empty".to_string(),
        ));
    }

    let prompt = match category {
        TicketCategory::Feature => format!(
            "I need to create a jira ticket for a feature with a title, description, \
            acceptance criteria and use cases with the Given-When-Then (Gherkin) system, \
            regarding: {request_text}"
        ),
        TicketCategory::Bug => format!(
            "I need to create a jira ticket for a bug with title, description, \
            steps to reproduce, expected behaviour and actual behaviour, \
            regarding: {request_text}"
        ),
    };
    Ok(prompt)
}

/// Prompt builder that can also carry business vocabulary.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    glossary: Glossary,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = glossary;
        self
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    pub fn glossary_mut(&mut self) -> &mut Glossary {
        &mut self.glossary
    }

    pub fn build(&self, category: TicketCategory, request_text: &str) -> Result<String, TicketError> {
        let mut prompt = build_prompt(category, request_text)?;

        if !self.glossary.is_empty() {
            prompt.push_str("\n\nBusiness context:\n");
            for (keyword, meaning) in self.glossary.iter() {
                prompt.push_str(&format!("- {keyword}: {meaning}\n"));
            }
        }

        Ok(prompt)
    }
}
