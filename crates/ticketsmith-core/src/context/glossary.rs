use crate::error::TicketError;

/// Keywords of the user's business and what they mean there.
///
/// Entries keep insertion order. Keywords compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    entries: Vec<(String, String)>,
}

impl Glossary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keyword, or replace the meaning of an existing one in place.
    pub fn add(
        &mut self,
        keyword: impl Into<String>,
        meaning: impl Into<String>,
    ) -> Result<(), TicketError> {
        let keyword = keyword.into().trim().to_string();
        let meaning = meaning.into().trim().to_string();

        if keyword.is_empty() {
            return Err(TicketError::InvalidInput("glossary keyword must not be empty".into()));
        }
        if meaning.is_empty() {
            return Err(TicketError::InvalidInput(format!(
                "meaning for '{keyword}' must not be empty"
            )));
        }

        match self.position(&keyword) {
            Some(idx) => self.entries[idx].1 = meaning,
            None => self.entries.push((keyword, meaning)),
        }
        Ok(())
    }

    /// Remove a keyword. Returns its meaning if it was present.
    pub fn remove(&mut self, keyword: &str) -> Option<String> {
        let idx = self.position(keyword.trim())?;
        Some(self.entries.remove(idx).1)
    }

    pub fn get(&self, keyword: &str) -> Option<&str> {
        self.position(keyword.trim()).map(|idx| self.entries[idx].1.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, m)| (k.as_str(), m.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, keyword: &str) -> Option<usize> {
        let keyword = keyword.to_lowercase();
        self.entries
            .iter()
            .position(|(k, _)| k.to_lowercase() == keyword)
    }
}
