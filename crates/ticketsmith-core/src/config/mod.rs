use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{defaults, endpoints, models};
use crate::controller::ConversationController;
use crate::error::TicketError;
use crate::llm::{GeminiClient, GenerationConfig, ModelSession};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSettings {
    pub name: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: models::DEFAULT_GEMINI_MODEL.to_string(),
            api_key_env: defaults::API_KEY_ENV.to_string(),
            base_url: None,
            timeout_secs: defaults::TIMEOUT_SECS,
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ticketsmith")
            .join("config.toml")
    }

    /// Load from the default path, falling back to defaults on any problem.
    pub fn load() -> Self {
        let config_path = Self::config_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(settings) => return settings,
                Err(e) => tracing::warn!("Ignoring {}: {}", config_path.display(), e),
            }
        }
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self, TicketError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self =
            toml::from_str(&content).map_err(|e| TicketError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// A zero timeout would fail every send before the backend answers.
    pub fn validate(&self) -> Result<(), TicketError> {
        if self.model.timeout_secs == 0 {
            return Err(TicketError::Config(
                "model.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn save(&self) -> Result<(), TicketError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), TicketError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TicketError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the API key from the environment variable named in settings.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.model.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.model.timeout_secs)
    }

    pub fn base_url(&self) -> &str {
        self.model
            .base_url
            .as_deref()
            .unwrap_or(endpoints::GEMINI_BASE_URL)
    }

    /// Build a model session backed by the Gemini API.
    pub fn build_session(&self) -> Result<ModelSession, TicketError> {
        self.validate()?;
        let api_key = self.api_key().ok_or_else(|| {
            TicketError::Config(format!(
                "API key not found: set the {} environment variable",
                self.model.api_key_env
            ))
        })?;
        let client = GeminiClient::new(api_key).with_base_url(self.base_url());

        Ok(ModelSession::new(
            Box::new(client),
            self.model.name.clone(),
            Arc::new(self.generation.clone()),
        )
        .with_timeout(self.timeout()))
    }

    pub fn build_controller(&self) -> Result<ConversationController, TicketError> {
        Ok(ConversationController::new(self.build_session()?))
    }
}
