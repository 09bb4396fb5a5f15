//! Ticketsmith centralized constants.
//! Model names, endpoints, and default limits live here.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.0-pro";
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
    pub const GEMINI_API_VERSION: &str = "v1beta";
}

// ─── Default Settings ─────────────────────────────────────────────────────────

pub mod defaults {
    pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
    pub const TIMEOUT_SECS: u64 = 45;

    pub const TEMPERATURE: f32 = 0.9;
    pub const TOP_K: u32 = 1;
    pub const TOP_P: f32 = 1.0;
    pub const MAX_OUTPUT_TOKENS: u32 = 2048;
}

// ─── Conversation ─────────────────────────────────────────────────────────────

pub mod phrases {
    /// Opening message sent by the greeting flow.
    pub const GREETING: &str = "Hello, how can I help you today?";
}
