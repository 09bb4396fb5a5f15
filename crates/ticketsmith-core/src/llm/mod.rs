mod traits;
mod gemini;
pub mod session;

pub use traits::*;
pub use gemini::GeminiClient;
pub use session::ModelSession;
