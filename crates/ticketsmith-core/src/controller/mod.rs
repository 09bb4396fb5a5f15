mod core;
mod state;

pub use self::core::{ControllerEvent, ConversationController, RenderView};
pub use state::{ControllerState, ConversationState};
