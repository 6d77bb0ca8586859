pub mod orchestrator;
pub mod prompt;

pub use orchestrator::{Branch, ChatOrchestrator, ChatSettings, ChatStream};
