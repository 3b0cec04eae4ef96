pub mod openai_compat;
pub mod scripted;
pub mod traits;
pub mod util;

// Re-exports for convenience.
pub use openai_compat::OpenAiCompatProvider;
pub use scripted::ScriptedProvider;
pub use traits::{is_reasoning_model, ChatRequest, ChatResponse, LlmProvider};
