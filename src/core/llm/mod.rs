//! Language-model clients used by the chat protocol.

mod base;
mod openai;

pub use base::{ChatMessage, ChatModel, CompletionRequest, LlmError, LlmResult, Role};
pub use openai::{OPENAI_API_BASE_URL, OpenAIChatConfig, OpenAIChatModel};
