pub mod chat;
pub mod festival;
pub mod language;
pub mod llm;
pub mod realtime;

// Re-export commonly used types for convenience
pub use chat::{ChatError, ChatRequest, ChatResponse, ChatService, ChatServiceConfig, StructuredReply};
pub use festival::{FestivalError, FestivalFacts, FestivalSummary};
pub use language::Language;
pub use llm::{ChatModel, LlmError, OpenAIChatConfig, OpenAIChatModel};
pub use realtime::{CallState, RealtimeBridge, RealtimeError, RealtimeResult, SessionMinter};
