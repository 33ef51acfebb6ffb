//! HTTP request handlers
//!
//! - `api` - Health check endpoint
//! - `festival` - Festival facts
//! - `chat` - Structured chat turns
//! - `session` - Ephemeral realtime session credentials

pub mod api;
pub mod chat;
pub mod festival;
pub mod session;

pub use chat::chat_handler;
pub use session::{create_default_session, create_session};
