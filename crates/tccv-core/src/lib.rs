pub mod api;
pub mod composer;
pub mod config;
pub mod cycle;
pub mod error;
pub mod hooks;
pub mod render;
pub mod state;

// Re-export main types for convenience
pub use api::{ChatBackend, ChatRequest, ChatResponse, HttpChatClient, DEFAULT_ENDPOINT};
pub use composer::Composer;
pub use config::{Config, ENDPOINT_ENV};
pub use cycle::{dispatch, ChatSession, Outbound, Reply, SendPolicy, DEFAULT_ERROR_TEXT};
pub use error::ApiError;
pub use hooks::{FeatureHooks, NoopHooks, Notice};
pub use render::{Row, RowBody, View, EMPTY_PROMPT};
pub use state::{Conversation, Message, Sender};
