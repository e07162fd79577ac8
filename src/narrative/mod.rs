//! Narrative collaborator boundary
//!
//! Turns statistics and samples into prompts for an external text generator
//! and keeps per-session conversation state:
//! - `payload`: one-shot interpretation payload and analysis prompt
//! - `chat`: conversation history, statistics digest, well summary, sessions
//!
//! Text generation itself sits behind `NarrativeBackend`.

use anyhow::Result;
use async_trait::async_trait;

pub mod chat;
pub mod payload;

pub use chat::{
    chat_system_prompt, stats_digest, well_summary, ChatError, ChatMessage, ChatRole, ChatSession,
    ConversationHistory,
};
pub use payload::{analysis_prompt, InterpretationPayload};

/// Text generation backend
#[async_trait]
pub trait NarrativeBackend: Send + Sync {
    /// Markdown text for a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}
