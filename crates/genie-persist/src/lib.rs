pub mod client;
pub mod error;
pub mod models;
pub mod repositories;

pub use client::PersistClient;
pub use error::{PersistError, Result};
pub use models::{
    Agent, AgentDraft, DocumentRecord, DocumentStatus, FeedbackValue, McpServer, McpServerDraft,
    McpServerType, MessageFeedback, Prompt, Thread,
};
pub use repositories::{
    AgentRepository, CheckpointReader, DocumentRepository, FeedbackRepository,
    McpServerRepository, PromptRepository, ThreadRepository,
};
