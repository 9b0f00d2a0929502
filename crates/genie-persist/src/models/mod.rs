mod agent;
mod document;
mod feedback;
mod mcp_server;
mod prompt;
mod thread;

pub use agent::{Agent, AgentDraft};
pub use document::{DocumentRecord, DocumentStatus};
pub use feedback::{FeedbackValue, MessageFeedback};
pub use mcp_server::{McpServer, McpServerDraft, McpServerType};
pub use prompt::Prompt;
pub use thread::Thread;
