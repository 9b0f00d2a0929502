mod agent;
mod checkpoint;
mod document;
mod feedback;
mod mcp_server;
mod prompt;
mod thread;

pub use agent::AgentRepository;
pub use checkpoint::CheckpointReader;
pub use document::DocumentRepository;
pub use feedback::FeedbackRepository;
pub use mcp_server::McpServerRepository;
pub use prompt::PromptRepository;
pub use thread::ThreadRepository;
