use mongodb::Client;

use crate::error::{PersistError, Result};
use crate::repositories::{
    AgentRepository, CheckpointReader, DocumentRepository, FeedbackRepository,
    McpServerRepository, PromptRepository, ThreadRepository,
};

/// Handle over every collection the backend uses. Connected once at startup
/// and injected into request handlers; the driver pools connections
/// internally.
pub struct PersistClient {
    thread_repo: ThreadRepository,
    agent_repo: AgentRepository,
    mcp_server_repo: McpServerRepository,
    document_repo: DocumentRepository,
    prompt_repo: PromptRepository,
    feedback_repo: FeedbackRepository,
    checkpoint_reader: CheckpointReader,
}

impl PersistClient {
    pub async fn connect(mongodb_uri: &str, db_name: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        Ok(Self {
            thread_repo: ThreadRepository::new(&client, db_name),
            agent_repo: AgentRepository::new(&client, db_name),
            mcp_server_repo: McpServerRepository::new(&client, db_name),
            document_repo: DocumentRepository::new(&client, db_name),
            prompt_repo: PromptRepository::new(&client, db_name),
            feedback_repo: FeedbackRepository::new(&client, db_name),
            checkpoint_reader: CheckpointReader::new(&client, db_name),
        })
    }

    pub fn threads(&self) -> &ThreadRepository {
        &self.thread_repo
    }

    pub fn agents(&self) -> &AgentRepository {
        &self.agent_repo
    }

    pub fn mcp_servers(&self) -> &McpServerRepository {
        &self.mcp_server_repo
    }

    pub fn documents(&self) -> &DocumentRepository {
        &self.document_repo
    }

    pub fn prompts(&self) -> &PromptRepository {
        &self.prompt_repo
    }

    pub fn feedback(&self) -> &FeedbackRepository {
        &self.feedback_repo
    }

    pub fn checkpoints(&self) -> &CheckpointReader {
        &self.checkpoint_reader
    }
}
