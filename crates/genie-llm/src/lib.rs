pub mod factory;
pub mod google;
pub mod openai;
pub mod traits;
pub mod types;

pub use factory::{AzureCredentials, Credentials, ModelFactory};
pub use google::GoogleClient;
pub use openai::{AzureOpenAIClient, OpenAIClient};
pub use traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse};
pub use types::{Content, ContentBlock, ImageUrl, Message};
