use crate::google::GoogleClient;
use crate::openai::{AzureOpenAIClient, OpenAIClient};
use crate::traits::ChatClient;
use anyhow::{anyhow, Result};
use std::sync::Arc;

/// API credentials for the supported providers, injected at startup.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub openai_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub azure: Option<AzureCredentials>,
}

#[derive(Debug, Clone)]
pub struct AzureCredentials {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
}

/// Central factory for creating a chat model based on provider + model name.
///
/// Handles are constructed fresh per call; nothing is cached.
pub struct ModelFactory {
    credentials: Credentials,
}

impl ModelFactory {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn create(&self, provider: &str, model: &str) -> Result<Arc<dyn ChatClient>> {
        match provider {
            "openai" => {
                let key = self
                    .credentials
                    .openai_api_key
                    .as_deref()
                    .ok_or_else(|| anyhow!("OPENAI_API_KEY is not configured"))?;
                Ok(Arc::new(OpenAIClient::new(key, model)?))
            }
            "azure-openai" => {
                let azure = self
                    .credentials
                    .azure
                    .as_ref()
                    .ok_or_else(|| anyhow!("Azure OpenAI credentials are not configured"))?;
                Ok(Arc::new(AzureOpenAIClient::new(
                    &azure.endpoint,
                    &azure.api_key,
                    &azure.api_version,
                    model,
                )?))
            }
            // Google is the default provider; unknown names land here too.
            _ => {
                let key = self
                    .credentials
                    .google_api_key
                    .as_deref()
                    .ok_or_else(|| anyhow!("GOOGLE_API_KEY is not configured"))?;
                Ok(Arc::new(GoogleClient::new(key, model)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> ModelFactory {
        ModelFactory::new(Credentials {
            openai_api_key: Some("sk-test".into()),
            google_api_key: Some("g-test".into()),
            azure: None,
        })
    }

    #[test]
    fn create_resolves_known_providers() {
        assert!(factory().create("openai", "gpt-4o").is_ok());
        assert!(factory().create("google", "gemini-2.0-flash").is_ok());
    }

    #[test]
    fn unknown_provider_falls_back_to_google() {
        assert!(factory().create("someday-provider", "model-x").is_ok());
    }

    #[test]
    fn missing_credentials_are_an_error() {
        let factory = ModelFactory::new(Credentials::default());
        assert!(factory.create("openai", "gpt-4o").is_err());
        assert!(factory.create("azure-openai", "gpt-4o").is_err());
        assert!(factory.create("google", "gemini-2.0-flash").is_err());
    }
}
