use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub mongodb: MongoDbConfig,
    pub engine: EngineConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub mongodb_uri: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub google_api_key: Option<String>,
    #[serde(default)]
    pub azure_openai_endpoint: Option<String>,
    #[serde(default)]
    pub azure_openai_api_key: Option<String>,
    #[serde(default)]
    pub azure_openai_api_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
}

/// Address of the external agent-graph engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Defaults used when neither the request nor the agent sets them.
    pub default_provider: String,
    pub default_model: String,
    /// Sampling temperature for the title side-task.
    pub title_temperature: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (SERVER_, MONGODB_, ENGINE_, LLM_, LOG_ prefixes)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::default()
                    .prefix("SERVER")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("MONGODB")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("ENGINE")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("LLM")
                    .separator("_")
                    .try_parsing(true),
            )
            .add_source(
                Environment::default()
                    .prefix("LOG")
                    .separator("_")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let mut cfg: Config = config.try_deserialize()?;

        // Secrets never live in TOML.
        cfg.mongodb_uri = std::env::var("MONGODB_URI").map_err(|_| {
            ConfigError::Message("MONGODB_URI environment variable is required".to_string())
        })?;
        cfg.openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        cfg.google_api_key = std::env::var("GOOGLE_API_KEY").ok();
        cfg.azure_openai_endpoint = std::env::var("AZURE_OPENAI_ENDPOINT").ok();
        cfg.azure_openai_api_key = std::env::var("AZURE_OPENAI_API_KEY").ok();
        cfg.azure_openai_api_version = std::env::var("AZURE_OPENAI_API_VERSION").ok();

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));
        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn credentials(&self) -> genie_llm::Credentials {
        let azure = match (
            &self.azure_openai_endpoint,
            &self.azure_openai_api_key,
        ) {
            (Some(endpoint), Some(api_key)) => Some(genie_llm::AzureCredentials {
                endpoint: endpoint.clone(),
                api_key: api_key.clone(),
                api_version: self
                    .azure_openai_api_version
                    .clone()
                    .unwrap_or_else(|| "2024-06-01".to_string()),
            }),
            _ => None,
        };

        genie_llm::Credentials {
            openai_api_key: self.openai_api_key.clone(),
            google_api_key: self.google_api_key.clone(),
            azure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_structure() {
        let toml = r#"
            [server]
            host = "127.0.0.1"
            port = 3000

            [cors]
            enabled = true
            origins = ["http://localhost:3000"]

            [mongodb]
            database = "genie"

            [engine]
            url = "http://localhost:8123"

            [llm]
            default_provider = "google"
            default_model = "gemini-2.0-flash"
            title_temperature = 0.5

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.mongodb.database, "genie");
        assert_eq!(config.engine.url, "http://localhost:8123");
        assert_eq!(config.llm.default_provider, "google");
    }
}
