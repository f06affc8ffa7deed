//! Environment-driven configuration.
//!
//! Values are read once at startup. A `.env` file in the working directory
//! (or the path given on the command line) is loaded first.

use crate::types::{AppError, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "amazon.titan-embed-text-v1";
pub const DEFAULT_GENERATION_MODEL: &str = "anthropic.claude-v2";
pub const DEFAULT_OLLAMA_EMBEDDING_MODEL: &str = "nomic-embed-text";
pub const DEFAULT_OLLAMA_GENERATION_MODEL: &str = "llama3.2";
pub const DEFAULT_MAX_TOKENS: u32 = 256;
pub const DEFAULT_TOP_K: usize = 4;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub history: HistoryConfig,
    pub llm: LLMConfig,
    pub rag: RAGConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::Configuration(format!(
                "Unknown LOG_FORMAT '{}': expected 'text' or 'json'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectStoreKind {
    S3,
    Local { root: PathBuf },
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub backend: ObjectStoreKind,
    /// Parent directory of the per-request scratch directories
    pub scratch_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStoreKind {
    DynamoDb,
    Memory,
}

#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Conversation table; only the conversational handler needs it
    pub memory_table: Option<String>,
    pub backend: HistoryStoreKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LLMProviderKind {
    Bedrock,
    Ollama { base_url: String },
}

#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub provider: LLMProviderKind,
    pub region: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct RAGConfig {
    pub top_k: usize,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// When set, bearer tokens are verified with HS256 instead of trusted as-is
    pub jwt_secret: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bucket = var("BUCKET")
            .ok_or_else(|| AppError::Configuration("BUCKET must be set".to_string()))?;

        let backend = match var("OBJECT_STORE").as_deref().unwrap_or("s3") {
            "s3" => ObjectStoreKind::S3,
            "local" => ObjectStoreKind::Local {
                root: var("LOCAL_STORE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("./data/objects")),
            },
            other => {
                return Err(AppError::Configuration(format!(
                    "Unknown OBJECT_STORE '{}': expected 's3' or 'local'",
                    other
                )))
            }
        };

        let history_backend = match var("HISTORY_STORE").as_deref().unwrap_or("dynamodb") {
            "dynamodb" => HistoryStoreKind::DynamoDb,
            "memory" => HistoryStoreKind::Memory,
            other => {
                return Err(AppError::Configuration(format!(
                    "Unknown HISTORY_STORE '{}': expected 'dynamodb' or 'memory'",
                    other
                )))
            }
        };

        let provider = match var("LLM_PROVIDER").as_deref().unwrap_or("bedrock") {
            "bedrock" => LLMProviderKind::Bedrock,
            "ollama" => LLMProviderKind::Ollama {
                base_url: var("OLLAMA_URL")
                    .unwrap_or_else(|| "http://localhost:11434".to_string()),
            },
            other => {
                return Err(AppError::Configuration(format!(
                    "Unknown LLM_PROVIDER '{}': expected 'bedrock' or 'ollama'",
                    other
                )))
            }
        };

        let (default_embedding, default_generation) = match provider {
            LLMProviderKind::Bedrock => (DEFAULT_EMBEDDING_MODEL, DEFAULT_GENERATION_MODEL),
            LLMProviderKind::Ollama { .. } => (
                DEFAULT_OLLAMA_EMBEDDING_MODEL,
                DEFAULT_OLLAMA_GENERATION_MODEL,
            ),
        };

        Ok(Config {
            server: ServerConfig {
                host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port: parse_or("PORT", var("PORT"), 3000)?,
                log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                log_format: var("LOG_FORMAT")
                    .map(|v| v.parse())
                    .transpose()?
                    .unwrap_or(LogFormat::Text),
            },
            storage: StorageConfig {
                bucket,
                backend,
                scratch_dir: var("SCRATCH_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(env::temp_dir),
            },
            history: HistoryConfig {
                memory_table: var("MEMORY_TABLE"),
                backend: history_backend,
            },
            llm: LLMConfig {
                provider,
                region: var("AWS_REGION_NAME").unwrap_or_else(|| DEFAULT_REGION.to_string()),
                embedding_model: var("EMBEDDING_MODEL_ID")
                    .unwrap_or_else(|| default_embedding.to_string()),
                generation_model: var("GENERATION_MODEL_ID")
                    .unwrap_or_else(|| default_generation.to_string()),
                max_tokens: parse_or(
                    "GENERATION_MAX_TOKENS",
                    var("GENERATION_MAX_TOKENS"),
                    DEFAULT_MAX_TOKENS,
                )?,
                temperature: var("GENERATION_TEMPERATURE")
                    .map(|v| parse_value("GENERATION_TEMPERATURE", &v))
                    .transpose()?,
            },
            rag: RAGConfig {
                top_k: parse_or("RETRIEVER_TOP_K", var("RETRIEVER_TOP_K"), DEFAULT_TOP_K)?,
            },
            auth: AuthConfig {
                jwt_secret: var("JWT_SECRET"),
            },
        })
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        AppError::Configuration(format!("{} has an invalid value: '{}'", key, value))
    })
}

fn parse_or<T: FromStr>(key: &str, value: Option<String>, default: T) -> Result<T> {
    match value {
        Some(v) => parse_value(key, &v),
        None => Ok(default),
    }
}
