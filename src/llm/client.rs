//! LLM client abstractions and provider selection
//!
//! The QA engine talks to two adapters over one hosted-inference
//! connection: a text-generation [`LLMClient`] and an
//! [`Embedder`](crate::rag::embeddings::Embedder). [`Provider`] builds both
//! once per process.

use crate::rag::embeddings::Embedder;
use crate::types::Result;
use crate::utils::config::{LLMConfig, LLMProviderKind};
use async_trait::async_trait;
use std::sync::Arc;

/// Generic LLM client trait for provider abstraction
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// The two adapters the QA engine needs.
#[derive(Clone)]
pub struct ModelClients {
    pub llm: Arc<dyn LLMClient>,
    pub embedder: Arc<dyn Embedder>,
}

/// Provider enum for runtime selection
///
/// | Provider | Generation | Embeddings | Notes |
/// |----------|------------|------------|-------|
/// | Bedrock | Anthropic Claude, Amazon Titan | Titan, Cohere | Production |
/// | Ollama | any chat model | any embedding model | `ollama` feature, local only |
#[derive(Debug, Clone)]
pub enum Provider {
    /// Amazon Bedrock runtime in a single region
    Bedrock {
        region: String,
        embedding_model: String,
        generation_model: String,
        max_tokens: u32,
        temperature: Option<f32>,
    },

    /// Ollama local server
    #[cfg(feature = "ollama")]
    Ollama {
        base_url: String,
        embedding_model: String,
        generation_model: String,
    },
}

impl Provider {
    /// Select the provider described by the LLM configuration.
    pub fn from_config(config: &LLMConfig) -> Result<Self> {
        match &config.provider {
            LLMProviderKind::Bedrock => Ok(Provider::Bedrock {
                region: config.region.clone(),
                embedding_model: config.embedding_model.clone(),
                generation_model: config.generation_model.clone(),
                max_tokens: config.max_tokens,
                temperature: config.temperature,
            }),
            #[cfg(feature = "ollama")]
            LLMProviderKind::Ollama { base_url } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                embedding_model: config.embedding_model.clone(),
                generation_model: config.generation_model.clone(),
            }),
            #[cfg(not(feature = "ollama"))]
            LLMProviderKind::Ollama { .. } => Err(crate::types::AppError::Configuration(
                "LLM_PROVIDER=ollama requires building with the 'ollama' feature".to_string(),
            )),
        }
    }

    /// Create both adapters for this provider.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured model id belongs to a model family
    /// the adapters cannot format requests for.
    pub async fn create_clients(&self) -> Result<ModelClients> {
        match self {
            Provider::Bedrock {
                region,
                embedding_model,
                generation_model,
                max_tokens,
                temperature,
            } => {
                let client = super::bedrock::runtime_client(region).await;
                let llm = super::bedrock::BedrockLLM::new(
                    client.clone(),
                    generation_model.clone(),
                    *max_tokens,
                    *temperature,
                )?;
                let embedder =
                    super::bedrock::BedrockEmbeddings::new(client, embedding_model.clone())?;
                Ok(ModelClients {
                    llm: Arc::new(llm),
                    embedder: Arc::new(embedder),
                })
            }

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url,
                embedding_model,
                generation_model,
            } => {
                let client = super::ollama::OllamaClient::new(
                    base_url,
                    generation_model.clone(),
                    embedding_model.clone(),
                )?;
                let client = Arc::new(client);
                Ok(ModelClients {
                    llm: client.clone(),
                    embedder: client,
                })
            }
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Bedrock { .. } => "Bedrock",
            #[cfg(feature = "ollama")]
            Provider::Ollama { .. } => "Ollama",
        }
    }
}

/// Builds the process-wide model clients from configuration.
pub struct LLMClientFactory {
    provider: Provider,
}

impl LLMClientFactory {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    pub fn from_config(config: &LLMConfig) -> Result<Self> {
        Ok(Self::new(Provider::from_config(config)?))
    }

    pub async fn create_clients(&self) -> Result<ModelClients> {
        let clients = self.provider.create_clients().await?;
        tracing::info!(
            provider = self.provider.name(),
            generation_model = clients.llm.model_name(),
            embedding_model = clients.embedder.model_name(),
            "Model clients initialized"
        );
        Ok(clients)
    }
}
