use crate::llm::client::LLMClient;
use crate::rag::embeddings::Embedder;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, request::ChatMessageRequest},
    generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest},
};

const DEFAULT_PORT: u16 = 11434;

/// Generation and embeddings against a local Ollama server.
pub struct OllamaClient {
    client: Ollama,
    model: String,
    embedding_model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: String, embedding_model: String) -> Result<Self> {
        let (host, port) = split_base_url(base_url)?;
        let client = Ollama::new(host, port);

        Ok(Self {
            client,
            model,
            embedding_model,
        })
    }
}

/// Split `http://host:port` into `("http://host", port)`.
fn split_base_url(base_url: &str) -> Result<(String, u16)> {
    let trimmed = base_url.trim_end_matches('/');
    let (scheme, rest) = trimmed.split_once("://").unwrap_or(("http", trimmed));
    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse().map_err(|_| {
                AppError::Configuration(format!("Invalid port in OLLAMA_URL '{}'", base_url))
            })?;
            (host, port)
        }
        None => (rest, DEFAULT_PORT),
    };

    if host.is_empty() {
        return Err(AppError::Configuration(format!(
            "Invalid OLLAMA_URL '{}'",
            base_url
        )));
    }
    Ok((format!("{}://{}", scheme, host), port))
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let messages = vec![ChatMessage::user(prompt.to_string())];
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let response = self
            .client
            .send_chat_messages(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let request = GenerateEmbeddingsRequest::new(
            self.embedding_model.clone(),
            EmbeddingsInput::Single(text.replace('\n', " ")),
        );

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| AppError::LLM(format!("Ollama embedding error: {}", e)))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| AppError::LLM("Ollama returned no embedding".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.embedding_model
    }
}
