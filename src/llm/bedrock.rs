use crate::llm::client::LLMClient;
use crate::rag::embeddings::Embedder;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use aws_sdk_bedrockruntime::config::{BehaviorVersion, Region};
use aws_sdk_bedrockruntime::error::DisplayErrorContext;
use aws_sdk_bedrockruntime::primitives::Blob;
use aws_sdk_bedrockruntime::Client;
use serde_json::{json, Value};

/// `anthropic_version` required by the Bedrock messages API.
const ANTHROPIC_BEDROCK_VERSION: &str = "bedrock-2023-05-31";

/// Build a Bedrock runtime client for `region` from the default credential chain.
pub async fn runtime_client(region: &str) -> Client {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await;
    Client::new(&sdk_config)
}

async fn invoke_json(client: &Client, model_id: &str, body: &Value) -> Result<Value> {
    let payload = serde_json::to_vec(body)
        .map_err(|e| AppError::Internal(format!("Failed to encode Bedrock request: {}", e)))?;

    let output = client
        .invoke_model()
        .model_id(model_id)
        .content_type("application/json")
        .accept("application/json")
        .body(Blob::new(payload))
        .send()
        .await
        .map_err(|e| {
            AppError::LLM(format!(
                "Bedrock invoke_model failed for '{}': {}",
                model_id,
                DisplayErrorContext(&e)
            ))
        })?;

    serde_json::from_slice(output.body().as_ref()).map_err(|e| {
        AppError::LLM(format!(
            "Bedrock returned invalid JSON for '{}': {}",
            model_id, e
        ))
    })
}

/// Request/response shape of a text-generation model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompletionFormat {
    /// Claude v1/v2/instant: `\n\nHuman:`/`\n\nAssistant:` prompt
    AnthropicText,
    /// Claude 3 and later: messages API
    AnthropicMessages,
    /// Amazon Titan text models
    TitanText,
}

impl CompletionFormat {
    fn for_model(model_id: &str) -> Option<Self> {
        // Cross-region inference profiles prefix the id, e.g. "us.anthropic.claude-3..."
        if model_id.contains("anthropic.claude") {
            let legacy = ["claude-v1", "claude-v2", "claude-instant"];
            if legacy.iter().any(|m| model_id.contains(m)) {
                Some(CompletionFormat::AnthropicText)
            } else {
                Some(CompletionFormat::AnthropicMessages)
            }
        } else if model_id.contains("amazon.titan-text") {
            Some(CompletionFormat::TitanText)
        } else {
            None
        }
    }
}

/// Text generation through Bedrock `InvokeModel`.
pub struct BedrockLLM {
    client: Client,
    model: String,
    format: CompletionFormat,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl BedrockLLM {
    pub fn new(
        client: Client,
        model: String,
        max_tokens: u32,
        temperature: Option<f32>,
    ) -> Result<Self> {
        let format = CompletionFormat::for_model(&model).ok_or_else(|| {
            AppError::Configuration(format!("Unsupported Bedrock generation model '{}'", model))
        })?;
        Ok(Self {
            client,
            model,
            format,
            max_tokens,
            temperature,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        let mut body = match self.format {
            CompletionFormat::AnthropicText => json!({
                "prompt": anthropic_text_prompt(prompt),
                "max_tokens_to_sample": self.max_tokens,
            }),
            CompletionFormat::AnthropicMessages => json!({
                "anthropic_version": ANTHROPIC_BEDROCK_VERSION,
                "max_tokens": self.max_tokens,
                "messages": [{ "role": "user", "content": prompt }],
            }),
            CompletionFormat::TitanText => {
                let mut generation = json!({ "maxTokenCount": self.max_tokens });
                if let Some(t) = self.temperature {
                    generation["temperature"] = json!(t);
                }
                return json!({ "inputText": prompt, "textGenerationConfig": generation });
            }
        };
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        body
    }

    fn parse_completion(&self, response: &Value) -> Result<String> {
        let text = match self.format {
            CompletionFormat::AnthropicText => response["completion"].as_str().map(str::to_string),
            CompletionFormat::AnthropicMessages => response["content"].as_array().map(|blocks| {
                blocks
                    .iter()
                    .filter(|b| b["type"] == "text")
                    .filter_map(|b| b["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            }),
            CompletionFormat::TitanText => response["results"][0]["outputText"]
                .as_str()
                .map(str::to_string),
        };

        text.map(|t| t.trim().to_string()).ok_or_else(|| {
            AppError::LLM(format!(
                "Bedrock response for '{}' contained no completion",
                self.model
            ))
        })
    }
}

/// Wrap a prompt in the Human/Assistant turn markers legacy Claude models require.
fn anthropic_text_prompt(prompt: &str) -> String {
    if prompt.starts_with("\n\nHuman:") {
        prompt.to_string()
    } else {
        format!("\n\nHuman: {}\n\nAssistant:", prompt)
    }
}

#[async_trait]
impl LLMClient for BedrockLLM {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = self.request_body(prompt);
        let response = invoke_json(&self.client, &self.model, &body).await?;
        self.parse_completion(&response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmbeddingFormat {
    Titan,
    Cohere,
}

impl EmbeddingFormat {
    fn for_model(model_id: &str) -> Option<Self> {
        if model_id.contains("amazon.titan-embed") {
            Some(EmbeddingFormat::Titan)
        } else if model_id.contains("cohere.embed") {
            Some(EmbeddingFormat::Cohere)
        } else {
            None
        }
    }
}

/// Query embeddings through Bedrock `InvokeModel`.
pub struct BedrockEmbeddings {
    client: Client,
    model: String,
    format: EmbeddingFormat,
}

impl BedrockEmbeddings {
    pub fn new(client: Client, model: String) -> Result<Self> {
        let format = EmbeddingFormat::for_model(&model).ok_or_else(|| {
            AppError::Configuration(format!("Unsupported Bedrock embedding model '{}'", model))
        })?;
        Ok(Self {
            client,
            model,
            format,
        })
    }

    fn request_body(&self, text: &str) -> Value {
        // Newlines degrade embedding quality for these models
        let text = text.replace('\n', " ");
        match self.format {
            EmbeddingFormat::Titan => json!({ "inputText": text }),
            EmbeddingFormat::Cohere => json!({
                "texts": [text],
                "input_type": "search_query",
            }),
        }
    }

    fn parse_embedding(&self, response: &Value) -> Result<Vec<f32>> {
        let values = match self.format {
            EmbeddingFormat::Titan => response["embedding"].as_array(),
            EmbeddingFormat::Cohere => response["embeddings"][0].as_array(),
        }
        .ok_or_else(|| {
            AppError::LLM(format!(
                "Bedrock response for '{}' contained no embedding",
                self.model
            ))
        })?;

        values
            .iter()
            .map(|v| {
                v.as_f64().map(|x| x as f32).ok_or_else(|| {
                    AppError::LLM(format!("Non-numeric embedding value from '{}'", self.model))
                })
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for BedrockEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let body = self.request_body(text);
        let response = invoke_json(&self.client, &self.model, &body).await?;
        self.parse_embedding(&response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
