//! LLM Provider Clients and Abstractions
//!
//! Provider-specific adapters live behind two traits:
//! - [`LLMClient`] - text generation
//! - [`Embedder`](crate::rag::embeddings::Embedder) - query embeddings
//!
//! [`LLMClientFactory`] builds both from [`LLMConfig`](crate::utils::config::LLMConfig)
//! once per process; request handlers only ever see the trait objects.
//!
//! # Supported Providers
//!
//! - Amazon Bedrock (always compiled)
//! - `ollama` - Local Ollama server, for development without AWS credentials

/// Core LLM client trait and provider selection.
pub mod client;
/// Bedrock runtime adapters.
pub mod bedrock;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{LLMClient, LLMClientFactory, ModelClients, Provider};
