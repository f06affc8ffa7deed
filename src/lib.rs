//! # docqa - Document Question Answering Server
//!
//! Answers questions about a user's previously indexed document: a fixed
//! set of patient fields for extraction, or free-form questions inside a
//! persisted conversation. Retrieval runs against a per-user index fetched
//! from object storage; answers come from a hosted LLM.
//!
//! ## Overview
//!
//! docqa can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `docqa-server` binary
//! 2. **As a library** - Build an [`AppState`] and mount [`api::routes::create_router`]
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use docqa::{AppState, utils::config::Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let state = AppState::from_config(config).await?;
//!     let app = docqa::api::routes::create_router(state);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference instead of Bedrock |
//! | `lambda` | Run under AWS Lambda behind API Gateway |
//!
//! ## Modules
//!
//! - [`api`] - REST API handlers and routes
//! - [`auth`] - Principal resolution
//! - [`llm`] - LLM client implementations
//! - [`memory`] - Conversation history stores
//! - [`rag`] - Index loading, retrieval and the QA chain
//! - [`storage`] - Object stores and the index fetcher
//! - [`types`] - Common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// HTTP API handlers and routes.
pub mod api;
/// Principal resolution and middleware.
pub mod auth;
/// LLM provider clients and abstractions.
pub mod llm;
/// Conversation history.
pub mod memory;
/// Retrieval Augmented Generation (RAG) components.
pub mod rag;
/// Object storage and index fetching.
pub mod storage;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{LLMClient, LLMClientFactory, ModelClients, Provider};
pub use rag::{QaMode, QaOutput, QaPipeline, QaRequest};
pub use types::{AppError, Result};

use crate::auth::jwt::AuthService;
use crate::memory::{ConversationStore, DynamoConversationStore, InMemoryConversationStore};
use crate::storage::{IndexFetcher, LocalObjectStore, ObjectStore, S3ObjectStore};
use crate::utils::config::{Config, HistoryStoreKind, ObjectStoreKind};
use aws_config::BehaviorVersion;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Startup configuration
    pub config: Arc<Config>,
    /// Fetch / load / answer pipeline, holding the process-wide clients
    pub pipeline: Arc<QaPipeline>,
    /// Authentication service
    pub auth_service: Arc<AuthService>,
}

impl AppState {
    pub fn new(config: Config, pipeline: QaPipeline, auth_service: AuthService) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
            auth_service: Arc::new(auth_service),
        }
    }

    /// Build every backend named by `config`. Clients are created once here
    /// and shared by all requests.
    pub async fn from_config(config: Config) -> Result<Self> {
        let uses_s3 = config.storage.backend == ObjectStoreKind::S3;
        let uses_dynamodb = config.history.backend == HistoryStoreKind::DynamoDb
            && config.history.memory_table.is_some();

        let sdk_config = if uses_s3 || uses_dynamodb {
            Some(aws_config::defaults(BehaviorVersion::latest()).load().await)
        } else {
            None
        };

        let object_store: Arc<dyn ObjectStore> = match (&config.storage.backend, &sdk_config) {
            (ObjectStoreKind::S3, Some(sdk)) => Arc::new(S3ObjectStore::from_sdk_config(sdk)),
            (ObjectStoreKind::Local { root }, _) => Arc::new(LocalObjectStore::new(root.clone())),
            (ObjectStoreKind::S3, None) => {
                return Err(AppError::Internal("AWS configuration was not loaded".to_string()));
            }
        };

        let history: Option<Arc<dyn ConversationStore>> = match config.history.backend {
            HistoryStoreKind::Memory => Some(Arc::new(InMemoryConversationStore::new())),
            HistoryStoreKind::DynamoDb => match (&config.history.memory_table, &sdk_config) {
                (Some(table), Some(sdk)) => Some(Arc::new(DynamoConversationStore::from_sdk_config(
                    sdk,
                    table.clone(),
                ))),
                _ => {
                    tracing::warn!("MEMORY_TABLE is not set; conversational requests will fail");
                    None
                }
            },
        };

        let clients = LLMClientFactory::from_config(&config.llm)?
            .create_clients()
            .await?;

        let auth_service = AuthService::new(config.auth.jwt_secret.clone());

        tracing::info!(
            bucket = %config.storage.bucket,
            object_store = object_store.provider_name(),
            history_store = history.as_ref().map(|h| h.provider_name()).unwrap_or("none"),
            top_k = config.rag.top_k,
            verify_jwt_signatures = auth_service.verifies_signatures(),
            "Application state initialized"
        );

        let fetcher = IndexFetcher::new(
            object_store,
            config.storage.bucket.clone(),
            config.storage.scratch_dir.clone(),
        );
        let pipeline = QaPipeline::new(fetcher, clients, history, config.rag.top_k);

        Ok(Self::new(config, pipeline, auth_service))
    }
}
