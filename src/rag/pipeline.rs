use super::chain::RetrievalQa;
use super::extraction::{ExtractionBuilder, ExtractionField};
use super::index::{DocumentIndex, Retriever};
use super::prompts::{CONVERSATIONAL_QA_PROMPT, EXTRACTION_QA_PROMPT};
use crate::llm::ModelClients;
use crate::memory::{ConversationStore, Turn};
use crate::storage::IndexFetcher;
use crate::types::{AppError, ExtractionResponse, Result, SourceDocument, SourcedAnswer};
use std::sync::Arc;
use std::time::Instant;

/// What a request asks of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QaMode {
    /// Answer every [`ExtractionField`] with no history.
    Extraction,
    /// Answer one question in the context of a stored conversation.
    Conversational {
        conversation_id: String,
        question: String,
        include_sources: bool,
    },
}

impl QaMode {
    pub fn name(&self) -> &'static str {
        match self {
            QaMode::Extraction => "extraction",
            QaMode::Conversational { .. } => "conversational",
        }
    }
}

/// One question-answering request against one user's document.
#[derive(Debug, Clone)]
pub struct QaRequest {
    pub user_id: String,
    pub file_name: String,
    pub mode: QaMode,
}

#[derive(Debug, Clone)]
pub enum QaOutput {
    Extraction(ExtractionResponse),
    Answer(String),
    Sourced(SourcedAnswer),
}

/// Fetch, load, then run the retrieval QA chain in the requested mode.
pub struct QaPipeline {
    fetcher: IndexFetcher,
    clients: ModelClients,
    history: Option<Arc<dyn ConversationStore>>,
    top_k: usize,
}

impl QaPipeline {
    pub fn new(
        fetcher: IndexFetcher,
        clients: ModelClients,
        history: Option<Arc<dyn ConversationStore>>,
        top_k: usize,
    ) -> Self {
        Self {
            fetcher,
            clients,
            history,
            top_k,
        }
    }

    pub async fn run(&self, request: QaRequest) -> Result<QaOutput> {
        let start = Instant::now();
        let QaRequest {
            user_id,
            file_name,
            mode,
        } = request;

        // Reject unusable requests before any I/O
        if let QaMode::Conversational {
            conversation_id,
            question,
            ..
        } = &mode
        {
            if conversation_id.trim().is_empty() {
                return Err(AppError::InvalidInput(
                    "conversationid must not be empty".to_string(),
                ));
            }
            if question.trim().is_empty() {
                return Err(AppError::InvalidInput("prompt must not be empty".to_string()));
            }
            self.conversation_store()?;
        }

        let chain = self.load_chain(&user_id, &file_name, &mode).await?;

        let output = match mode {
            QaMode::Extraction => {
                let mut builder = ExtractionBuilder::default();
                for field in ExtractionField::ALL {
                    let outcome = chain.ask(field.question(), &[]).await?;
                    tracing::debug!(field = field.key(), "Extracted field");
                    builder.set(field, outcome.answer);
                }
                let response = builder.build().map_err(|field| {
                    AppError::Internal(format!("Extraction field '{}' missing", field.key()))
                })?;
                QaOutput::Extraction(response)
            }
            QaMode::Conversational {
                conversation_id,
                question,
                include_sources,
            } => {
                let store = self.conversation_store()?;
                let history = store.load(&conversation_id).await?;
                let outcome = chain.ask(&question, &history).await?;

                store
                    .append(&conversation_id, Turn::new(question, outcome.answer.clone()))
                    .await?;

                tracing::info!(
                    conversation_id = %conversation_id,
                    prior_turns = history.len(),
                    answer_len = outcome.answer.len(),
                    sources = outcome.sources.len(),
                    store = store.provider_name(),
                    "Appended conversation turn"
                );

                if include_sources {
                    QaOutput::Sourced(SourcedAnswer {
                        answer: outcome.answer,
                        source_documents: outcome
                            .sources
                            .into_iter()
                            .map(SourceDocument::from)
                            .collect(),
                    })
                } else {
                    QaOutput::Answer(outcome.answer)
                }
            }
        };

        tracing::info!(
            user_id = %user_id,
            file_name = %file_name,
            duration_ms = start.elapsed().as_millis() as u64,
            "QA request completed"
        );

        Ok(output)
    }

    fn conversation_store(&self) -> Result<Arc<dyn ConversationStore>> {
        self.history.clone().ok_or_else(|| {
            AppError::Configuration(
                "MEMORY_TABLE must be set for conversational requests".to_string(),
            )
        })
    }

    async fn load_chain(
        &self,
        user_id: &str,
        file_name: &str,
        mode: &QaMode,
    ) -> Result<RetrievalQa> {
        let fetched = self.fetcher.fetch(user_id, file_name).await?;
        let index = DocumentIndex::load(&fetched).await?;
        // Scratch files are not needed once the index is in memory
        drop(fetched);

        tracing::info!(
            mode = mode.name(),
            chunks = index.len(),
            dimensions = index.dimensions(),
            "Document index ready"
        );

        let retriever = Retriever::new(index, self.clients.embedder.clone(), self.top_k);
        let template = match mode {
            QaMode::Extraction => EXTRACTION_QA_PROMPT,
            QaMode::Conversational { .. } => CONVERSATIONAL_QA_PROMPT,
        };
        Ok(RetrievalQa::new(self.clients.llm.clone(), retriever, template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::MockLLMClient;
    use crate::memory::MockConversationStore;
    use crate::rag::embeddings::MockEmbedder;
    use crate::storage::MockObjectStore;
    use bytes::Bytes;

    const VECTORS: &[u8] = br#"{"dimensions": 2, "ids": ["c0"], "vectors": [[1.0, 0.0]]}"#;
    const DOCSTORE: &[u8] = br#"{"c0": {"page_content": "Patient: Jane Doe"}}"#;

    fn index_store() -> MockObjectStore {
        let mut store = MockObjectStore::new();
        store.expect_provider_name().return_const("mock");
        store.expect_get_object().times(2).returning(|_, key| {
            if key.ends_with(".faiss") {
                Ok(Bytes::from_static(VECTORS))
            } else {
                Ok(Bytes::from_static(DOCSTORE))
            }
        });
        store
    }

    fn pipeline(
        llm: MockLLMClient,
        embedder: MockEmbedder,
        history: MockConversationStore,
        scratch: &std::path::Path,
    ) -> QaPipeline {
        let fetcher = IndexFetcher::new(
            Arc::new(index_store()),
            "docs".to_string(),
            scratch.to_path_buf(),
        );
        let clients = ModelClients {
            llm: Arc::new(llm),
            embedder: Arc::new(embedder),
        };
        QaPipeline::new(fetcher, clients, Some(Arc::new(history)), 4)
    }

    fn request(question: &str) -> QaRequest {
        QaRequest {
            user_id: "user-1".to_string(),
            file_name: "intake.pdf".to_string(),
            mode: QaMode::Conversational {
                conversation_id: "conv-1".to_string(),
                question: question.to_string(),
                include_sources: false,
            },
        }
    }

    #[tokio::test]
    async fn test_history_read_failure_appends_nothing() {
        let scratch = tempfile::tempdir().unwrap();
        let mut llm = MockLLMClient::new();
        llm.expect_generate().never();
        let mut embedder = MockEmbedder::new();
        embedder.expect_embed_query().never();

        let mut history = MockConversationStore::new();
        history
            .expect_load()
            .withf(|id| id.to_string() == "conv-1")
            .times(1)
            .returning(|_| Err(AppError::Storage("table unavailable".to_string())));
        history.expect_append().never();

        let err = pipeline(llm, embedder, history, scratch.path())
            .run(request("Who is the patient?"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
    }

    #[tokio::test]
    async fn test_history_write_failure_fails_request() {
        let scratch = tempfile::tempdir().unwrap();
        let mut llm = MockLLMClient::new();
        llm.expect_generate()
            .times(1)
            .returning(|_| Ok("Jane Doe".to_string()));
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed_query()
            .times(1)
            .returning(|_| Ok(vec![1.0, 0.0]));

        let mut history = MockConversationStore::new();
        history.expect_load().times(1).returning(|_| Ok(Vec::new()));
        history
            .expect_append()
            .withf(|id, turn| {
                id.to_string() == "conv-1" && *turn == Turn::new("Who is the patient?", "Jane Doe")
            })
            .times(1)
            .returning(|_, _| Err(AppError::Storage("conditional check failed".to_string())));

        let err = pipeline(llm, embedder, history, scratch.path())
            .run(request("Who is the patient?"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
    }
}
