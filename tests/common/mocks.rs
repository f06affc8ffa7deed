//! Mock implementations for testing.
//!
//! Hand-written doubles for the model clients and the object store, plus
//! fixture builders for document indexes. Every double can write to a shared
//! [`CallLog`] so tests can assert on call order across components.

use async_trait::async_trait;
use bytes::Bytes;
use docqa::{
    llm::{LLMClient, ModelClients},
    memory::ConversationStore,
    rag::embeddings::Embedder,
    storage::{IndexFetcher, ObjectStore},
    types::{AppError, Result},
    QaPipeline,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

pub const BUCKET: &str = "docs";
pub const EMBEDDING_DIMS: usize = 4;

/// Ordered record of calls made to the doubles.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Number of entries starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.0.lock().iter().filter(|e| e.starts_with(prefix)).count()
    }

    /// Index of the first entry starting with `prefix`.
    pub fn first(&self, prefix: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e.starts_with(prefix))
    }
}

/// LLM that answers according to the question in its prompt.
///
/// The text after the last `Question: ` is matched against the scripted
/// substrings; the first match wins. Condense prompts are answered with
/// `condensed` when set, otherwise with the follow-up question unchanged.
#[derive(Clone)]
pub struct ScriptedLLM {
    answers: Vec<(String, String)>,
    fallback: String,
    condensed: Option<String>,
    should_fail: bool,
    prompts: Arc<Mutex<Vec<String>>>,
    log: CallLog,
}

impl ScriptedLLM {
    pub fn new(log: CallLog) -> Self {
        Self {
            answers: Vec::new(),
            fallback: "Don't know".to_string(),
            condensed: None,
            should_fail: false,
            prompts: Arc::new(Mutex::new(Vec::new())),
            log,
        }
    }

    pub fn answer(mut self, question_contains: &str, reply: &str) -> Self {
        self.answers
            .push((question_contains.to_string(), reply.to_string()));
        self
    }

    pub fn fallback(mut self, reply: &str) -> Self {
        self.fallback = reply.to_string();
        self
    }

    pub fn condense_to(mut self, standalone: &str) -> Self {
        self.condensed = Some(standalone.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Every prompt received, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn condense_prompts(&self) -> Vec<String> {
        self.prompts()
            .into_iter()
            .filter(|p| is_condense_prompt(p))
            .collect()
    }
}

pub fn is_condense_prompt(prompt: &str) -> bool {
    prompt.trim_end().ends_with("Standalone question:")
}

#[async_trait]
impl LLMClient for ScriptedLLM {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        self.log.push("llm:generate");

        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }

        if is_condense_prompt(prompt) {
            let follow_up = prompt
                .rsplit("Follow Up Input: ")
                .next()
                .and_then(|rest| rest.split('\n').next())
                .unwrap_or_default();
            return Ok(self
                .condensed
                .clone()
                .unwrap_or_else(|| follow_up.to_string()));
        }

        let question = prompt.rsplit("Question: ").next().unwrap_or(prompt);
        Ok(self
            .answers
            .iter()
            .find(|(needle, _)| question.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.fallback.clone()))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Deterministic embedder: the same text always maps to the same vector.
#[derive(Clone)]
pub struct HashEmbedder {
    log: CallLog,
}

impl HashEmbedder {
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

/// The vector [`HashEmbedder`] produces for `text`.
pub fn embed_text(text: &str) -> Vec<f32> {
    let mut vector = vec![1.0f32; EMBEDDING_DIMS];
    for (i, byte) in text.bytes().enumerate() {
        vector[1 + i % (EMBEDDING_DIMS - 1)] += f32::from(byte % 17) / 17.0;
    }
    vector
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.log.push("embed:query");
        Ok(embed_text(text))
    }

    fn model_name(&self) -> &str {
        "hash"
    }
}

/// Object store over a map of `(bucket, key)` to bytes.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<Mutex<HashMap<(String, String), Bytes>>>,
    log: CallLog,
}

impl MemoryObjectStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            objects: Arc::default(),
            log,
        }
    }

    pub fn put(&self, bucket: &str, key: &str, data: impl Into<Bytes>) {
        self.objects
            .lock()
            .insert((bucket.to_string(), key.to_string()), data.into());
    }

    /// Store both artifacts of an index over `chunks`.
    pub fn put_index(&self, user_id: &str, file_name: &str, chunks: &[&str]) {
        let (vectors, docstore) = index_fixture(chunks);
        self.put(BUCKET, &format!("{}/{}/index.faiss", user_id, file_name), vectors);
        self.put(BUCKET, &format!("{}/{}/index.pkl", user_id, file_name), docstore);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    fn provider_name(&self) -> &'static str {
        "memory"
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        self.log.push(format!("store:get {}", key));
        self.objects
            .lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| AppError::IndexNotFound(format!("{}/{}", bucket, key)))
    }
}

/// Vector and docstore artifacts for `chunks`, embedded with [`embed_text`].
pub fn index_fixture(chunks: &[&str]) -> (Vec<u8>, Vec<u8>) {
    let ids: Vec<String> = (0..chunks.len()).map(|i| format!("chunk-{}", i)).collect();
    let vectors: Vec<Vec<f32>> = chunks.iter().map(|c| embed_text(c)).collect();
    let docstore: serde_json::Map<String, serde_json::Value> = ids
        .iter()
        .zip(chunks)
        .enumerate()
        .map(|(page, (id, content))| {
            (
                id.clone(),
                json!({ "page_content": content, "metadata": { "page": page } }),
            )
        })
        .collect();

    let vector_file = json!({
        "dimensions": EMBEDDING_DIMS,
        "ids": ids,
        "vectors": vectors,
    });

    (
        serde_json::to_vec(&vector_file).unwrap(),
        serde_json::to_vec(&docstore).unwrap(),
    )
}

/// Chunks of a short patient intake form. None of them contain the
/// phrases the scripted LLM matches on.
pub const INTAKE_CHUNKS: [&str; 4] = [
    "Patient: Jane Doe. DOB 1981-02-03.",
    "Current prescriptions: ibuprofen 200mg twice daily.",
    "Previously prescribed amoxicillin 500mg in 2019.",
    "Assessment: distal radius fracture, left wrist.",
];

/// Pipeline over the doubles with a fresh scratch directory.
pub fn pipeline(
    store: MemoryObjectStore,
    llm: ScriptedLLM,
    log: &CallLog,
    history: Option<Arc<dyn ConversationStore>>,
    scratch: &Path,
) -> QaPipeline {
    let fetcher = IndexFetcher::new(Arc::new(store), BUCKET.to_string(), scratch.to_path_buf());
    let clients = ModelClients {
        llm: Arc::new(llm),
        embedder: Arc::new(HashEmbedder::new(log.clone())),
    };
    QaPipeline::new(fetcher, clients, history, 4)
}
