//! In-memory document index loaded from fetched artifacts.
//!
//! The vector artifact is JSON of the form
//!
//! ```json
//! { "dimensions": 3, "ids": ["c0", "c1"], "vectors": [[0.1, 0.2, 0.3], [0.3, 0.2, 0.1]] }
//! ```
//!
//! and the docstore maps each id to `{ "page_content": "...", "metadata": {...} }`.
//! Vectors are loaded into an [`ares_vector`] HNSW collection for the
//! lifetime of one request.

use super::embeddings::Embedder;
use crate::storage::FetchedIndex;
use crate::types::{AppError, Result, SourceDocument};
use ares_vector::{Config, DistanceMetric, VectorDb};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

const COLLECTION: &str = "chunks";

#[derive(Debug, Deserialize)]
struct VectorFile {
    dimensions: usize,
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

/// One chunk of the source document as stored in the docstore.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredChunk {
    pub page_content: String,
    #[serde(default)]
    pub metadata: Value,
}

/// A chunk returned by similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub id: String,
    pub content: String,
    pub metadata: Value,
    pub score: f32,
}

impl From<RetrievedChunk> for SourceDocument {
    fn from(chunk: RetrievedChunk) -> Self {
        SourceDocument {
            content: chunk.content,
            metadata: chunk.metadata,
            score: chunk.score,
        }
    }
}

/// Similarity index over the chunks of one document.
pub struct DocumentIndex {
    db: VectorDb,
    dimensions: usize,
    chunks: HashMap<String, StoredChunk>,
}

impl DocumentIndex {
    /// Load both artifacts of a fetched index.
    pub async fn load(fetched: &FetchedIndex) -> Result<Self> {
        let vectors: VectorFile = read_json(fetched.vector_index_path()).await?;
        let chunks: HashMap<String, StoredChunk> = read_json(fetched.docstore_path()).await?;
        Self::build(vectors, chunks).await
    }

    /// Build an index from chunk embeddings and their docstore entries.
    pub async fn from_parts(
        dimensions: usize,
        entries: Vec<(String, Vec<f32>, StoredChunk)>,
    ) -> Result<Self> {
        let mut ids = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len());
        let mut chunks = HashMap::with_capacity(entries.len());
        for (id, vector, chunk) in entries {
            ids.push(id.clone());
            vectors.push(vector);
            chunks.insert(id, chunk);
        }
        Self::build(
            VectorFile {
                dimensions,
                ids,
                vectors,
            },
            chunks,
        )
        .await
    }

    async fn build(file: VectorFile, chunks: HashMap<String, StoredChunk>) -> Result<Self> {
        if file.dimensions == 0 {
            return Err(AppError::Index("Index dimensions must be positive".to_string()));
        }
        if file.ids.len() != file.vectors.len() {
            return Err(AppError::Index(format!(
                "Index has {} ids but {} vectors",
                file.ids.len(),
                file.vectors.len()
            )));
        }

        let db = VectorDb::open(Config::memory())
            .await
            .map_err(|e| AppError::Index(format!("Failed to open vector index: {}", e)))?;
        db.create_collection(COLLECTION, file.dimensions, DistanceMetric::Cosine)
            .await
            .map_err(|e| AppError::Index(format!("Failed to create collection: {}", e)))?;

        let mut seen = HashSet::with_capacity(file.ids.len());
        for (id, vector) in file.ids.iter().zip(&file.vectors) {
            if !seen.insert(id.as_str()) {
                return Err(AppError::Index(format!("Vector id '{}' appears more than once", id)));
            }
            if vector.len() != file.dimensions {
                return Err(AppError::Index(format!(
                    "Vector '{}' has {} dimensions, expected {}",
                    id,
                    vector.len(),
                    file.dimensions
                )));
            }
            if !chunks.contains_key(id) {
                return Err(AppError::Index(format!(
                    "Vector '{}' has no docstore entry",
                    id
                )));
            }
            db.insert(COLLECTION, id, vector, None)
                .await
                .map_err(|e| AppError::Index(format!("Failed to insert '{}': {}", id, e)))?;
        }

        tracing::debug!(
            chunks = file.ids.len(),
            dimensions = file.dimensions,
            "Loaded document index"
        );

        Ok(Self {
            db,
            dimensions: file.dimensions,
            chunks,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Up to `k` chunks most similar to `embedding`, best first.
    pub async fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if embedding.len() != self.dimensions {
            return Err(AppError::Index(format!(
                "Query embedding has {} dimensions but the index has {}",
                embedding.len(),
                self.dimensions
            )));
        }
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let hits = self
            .db
            .search(COLLECTION, embedding, k)
            .await
            .map_err(|e| AppError::Index(format!("Search failed: {}", e)))?;

        let mut results: Vec<RetrievedChunk> = hits
            .into_iter()
            .filter_map(|hit| {
                self.chunks.get(&hit.id).map(|chunk| RetrievedChunk {
                    id: hit.id.clone(),
                    content: chunk.page_content.clone(),
                    metadata: chunk.metadata.clone(),
                    score: hit.score,
                })
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);
        Ok(results)
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Index(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_slice(&data)
        .map_err(|e| AppError::Index(format!("Malformed index file {}: {}", path.display(), e)))
}

/// Embeds a question and returns the top-k chunks of one document.
pub struct Retriever {
    index: DocumentIndex,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl Retriever {
    pub fn new(index: DocumentIndex, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }

    pub async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>> {
        let embedding = self.embedder.embed_query(question).await?;
        self.index.search(&embedding, self.top_k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::embeddings::MockEmbedder;
    use serde_json::json;

    fn chunk(text: &str) -> StoredChunk {
        StoredChunk {
            page_content: text.to_string(),
            metadata: json!({ "page": 1 }),
        }
    }

    async fn sample_index() -> DocumentIndex {
        DocumentIndex::from_parts(
            3,
            vec![
                ("age".to_string(), vec![1.0, 0.0, 0.0], chunk("Patient is 42 years old.")),
                ("meds".to_string(), vec![0.0, 1.0, 0.0], chunk("Takes ibuprofen 200mg.")),
                ("injury".to_string(), vec![0.0, 0.0, 1.0], chunk("Fractured left wrist.")),
            ],
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_closest_first() {
        let index = sample_index().await;
        let results = index.search(&[0.1, 0.9, 0.0], 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "meds");
        assert_eq!(results[0].content, "Takes ibuprofen 200mg.");
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_search_k_larger_than_index() {
        let index = sample_index().await;
        let results = index.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "age");
    }

    #[tokio::test]
    async fn test_search_rejects_dimension_mismatch() {
        let index = sample_index().await;
        let err = index.search(&[1.0, 0.0], 2).await.unwrap_err();
        assert!(matches!(err, AppError::Index(_)));
    }

    #[tokio::test]
    async fn test_empty_index_returns_no_chunks() {
        let index = DocumentIndex::from_parts(3, Vec::new()).await.unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0, 0.0], 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_rejects_missing_docstore_entry() {
        let file = VectorFile {
            dimensions: 2,
            ids: vec!["orphan".to_string()],
            vectors: vec![vec![1.0, 0.0]],
        };
        let err = DocumentIndex::build(file, HashMap::new()).await.err().unwrap();
        assert!(err.to_string().contains("no docstore entry"));
    }

    #[tokio::test]
    async fn test_build_rejects_repeated_id() {
        let file = VectorFile {
            dimensions: 2,
            ids: vec!["a".to_string(), "a".to_string(), "b".to_string()],
            vectors: vec![vec![1.0, 0.0], vec![0.9, 0.1], vec![0.0, 1.0]],
        };
        let chunks = HashMap::from([
            ("a".to_string(), chunk("first")),
            ("b".to_string(), chunk("second")),
        ]);

        let err = DocumentIndex::build(file, chunks).await.err().unwrap();
        assert!(matches!(err, AppError::Index(_)));
        assert!(err.to_string().contains("'a' appears more than once"));
    }

    #[tokio::test]
    async fn test_build_rejects_wrong_vector_length() {
        let err = DocumentIndex::from_parts(3, vec![("a".to_string(), vec![1.0], chunk("x"))])
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Index(_)));
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.faiss");
        std::fs::write(&path, b"\x00\x01binary").unwrap();

        let err = read_json::<VectorFile>(&path).await.unwrap_err();
        assert!(err.to_string().contains("Malformed index file"));
    }

    #[tokio::test]
    async fn test_retriever_embeds_question() {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed_query()
            .withf(|text| text.to_string() == "What injury?")
            .times(1)
            .returning(|_| Ok(vec![0.0, 0.0, 1.0]));

        let retriever = Retriever::new(sample_index().await, Arc::new(embedder), 1);
        let chunks = retriever.retrieve("What injury?").await.unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Fractured left wrist.");
        assert_eq!(chunks[0].metadata, json!({ "page": 1 }));
    }
}
