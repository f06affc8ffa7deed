//! Retrieval Augmented Generation (RAG) Pipeline
//!
//! Answers questions about one user's indexed document.
//!
//! # Module Structure
//!
//! - [`rag::embeddings`](crate::rag::embeddings) - Query embedding trait
//! - [`rag::index`](crate::rag::index) - Index loading and similarity search
//! - [`rag::prompts`](crate::rag::prompts) - Prompt templates
//! - [`rag::chain`](crate::rag::chain) - The condense / retrieve / generate chain
//! - [`rag::extraction`](crate::rag::extraction) - Fixed extraction questions
//! - [`rag::pipeline`](crate::rag::pipeline) - Request orchestration
//!
//! # RAG Pipeline
//!
//! 1. **Fetch** - Both index artifacts are copied into private scratch space
//! 2. **Load** - Vectors go into an in-memory HNSW collection
//! 3. **Condense** - Follow-ups are rewritten using chat history (conversational only)
//! 4. **Retrieve** - The question is embedded and the top-k chunks returned
//! 5. **Generate** - The LLM answers from the concatenated chunks
//! 6. **Persist** - The turn is appended to history (conversational only)
//!
//! # Example
//!
//! ```ignore
//! use docqa::rag::pipeline::{QaMode, QaRequest};
//!
//! let output = pipeline
//!     .run(QaRequest {
//!         user_id: claims.sub,
//!         file_name: "intake.pdf".to_string(),
//!         mode: QaMode::Extraction,
//!     })
//!     .await?;
//! ```

pub mod chain;
pub mod embeddings;
pub mod extraction;
pub mod index;
pub mod pipeline;
pub mod prompts;

pub use pipeline::{QaMode, QaOutput, QaPipeline, QaRequest};
