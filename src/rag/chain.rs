use super::index::{RetrievedChunk, Retriever};
use super::prompts::{self, CONTEXT_SEPARATOR};
use crate::llm::LLMClient;
use crate::memory::Turn;
use crate::types::Result;
use std::sync::Arc;
use tracing::instrument;

/// Result of one pass through the chain.
#[derive(Debug, Clone)]
pub struct QaOutcome {
    pub answer: String,
    /// Question used for retrieval and generation, after condensing.
    pub standalone_question: String,
    pub sources: Vec<RetrievedChunk>,
}

/// Condense, retrieve, generate.
///
/// Shared by the extraction and conversational modes; only the answer
/// template and the history differ between them.
pub struct RetrievalQa {
    llm: Arc<dyn LLMClient>,
    retriever: Retriever,
    template: &'static str,
}

impl RetrievalQa {
    pub fn new(llm: Arc<dyn LLMClient>, retriever: Retriever, template: &'static str) -> Self {
        Self {
            llm,
            retriever,
            template,
        }
    }

    /// Answer `question` against the document, given prior turns.
    ///
    /// With empty history the question is used as-is and the model is
    /// invoked exactly once.
    #[instrument(skip(self, question, history), fields(history_turns = history.len()))]
    pub async fn ask(&self, question: &str, history: &[Turn]) -> Result<QaOutcome> {
        let standalone_question = if history.is_empty() {
            question.to_string()
        } else {
            let condensed = self
                .llm
                .generate(&prompts::condense_prompt(history, question))
                .await?;
            tracing::debug!(standalone_question = %condensed, "Condensed follow-up question");
            condensed
        };

        let sources = self.retriever.retrieve(&standalone_question).await?;
        let context = sources
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        let prompt = prompts::qa_prompt(self.template, &context, &standalone_question);
        let answer = self.llm.generate(&prompt).await?;

        tracing::debug!(chunks = sources.len(), "Generated answer");

        Ok(QaOutcome {
            answer,
            standalone_question,
            sources,
        })
    }
}
