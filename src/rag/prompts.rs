//! Prompt templates for the retrieval QA chain.
//!
//! Templates use `{name}` placeholders filled by [`render`].

use crate::memory::Turn;

/// Rewrites a follow-up into a standalone question.
pub const CONDENSE_QUESTION_PROMPT: &str = "Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question, in its original language.\n\nChat History:\n{chat_history}\nFollow Up Input: {question}\nStandalone question:";

/// Answers a conversational question from retrieved context.
pub const CONVERSATIONAL_QA_PROMPT: &str = "Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.\n\n{context}\n\nQuestion: {question}\nHelpful Answer:";

/// Answers one extraction question from retrieved context.
pub const EXTRACTION_QA_PROMPT: &str = "Use the following pieces of context from a medical record to answer the question at the end.\nGive the shortest answer that fully answers the question, with no extra explanation.\nIf the context does not contain the answer, reply \"Don't know\". Never make up an answer.\nWhen the question asks for JSON, reply with JSON that can be parsed as-is, using descriptive keys.\n\n{context}\n\nQuestion: {question}\nAnswer:";

/// Separator between retrieved chunks in `{context}`.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Fill `{name}` placeholders in a single pass.
///
/// Substituted values are not rescanned, so a chunk that happens to contain
/// `{question}` stays as written. Unknown placeholders are left untouched.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let extra: usize = vars.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replaced = after.find('}').and_then(|end| {
            let name = &after[..end];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });

        match replaced {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Chat history as `Human:`/`Assistant:` lines, oldest first.
///
/// Turns are joined by a single newline; a blank line before `Human:` would
/// read as a turn boundary to Claude text models.
pub fn format_history(turns: &[Turn]) -> String {
    turns
        .iter()
        .map(|turn| format!("Human: {}\nAssistant: {}", turn.question, turn.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn condense_prompt(history: &[Turn], question: &str) -> String {
    let chat_history = format_history(history);
    render(
        CONDENSE_QUESTION_PROMPT,
        &[("chat_history", chat_history.as_str()), ("question", question)],
    )
}

pub fn qa_prompt(template: &str, context: &str, question: &str) -> String {
    render(template, &[("context", context), ("question", question)])
}
