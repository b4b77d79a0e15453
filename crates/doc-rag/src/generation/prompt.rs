//! Prompt templates for RAG generation

use crate::types::ScoredChunk;

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunk contents with blank lines, in retrieval order
    pub fn build_context(results: &[ScoredChunk]) -> String {
        results
            .iter()
            .map(|r| r.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the full RAG prompt around a context block
    pub fn build_rag_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are an AI assistant helping users understand their documents. Use the following pieces of context to answer the question at the end. If you don't know the answer based on the context, just say that you don't know, don't try to make up an answer. Always cite the source document and page number when providing information.

Context:
{context}

Question: {question}

Provide a detailed answer with citations in the format [Source: filename, Page: X]:"#,
            context = context,
            question = question
        )
    }
}
