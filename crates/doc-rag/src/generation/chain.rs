//! Retrieval-augmented answer chain

use std::sync::Arc;

use crate::error::Result;
use crate::providers::LlmProvider;
use crate::retrieval::VectorStoreManager;
use crate::types::response::{Citation, QueryResult};
use crate::types::ScoredChunk;

use super::citation::{build_citations, cited_pages};
use super::prompt::PromptBuilder;

/// Retrieves context for a question and asks the LLM for a cited answer
pub struct RagChain {
    retriever: Arc<VectorStoreManager>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl RagChain {
    pub fn new(
        retriever: Arc<VectorStoreManager>,
        llm: Arc<dyn LlmProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            llm,
            top_k,
        }
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Generate an answer from already retrieved chunks
    pub async fn answer(&self, question: &str, results: &[ScoredChunk]) -> Result<String> {
        let context = PromptBuilder::build_context(results);
        let prompt = PromptBuilder::build_rag_prompt(question, &context);

        tracing::debug!(
            "Generating with {} ({} context chunks, {} prompt chars)",
            self.llm.model(),
            results.len(),
            prompt.len()
        );

        self.llm.generate(&prompt).await
    }

    /// Deduplicated citations for retrieved chunks
    pub fn citations(&self, results: &[ScoredChunk]) -> Vec<Citation> {
        build_citations(results)
    }

    /// Answer a question over the whole collection
    pub async fn query(&self, question: &str) -> Result<QueryResult> {
        self.run(question, None).await
    }

    /// Answer a question using only chunks from `source`
    pub async fn query_filtered(&self, question: &str, source: &str) -> Result<QueryResult> {
        self.run(question, Some(source)).await
    }

    /// Retrieve, generate and cite; `source_filter` restricts retrieval to one file
    pub async fn run(&self, question: &str, source_filter: Option<&str>) -> Result<QueryResult> {
        let results = self
            .retriever
            .search(question, self.top_k, source_filter)
            .await?;

        let answer = self.answer(question, &results).await?;
        let sources = self.citations(&results);

        for (source, page) in cited_pages(&answer) {
            if !sources.iter().any(|c| c.source == source && c.page == page) {
                tracing::warn!(
                    "Answer cites {} page {} which was not among the retrieved chunks",
                    source,
                    page
                );
            }
        }

        Ok(QueryResult { answer, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalConfig;
    use crate::providers::LocalVectorStore;
    use crate::storage::ChunkCollection;
    use crate::testing::{KeywordEmbedder, ScriptedLlm};
    use crate::types::Chunk;
    use std::path::Path;

    async fn chain_with(llm: ScriptedLlm, chunks: Vec<Chunk>) -> RagChain {
        let store = LocalVectorStore::new(Arc::new(ChunkCollection::in_memory("test").unwrap()));
        let manager = VectorStoreManager::new(
            Arc::new(KeywordEmbedder::default()),
            Arc::new(store),
            RetrievalConfig::default(),
        );
        manager.add(chunks).await.unwrap();
        RagChain::new(Arc::new(manager), Arc::new(llm), 4)
    }

    #[tokio::test]
    async fn test_query_builds_prompt_and_citations() {
        let llm = ScriptedLlm::new("Twenty days [Source: handbook.pdf, Page: 2]");
        let chain = chain_with(
            llm.clone(),
            vec![
                Chunk::new(
                    "vacation allowance is twenty days".into(),
                    Path::new("handbook.pdf"),
                    2,
                    0,
                ),
                Chunk::new(
                    "expense reports are monthly".into(),
                    Path::new("handbook.pdf"),
                    5,
                    0,
                ),
            ],
        )
        .await;

        let result = chain.query("How many vacation days?").await.unwrap();
        assert_eq!(result.answer, "Twenty days [Source: handbook.pdf, Page: 2]");
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0].page, 2);

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0]
            .contains("vacation allowance is twenty days\n\nexpense reports are monthly"));
        assert!(prompts[0].contains("Question: How many vacation days?"));
    }

    #[tokio::test]
    async fn test_filtered_query_only_cites_source() {
        let chain = chain_with(
            ScriptedLlm::new("answer"),
            vec![
                Chunk::new("alpha report text".into(), Path::new("a.pdf"), 1, 0),
                Chunk::new("beta report text".into(), Path::new("b.pdf"), 1, 0),
                Chunk::new("beta appendix".into(), Path::new("b.pdf"), 4, 0),
            ],
        )
        .await;

        let result = chain.query_filtered("report", "b.pdf").await.unwrap();
        assert_eq!(result.sources.len(), 2);
        assert!(result.sources.iter().all(|c| c.source == "b.pdf"));
    }

    #[tokio::test]
    async fn test_empty_collection_still_answers() {
        let llm = ScriptedLlm::new("I don't know.");
        let chain = chain_with(llm.clone(), Vec::new()).await;

        let result = chain.query("Anything?").await.unwrap();
        assert_eq!(result.answer, "I don't know.");
        assert!(result.sources.is_empty());
        assert!(llm.prompts()[0].contains("Context:\n\n\nQuestion: Anything?"));
    }
}
