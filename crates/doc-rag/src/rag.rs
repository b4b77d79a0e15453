//! Document RAG session: upload, query, bookkeeping and reset
//!
//! The collection is the source of truth. On construction the session
//! rebuilds its document list from the collection manifest, so records survive
//! a restart as long as the persist directory does.

use chrono::Utc;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::{BackendProvider, RagConfig};
use crate::error::{Error, Result};
use crate::generation::RagChain;
use crate::ingestion::DocumentProcessor;
use crate::providers::{
    ollama_providers, openai_providers, EmbeddingProvider, LlmProvider, LocalVectorStore,
    VectorStoreProvider,
};
use crate::retrieval::VectorStoreManager;
use crate::storage::ManifestEntry;
use crate::types::document::source_label;
use crate::types::{
    CollectionStats, HealthReport, QueryOutcome, ResetOutcome, UploadOutcome, UploadedDocument,
};

/// One document collection with its processing and answering pipeline
pub struct DocumentRag {
    config: RagConfig,
    processor: DocumentProcessor,
    retriever: Arc<VectorStoreManager>,
    chain: RagChain,
    /// Serialises store mutations in upload and reset
    writer: Mutex<()>,
    /// Uploaded documents, only locked briefly so reads never wait on a backend
    documents: RwLock<Vec<UploadedDocument>>,
}

impl DocumentRag {
    /// Build providers for the configured backend and open the collection
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing document RAG (backend: {:?})", config.backend);

        let (embedder, llm): (Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>) =
            match config.backend {
                BackendProvider::Ollama => {
                    let (embedder, llm) = ollama_providers(&config.ollama, &config.llm)?;
                    tracing::info!(
                        "Using Ollama at {} (embed: {}, generate: {})",
                        config.ollama.base_url,
                        config.ollama.embed_model,
                        config.ollama.generate_model
                    );
                    (Arc::new(embedder), Arc::new(llm))
                }
                BackendProvider::OpenAi => {
                    let (embedder, llm) = openai_providers(&config.openai, &config.llm)?;
                    tracing::info!(
                        "Using OpenAI API at {} (embed: {}, chat: {})",
                        config.openai.base_url,
                        config.openai.embedding_model,
                        config.openai.chat_model
                    );
                    (Arc::new(embedder), Arc::new(llm))
                }
            };

        let vector_db = config.vector_db.clone();
        let store = tokio::task::spawn_blocking(move || LocalVectorStore::from_config(&vector_db))
            .await??;

        Self::with_providers(config, embedder, llm, Arc::new(store)).await
    }

    /// Assemble a session from explicit providers
    pub async fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Result<Self> {
        let processor = DocumentProcessor::from_config(&config.chunking)?;
        let retriever = Arc::new(VectorStoreManager::new(
            embedder,
            store,
            config.retrieval.clone(),
        ));
        let chain = RagChain::new(Arc::clone(&retriever), llm, config.retrieval.top_k);

        let documents: Vec<UploadedDocument> = retriever
            .manifest()
            .await?
            .into_iter()
            .map(record_from_manifest)
            .collect();
        if !documents.is_empty() {
            tracing::info!("Restored {} documents from the collection", documents.len());
        }

        Ok(Self {
            config,
            processor,
            retriever,
            chain,
            writer: Mutex::new(()),
            documents: RwLock::new(documents),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Process a PDF into the collection
    ///
    /// Never fails: errors come back as an error outcome and leave no record.
    pub async fn upload(&self, path: impl AsRef<Path>) -> UploadOutcome {
        let path = path.as_ref();
        match self.try_upload(path).await {
            Ok(document) => {
                tracing::info!(
                    "Uploaded {} ({} chunks)",
                    document.filename,
                    document.chunk_count
                );
                UploadOutcome::Success {
                    message: format!("Successfully processed {}", document.filename),
                    chunks_created: document.chunk_count,
                    document_info: document,
                }
            }
            Err(e) => {
                tracing::error!("Upload of {} failed: {}", path.display(), e);
                UploadOutcome::error(e.to_string())
            }
        }
    }

    async fn try_upload(&self, path: &Path) -> Result<UploadedDocument> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(Error::NotFound(path.display().to_string()));
        }

        let filename = source_label(path);
        let timeout_secs = self.config.processing.extraction_timeout_secs;
        let processor = self.processor.clone();
        let owned_path = path.to_path_buf();

        let task = tokio::task::spawn_blocking(move || processor.process(&owned_path));
        let processed = tokio::time::timeout(Duration::from_secs(timeout_secs), task)
            .await
            .map_err(|_| {
                Error::extraction(
                    &filename,
                    format!("processing timed out after {} seconds", timeout_secs),
                )
            })???;

        if processed.chunks.is_empty() {
            return Err(Error::extraction(&filename, "no extractable text"));
        }

        let _writer = self.writer.lock().await;

        let chunk_count = processed.chunks.len();
        let vector_ids = self.retriever.add(processed.chunks).await?;
        if vector_ids.len() != chunk_count {
            return Err(Error::store(format!(
                "stored {} of {} chunks for {}",
                vector_ids.len(),
                chunk_count,
                filename
            )));
        }

        let document = UploadedDocument {
            path: path.to_path_buf(),
            filename,
            chunk_count,
            vector_ids,
            content_hash: processed.content_hash,
            uploaded_at: Utc::now(),
        };
        self.documents.write().push(document.clone());

        Ok(document)
    }

    /// Answer a question, optionally restricted to one source file name
    pub async fn query(&self, question: &str, source_filter: Option<&str>) -> QueryOutcome {
        let question = question.trim();
        if question.is_empty() {
            return QueryOutcome::error("Question must not be empty");
        }

        let filter = source_filter.map(str::trim).filter(|s| !s.is_empty());

        match self.chain.run(question, filter).await {
            Ok(result) => QueryOutcome::Success {
                question: question.to_string(),
                answer: result.answer,
                sources: result.sources,
            },
            Err(e) => {
                tracing::error!("Query failed: {}", e);
                QueryOutcome::error(e.to_string())
            }
        }
    }

    /// Snapshot of the uploaded documents, oldest first
    pub async fn list_documents(&self) -> Vec<UploadedDocument> {
        self.documents.read().clone()
    }

    pub async fn stats(&self) -> CollectionStats {
        let total_documents = self.documents.read().len();
        CollectionStats {
            total_documents,
            total_chunks: self.retriever.count().await,
        }
    }

    /// Empty the collection and forget every document
    pub async fn reset(&self) -> ResetOutcome {
        let _writer = self.writer.lock().await;

        match self.retriever.delete_all().await {
            Ok(deleted) => {
                self.documents.write().clear();
                tracing::info!("Collection reset ({} chunks removed)", deleted);
                ResetOutcome::Success {
                    message: "Collection reset successfully".to_string(),
                }
            }
            Err(e) => {
                tracing::error!("Collection reset failed: {}", e);
                ResetOutcome::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Reachability of the embedder, the LLM and the store
    pub async fn health(&self) -> HealthReport {
        let embedder = self
            .retriever
            .embedder()
            .health_check()
            .await
            .unwrap_or(false);
        let llm = self.chain.llm().health_check().await.unwrap_or(false);
        let store = self
            .retriever
            .store()
            .health_check()
            .await
            .unwrap_or(false);

        HealthReport {
            embedder,
            llm,
            store,
        }
    }
}

fn record_from_manifest(entry: ManifestEntry) -> UploadedDocument {
    UploadedDocument {
        path: entry.path,
        filename: entry.source,
        chunk_count: entry.vector_ids.len(),
        vector_ids: entry.vector_ids,
        content_hash: String::new(),
        uploaded_at: entry.stored_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VectorDbConfig;
    use crate::testing::{build_pdf, FailingEmbedder, KeywordEmbedder, ScriptedLlm};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio::sync::{Notify, Semaphore};

    /// Keyword embedder that parks every call until the gate is opened
    struct GatedEmbedder {
        inner: KeywordEmbedder,
        entered: Arc<Notify>,
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl EmbeddingProvider for GatedEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.entered.notify_one();
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| Error::embedding(e.to_string()))?;
            self.inner.embed(text).await
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "gated"
        }

        fn model(&self) -> &str {
            self.inner.model()
        }
    }

    fn test_config(dir: &TempDir) -> RagConfig {
        RagConfig {
            vector_db: VectorDbConfig {
                persist_directory: dir.path().join("store"),
                collection_name: "test".to_string(),
            },
            ..Default::default()
        }
    }

    async fn session(config: RagConfig, embedder: Arc<dyn EmbeddingProvider>) -> DocumentRag {
        let store = LocalVectorStore::from_config(&config.vector_db).unwrap();
        DocumentRag::with_providers(
            config,
            embedder,
            Arc::new(ScriptedLlm::new("Based on the documents [Source: a.pdf, Page: 1]")),
            Arc::new(store),
        )
        .await
        .unwrap()
    }

    fn write_pdf(dir: &TempDir, name: &str, pages: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, build_pdf(pages)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_upload_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let rag = session(test_config(&dir), Arc::new(KeywordEmbedder::default())).await;

        let outcome = rag.upload(dir.path().join("missing.pdf")).await;
        match outcome {
            UploadOutcome::Error { message } => assert!(message.starts_with("File not found")),
            other => panic!("expected error outcome, got {:?}", other),
        }
        assert!(rag.list_documents().await.is_empty());
    }

    #[tokio::test]
    async fn test_upload_skips_blank_page_and_updates_stats() {
        let dir = tempfile::tempdir().unwrap();
        let rag = session(test_config(&dir), Arc::new(KeywordEmbedder::default())).await;
        let path = write_pdf(
            &dir,
            "report.pdf",
            &["Revenue grew in spring", "", "Costs fell in autumn"],
        );

        let outcome = rag.upload(&path).await;
        let UploadOutcome::Success {
            message,
            chunks_created,
            document_info,
        } = outcome
        else {
            panic!("expected a success outcome");
        };

        assert_eq!(message, "Successfully processed report.pdf");
        assert_eq!(chunks_created, 2);
        assert_eq!(document_info.filename, "report.pdf");
        assert_eq!(document_info.vector_ids.len(), 2);
        assert_eq!(document_info.content_hash.len(), 64);

        let stats = rag.stats().await;
        assert_eq!(stats.total_documents, 1);
        assert_eq!(stats.total_chunks, chunks_created);

        let result = rag.query("How did costs change?", None).await;
        let QueryOutcome::Success { sources, .. } = result else {
            panic!("expected success");
        };
        let pages: Vec<u32> = sources.iter().map(|c| c.page).collect();
        assert!(pages.contains(&1) && pages.contains(&3));
        assert!(!pages.contains(&2));
    }

    #[tokio::test]
    async fn test_query_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let rag = session(test_config(&dir), Arc::new(KeywordEmbedder::default())).await;

        match rag.query("What is in here?", None).await {
            QueryOutcome::Success {
                question, sources, ..
            } => {
                assert_eq!(question, "What is in here?");
                assert!(sources.is_empty());
            }
            other => panic!("expected success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let rag = session(test_config(&dir), Arc::new(KeywordEmbedder::default())).await;
        assert!(!rag.query("   ", None).await.is_success());
    }

    #[tokio::test]
    async fn test_filtered_query() {
        let dir = tempfile::tempdir().unwrap();
        let rag = session(test_config(&dir), Arc::new(KeywordEmbedder::default())).await;
        let a = write_pdf(&dir, "a.pdf", &["Quarterly revenue summary"]);
        let b = write_pdf(&dir, "b.pdf", &["Quarterly revenue details", "Revenue appendix"]);
        assert!(rag.upload(&a).await.is_success());
        assert!(rag.upload(&b).await.is_success());

        let QueryOutcome::Success { sources, .. } =
            rag.query("quarterly revenue", Some("b.pdf")).await
        else {
            panic!("expected success");
        };
        assert!(!sources.is_empty());
        assert!(sources.iter().all(|c| c.source == "b.pdf"));

        let QueryOutcome::Success { sources, .. } = rag.query("quarterly revenue", Some("  ")).await
        else {
            panic!("expected success");
        };
        assert!(sources.iter().any(|c| c.source == "a.pdf"));
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let rag = session(test_config(&dir), Arc::new(KeywordEmbedder::default())).await;
        let path = write_pdf(&dir, "a.pdf", &["Some text"]);
        assert!(rag.upload(&path).await.is_success());

        for _ in 0..2 {
            assert!(rag.reset().await.is_success());
            assert_eq!(
                rag.stats().await,
                CollectionStats {
                    total_documents: 0,
                    total_chunks: 0
                }
            );
        }
        assert!(rag.list_documents().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_embedding_registers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let rag = session(test_config(&dir), Arc::new(FailingEmbedder)).await;
        let path = write_pdf(&dir, "a.pdf", &["Some text"]);

        let outcome = rag.upload(&path).await;
        assert!(!outcome.is_success());
        assert!(rag.list_documents().await.is_empty());
        assert_eq!(rag.stats().await.total_chunks, 0);
    }

    #[tokio::test]
    async fn test_unreadable_and_textless_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        let rag = session(test_config(&dir), Arc::new(KeywordEmbedder::default())).await;

        let garbage = dir.path().join("broken.pdf");
        std::fs::write(&garbage, b"not a pdf at all").unwrap();
        assert!(!rag.upload(&garbage).await.is_success());

        let blank = write_pdf(&dir, "blank.pdf", &["", ""]);
        match rag.upload(&blank).await {
            UploadOutcome::Error { message } => assert!(message.contains("no extractable text")),
            other => panic!("expected error outcome, got {:?}", other),
        }
        assert_eq!(rag.stats().await.total_documents, 0);
    }

    #[tokio::test]
    async fn test_records_restored_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(&dir, "kept.pdf", &["Persistent knowledge", "More knowledge"]);

        let uploaded = {
            let rag = session(test_config(&dir), Arc::new(KeywordEmbedder::default())).await;
            match rag.upload(&path).await {
                UploadOutcome::Success { document_info, .. } => document_info,
                other => panic!("expected success, got {:?}", other),
            }
        };

        let restarted = session(test_config(&dir), Arc::new(KeywordEmbedder::default())).await;
        let documents = restarted.list_documents().await;
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].filename, "kept.pdf");
        assert_eq!(documents[0].path, path);
        assert_eq!(documents[0].vector_ids, uploaded.vector_ids);
        assert_eq!(restarted.stats().await.total_chunks, uploaded.chunk_count);
    }

    #[tokio::test]
    async fn test_health_report() {
        let dir = tempfile::tempdir().unwrap();
        let healthy = session(test_config(&dir), Arc::new(KeywordEmbedder::default())).await;
        assert!(healthy.health().await.is_ready());

        let degraded = session(test_config(&dir), Arc::new(FailingEmbedder)).await;
        let report = degraded.health().await;
        assert!(!report.embedder);
        assert!(report.llm && report.store);
        assert!(!report.is_ready());
    }

    #[tokio::test]
    async fn test_reads_do_not_wait_for_running_upload() {
        let dir = tempfile::tempdir().unwrap();
        let entered = Arc::new(Notify::new());
        let gate = Arc::new(Semaphore::new(0));
        let embedder = GatedEmbedder {
            inner: KeywordEmbedder::default(),
            entered: Arc::clone(&entered),
            gate: Arc::clone(&gate),
        };
        let rag = Arc::new(session(test_config(&dir), Arc::new(embedder)).await);
        let path = write_pdf(&dir, "slow.pdf", &["Embedding takes a while"]);

        let upload = tokio::spawn({
            let rag = Arc::clone(&rag);
            async move { rag.upload(&path).await }
        });
        entered.notified().await;

        let documents = tokio::time::timeout(Duration::from_secs(1), rag.list_documents())
            .await
            .unwrap();
        assert!(documents.is_empty());
        let stats = tokio::time::timeout(Duration::from_secs(1), rag.stats())
            .await
            .unwrap();
        assert_eq!(stats, CollectionStats { total_documents: 0, total_chunks: 0 });

        gate.add_permits(16);
        assert!(upload.await.unwrap().is_success());
        assert_eq!(
            rag.stats().await,
            CollectionStats { total_documents: 1, total_chunks: 1 }
        );
    }

    #[tokio::test]
    async fn test_query_with_different_embedding_size_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_pdf(&dir, "a.pdf", &["Vacation policy grants twenty days"]);
        {
            let rag = session(test_config(&dir), Arc::new(KeywordEmbedder::default())).await;
            assert!(rag.upload(&path).await.is_success());
        }

        let switched = session(test_config(&dir), Arc::new(KeywordEmbedder::with_dims(64))).await;
        match switched.query("How many vacation days?", None).await {
            QueryOutcome::Error { message } => {
                assert!(message.contains("128-dimensional"), "{}", message)
            }
            other => panic!("expected error outcome, got {:?}", other),
        }
    }
}
