//! Ingestion-side indexing: chunk, embed, upsert.
//!
//! One document in, one batch upsert out. Embedding calls fan out with
//! bounded parallelism; a chunk whose embedding fails or comes back the
//! wrong width is skipped, not fatal. The document as a whole fails only
//! when nothing survives or the upsert itself fails.

use std::sync::Arc;

use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::chunk::chunk_text;
use crate::embedding::Embedder;
use crate::error::{EmbedError, IndexError};
use crate::models::{Chunk, DocumentLabels, IndexRecord, IndexSummary};
use crate::search_index::SearchIndex;
use crate::tokenizer::Tokenizer;

pub struct Indexer<'a> {
    tokenizer: &'a Tokenizer,
    embedder: Embedder,
    index: Arc<dyn SearchIndex>,
    max_tokens: usize,
    concurrency: usize,
}

impl<'a> Indexer<'a> {
    pub fn new(
        tokenizer: &'a Tokenizer,
        embedder: Embedder,
        index: Arc<dyn SearchIndex>,
        max_tokens: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            tokenizer,
            embedder,
            index,
            max_tokens,
            concurrency,
        }
    }

    /// Index one document's text under `filename`.
    ///
    /// Returns a summary of how many chunks were produced, indexed, and
    /// skipped. `Ok` requires at least one indexed chunk.
    pub async fn index_document(
        &self,
        filename: &str,
        text: &str,
        labels: &DocumentLabels,
    ) -> Result<IndexSummary, IndexError> {
        let pieces = chunk_text(text, self.max_tokens, self.tokenizer);
        let chunks_total = pieces.len();

        if chunks_total == 0 {
            return Err(IndexError::NoValidChunks {
                filename: filename.to_string(),
            });
        }

        tracing::info!(filename, chunks = chunks_total, "indexing document");

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(chunks_total);

        for piece in pieces {
            let semaphore = semaphore.clone();
            let embedder = self.embedder.clone();
            handles.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            piece,
                            Err(EmbedError::Service {
                                message: "embedding pool shut down".to_string(),
                                transient: false,
                            }),
                        )
                    }
                };
                let result = embedder.embed_checked(&piece).await;
                (piece, result)
            }));
        }

        let mut chunks: Vec<Chunk> = Vec::with_capacity(chunks_total);
        let mut chunks_skipped = 0usize;

        for handle in handles {
            match handle.await {
                Ok((piece, Ok(embedding))) => {
                    chunks.push(Chunk {
                        chunk_id: Uuid::new_v4().to_string(),
                        filename: filename.to_string(),
                        text: piece,
                        embedding,
                        labels: labels.clone(),
                    });
                }
                Ok((_, Err(e))) => {
                    tracing::warn!(filename, error = %e, "skipping chunk: embedding failed");
                    chunks_skipped += 1;
                }
                Err(e) => {
                    tracing::warn!(filename, error = %e, "skipping chunk: embed task failed");
                    chunks_skipped += 1;
                }
            }
        }

        if chunks.is_empty() {
            return Err(IndexError::NoValidChunks {
                filename: filename.to_string(),
            });
        }

        let records: Vec<IndexRecord> = chunks.iter().map(IndexRecord::from_chunk).collect();

        self.index
            .upsert(&records)
            .await
            .map_err(|e| IndexError::UpsertFailed {
                filename: filename.to_string(),
                message: e.to_string(),
            })?;

        let summary = IndexSummary {
            chunks_total,
            chunks_indexed: chunks.len(),
            chunks_skipped,
        };
        tracing::info!(
            filename,
            indexed = summary.chunks_indexed,
            skipped = summary.chunks_skipped,
            "document indexed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingApi;
    use crate::search_index::InMemoryIndex;
    use async_trait::async_trait;
    use serde_json::Value;

    /// Embeds everything to a fixed vector, except inputs containing the
    /// poison marker, which fail as a permanent service error.
    struct PoisonApi;

    #[async_trait]
    impl EmbeddingApi for PoisonApi {
        async fn embed_raw(&self, text: &str) -> Result<Value, EmbedError> {
            if text.contains("poison") {
                return Err(EmbedError::Service {
                    message: "simulated failure".to_string(),
                    transient: false,
                });
            }
            Ok(serde_json::json!([0.5, 0.5, 0.5]))
        }
    }

    fn embedder() -> Embedder {
        let api: Arc<dyn EmbeddingApi> = Arc::new(PoisonApi);
        Embedder::new(api, 3)
    }

    fn labels() -> DocumentLabels {
        DocumentLabels {
            project_type: Some("Billing".to_string()),
            technology: Some("Java".to_string()),
            department: None,
        }
    }

    #[tokio::test]
    async fn partial_embedding_failure_still_indexes() {
        let tokenizer = Tokenizer::new().unwrap();
        let index = Arc::new(InMemoryIndex::new());
        let indexer = Indexer::new(&tokenizer, embedder(), index.clone(), 5, 2);

        let text = "first sentence. second sentence. poison sentence. fourth sentence.";
        let summary = indexer
            .index_document("spec.txt", text, &labels())
            .await
            .unwrap();

        assert_eq!(summary.chunks_total, 4);
        assert_eq!(summary.chunks_indexed, 3);
        assert_eq!(summary.chunks_skipped, 1);
        assert_eq!(index.len(), 3);
    }

    #[tokio::test]
    async fn all_chunks_failing_is_an_error() {
        let tokenizer = Tokenizer::new().unwrap();
        let index = Arc::new(InMemoryIndex::new());
        let indexer = Indexer::new(&tokenizer, embedder(), index.clone(), 5, 2);

        let err = indexer
            .index_document("spec.txt", "poison one. poison two.", &labels())
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::NoValidChunks { .. }));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn empty_document_is_an_error() {
        let tokenizer = Tokenizer::new().unwrap();
        let index = Arc::new(InMemoryIndex::new());
        let indexer = Indexer::new(&tokenizer, embedder(), index, 5, 2);

        let err = indexer
            .index_document("empty.txt", "   ", &labels())
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::NoValidChunks { .. }));
    }

    #[tokio::test]
    async fn missing_labels_become_empty_strings_in_records() {
        let tokenizer = Tokenizer::new().unwrap();
        let index = Arc::new(InMemoryIndex::new());
        let indexer = Indexer::new(&tokenizer, embedder(), index.clone(), 50, 2);

        indexer
            .index_document("spec.txt", "only sentence here.", &labels())
            .await
            .unwrap();

        let hits = index.search("sentence", &[0.5, 0.5, 0.5], 1).await.unwrap();
        assert_eq!(hits[0].department.as_deref(), Some(""));
        assert_eq!(hits[0].project_type.as_deref(), Some("Billing"));
    }
}
