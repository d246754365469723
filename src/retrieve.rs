//! Query-side retrieval.
//!
//! The Retriever embeds the query, issues one hybrid search, and projects
//! the service's hits into [`SearchResult`]s. Ranking belongs to the
//! service; this layer never re-sorts, but it does verify the descending
//! score contract and reports a violation instead of silently passing
//! misordered context downstream.

use std::sync::Arc;

use crate::embedding::Embedder;
use crate::error::RetrieveError;
use crate::models::SearchResult;
use crate::search_index::SearchIndex;

pub struct Retriever {
    embedder: Embedder,
    index: Arc<dyn SearchIndex>,
    top_k: usize,
}

impl Retriever {
    pub fn new(embedder: Embedder, index: Arc<dyn SearchIndex>, top_k: usize) -> Self {
        Self {
            embedder,
            index,
            top_k,
        }
    }

    /// Find up to `top_k` passages similar to `query`.
    ///
    /// An embedding failure degrades to an empty result set: the caller
    /// still gets an answer, just an ungrounded one.
    pub async fn search_similar(&self, query: &str) -> Result<Vec<SearchResult>, RetrieveError> {
        let query_vector = match self.embedder.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "query embedding failed; returning no results");
                return Ok(Vec::new());
            }
        };

        let hits = self
            .index
            .search(query, &query_vector, self.top_k)
            .await
            .map_err(|e| RetrieveError::Search(e.to_string()))?;

        let results: Vec<SearchResult> = hits
            .into_iter()
            .map(|hit| SearchResult {
                filename: hit.filename.unwrap_or_default(),
                chunk: hit.chunk.unwrap_or_default(),
                project_type: hit.project_type.unwrap_or_default(),
                technology: hit.technology.unwrap_or_default(),
                department: hit.department.unwrap_or_default(),
                score: hit.score.unwrap_or(0.0),
            })
            .collect();

        for pair in results.windows(2) {
            if pair[0].score < pair[1].score {
                return Err(RetrieveError::UnorderedResults);
            }
        }

        tracing::debug!(results = results.len(), "retrieval complete");
        Ok(results)
    }
}
