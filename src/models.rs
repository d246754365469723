//! Core data types that flow through the ingestion and query pipelines.
//!
//! [`IndexRecord`] is the wire contract between the Indexer and the
//! Retriever: its serialized shape is what the search index stores and
//! returns, and it must stay stable for round-trip correctness.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured document labels copied onto every chunk.
///
/// Deliberately a closed record rather than a free-form map: the Indexer
/// writes exactly these fields and the Retriever projects exactly these
/// fields, so the two sides cannot drift apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLabels {
    pub project_type: Option<String>,
    pub technology: Option<String>,
    pub department: Option<String>,
}

/// A document as uploaded, before chunking.
#[derive(Debug, Clone)]
pub struct Document {
    /// Unique key within the blob container.
    pub filename: String,
    /// Raw uploaded bytes.
    pub content: Vec<u8>,
    /// Lowercase file extension (`txt`, `pdf`, ...).
    pub file_type: String,
    pub labels: DocumentLabels,
    pub upload_timestamp: DateTime<Utc>,
    /// Set by the caller once indexing has succeeded.
    pub processed: bool,
}

/// A token-bounded passage of a document with its embedding.
///
/// Created during indexing and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub chunk_id: String,
    /// Back-reference to the parent document.
    pub filename: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub labels: DocumentLabels,
}

/// Persisted shape of one chunk in the search index.
///
/// Field names are the index schema; do not rename without migrating the
/// index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexRecord {
    pub chunk_id: String,
    pub filename: String,
    pub chunk: String,
    pub text_vector: Vec<f32>,
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub technology: String,
    #[serde(default)]
    pub department: String,
}

impl IndexRecord {
    /// Build a record from a surviving chunk. Missing labels become empty
    /// strings, matching what the index stores for absent fields.
    pub fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            chunk_id: chunk.chunk_id.clone(),
            filename: chunk.filename.clone(),
            chunk: chunk.text.clone(),
            text_vector: chunk.embedding.clone(),
            project_type: chunk.labels.project_type.clone().unwrap_or_default(),
            technology: chunk.labels.technology.clone().unwrap_or_default(),
            department: chunk.labels.department.clone().unwrap_or_default(),
        }
    }
}

/// One ranked hit from the query path. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub filename: String,
    pub chunk: String,
    pub project_type: String,
    pub technology: String,
    pub department: String,
    /// Similarity score from the search service. Higher is more relevant;
    /// no fixed range is guaranteed.
    pub score: f64,
}

/// Outcome of indexing one document.
#[derive(Debug, Clone, Copy)]
pub struct IndexSummary {
    /// Chunks produced by the chunker.
    pub chunks_total: usize,
    /// Chunks that embedded successfully and were upserted.
    pub chunks_indexed: usize,
    /// Chunks skipped because embedding failed or validation rejected the
    /// vector.
    pub chunks_skipped: usize,
}
