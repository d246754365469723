//! Typed error kinds for the retrieval pipeline.
//!
//! Expected failure modes (blank input, a flaky embedding service, a
//! mis-behaving search backend) are returned as values rather than bubbled
//! up as opaque errors, so callers can distinguish "skip this unit" from
//! "abort the operation". `anyhow` is reserved for the CLI/orchestration
//! edges where the distinction no longer matters.

use thiserror::Error;

/// Failure modes of a single embedding call.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Input was empty or whitespace-only. Rejected locally; the embedding
    /// service is never called.
    #[error("embedding input must be a non-empty string")]
    InvalidInput,

    /// The embedding service returned something that is not a flat numeric
    /// vector of the expected shape.
    #[error("embedding service returned an invalid vector: {0}")]
    InvalidVector(String),

    /// Transport or service failure. `transient` marks errors that were
    /// already retried with backoff (rate limit, 5xx, network) and still
    /// failed; permanent errors (auth, bad request) fail on first attempt.
    #[error("embedding service call failed ({}): {message}", if *transient { "transient" } else { "permanent" })]
    Service { message: String, transient: bool },
}

/// Failure modes of indexing one document.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Every chunk of the document failed embedding or validation, so there
    /// was nothing to upsert.
    #[error("no valid chunks produced for {filename}")]
    NoValidChunks { filename: String },

    /// The batch upsert to the search index failed.
    #[error("index upsert failed for {filename}: {message}")]
    UpsertFailed { filename: String, message: String },
}

/// Failure modes of the query path.
#[derive(Debug, Error)]
pub enum RetrieveError {
    /// The search service call itself failed.
    #[error("search call failed: {0}")]
    Search(String),

    /// The service returned results whose scores are not monotonically
    /// non-increasing. The Retriever never re-sorts, so a mis-ordered
    /// response is a broken contract and is flagged loudly.
    #[error("search service returned results out of descending-score order")]
    UnorderedResults,
}
