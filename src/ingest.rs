//! Document ingestion: upload, extract, index.
//!
//! The raw upload is stored first so the original bytes survive even if
//! indexing fails; extraction and indexing follow. Callers get back the
//! index summary for reporting.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::extract::extract_text;
use crate::index::Indexer;
use crate::models::{Document, DocumentLabels, IndexSummary};
use crate::services::Services;

/// Ingest one document end to end.
pub async fn ingest_document(
    services: &Services,
    filename: &str,
    bytes: &[u8],
    labels: &DocumentLabels,
) -> Result<IndexSummary> {
    let document = Document {
        filename: filename.to_string(),
        content: bytes.to_vec(),
        file_type: filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_lowercase(),
        labels: labels.clone(),
        upload_timestamp: Utc::now(),
        processed: false,
    };

    services
        .blobs
        .put(&document.filename, &document.content, &document.labels)
        .await
        .with_context(|| format!("storing upload {}", document.filename))?;

    let text = extract_text(&document.content, &document.file_type)
        .with_context(|| format!("extracting text from {}", document.filename))?;

    let indexer = Indexer::new(
        &services.tokenizer,
        services.embedder.clone(),
        services.index.clone(),
        services.config.chunking.max_tokens,
        services.config.embedding.concurrency,
    );

    let summary = indexer
        .index_document(&document.filename, &text, &document.labels)
        .await?;
    Ok(summary)
}
