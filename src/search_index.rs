//! Search index service abstraction.
//!
//! The index is an external service: the pipeline only ever issues a batch
//! `upsert` of [`IndexRecord`]s and a hybrid `search` combining the raw
//! query text (lexical signal) with the query vector (semantic signal).
//! The service owns ranking and score computation.
//!
//! [`HttpSearchIndex`] speaks the JSON documents API of the hosted search
//! service. [`InMemoryIndex`] is a faithful stand-in for tests: keyword
//! term matching blended with brute-force cosine similarity, results in
//! descending score order.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SearchIndexConfig;
use crate::models::IndexRecord;

/// One raw hit as returned by the search service, before the Retriever
/// applies field defaulting. Missing fields stay `None` here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchHit {
    pub filename: Option<String>,
    pub chunk: Option<String>,
    pub project_type: Option<String>,
    pub technology: Option<String>,
    pub department: Option<String>,
    #[serde(rename = "@search.score")]
    pub score: Option<f64>,
}

/// External search/vector index contract.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Upsert a batch of records in one call. Concurrent upserts from
    /// independent ingestions are the service's responsibility.
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()>;

    /// Hybrid search: lexical match on `query_text` plus nearest-neighbour
    /// match on `query_vector` over the stored vectors, returning up to
    /// `top_k` hits in the service's ranking order.
    async fn search(
        &self,
        query_text: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>>;
}

/// Client for the hosted search service's JSON documents API.
pub struct HttpSearchIndex {
    client: reqwest::Client,
    endpoint: String,
    index_name: String,
    api_key: String,
}

impl HttpSearchIndex {
    pub fn new(config: &SearchIndexConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", config.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponseBody {
    value: Vec<SearchHit>,
}

#[async_trait]
impl SearchIndex for HttpSearchIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        let url = format!(
            "{}/indexes/{}/docs/index",
            self.endpoint, self.index_name
        );

        let mut actions = Vec::with_capacity(records.len());
        for record in records {
            let mut doc = serde_json::to_value(record)?;
            doc["@search.action"] = serde_json::Value::String("mergeOrUpload".to_string());
            actions.push(doc);
        }

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&serde_json::json!({ "value": actions }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("index upsert error {}: {}", status, body_text);
        }

        Ok(())
    }

    async fn search(
        &self,
        query_text: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let url = format!(
            "{}/indexes/{}/docs/search",
            self.endpoint, self.index_name
        );

        let body = serde_json::json!({
            "search": query_text,
            "vectorQueries": [{
                "kind": "vector",
                "vector": query_vector,
                "k": top_k,
                "fields": "text_vector",
            }],
            "select": "filename,chunk,project_type,technology,department",
            "top": top_k,
        });

        let response = self
            .client
            .post(&url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("search error {}: {}", status, body_text);
        }

        let parsed: SearchResponseBody = response.json().await?;
        Ok(parsed.value)
    }
}

/// In-memory index for tests and offline runs.
///
/// Hybrid scoring is an even blend of keyword term overlap and cosine
/// similarity, which is enough to exercise ranking, projection, and the
/// descending-order contract.
#[derive(Default)]
pub struct InMemoryIndex {
    records: RwLock<HashMap<String, IndexRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cosine_sim(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        (dot / (mag_a * mag_b)) as f64
    }
}

#[async_trait]
impl SearchIndex for InMemoryIndex {
    async fn upsert(&self, records: &[IndexRecord]) -> Result<()> {
        let mut stored = self.records.write().unwrap();
        for record in records {
            stored.insert(record.chunk_id.clone(), record.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        query_text: &str,
        query_vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        let query_lower = query_text.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();

        let stored = self.records.read().unwrap();
        let mut hits: Vec<SearchHit> = stored
            .values()
            .map(|r| {
                let text_lower = r.chunk.to_lowercase();
                let matches = terms.iter().filter(|t| text_lower.contains(*t)).count();
                let keyword = if terms.is_empty() {
                    0.0
                } else {
                    matches as f64 / terms.len() as f64
                };
                let semantic = cosine_sim(query_vector, &r.text_vector);
                SearchHit {
                    filename: Some(r.filename.clone()),
                    chunk: Some(r.chunk.clone()),
                    project_type: Some(r.project_type.clone()),
                    technology: Some(r.technology.clone()),
                    department: Some(r.department.clone()),
                    score: Some(0.5 * keyword + 0.5 * semantic),
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, chunk: &str, vector: Vec<f32>) -> IndexRecord {
        IndexRecord {
            chunk_id: id.to_string(),
            filename: format!("{}.txt", id),
            chunk: chunk.to_string(),
            text_vector: vector,
            project_type: "Billing".to_string(),
            technology: "Java".to_string(),
            department: "DEV".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_chunk_id() {
        let index = InMemoryIndex::new();
        let r = record("c1", "billing batch", vec![1.0, 0.0]);
        index.upsert(&[r.clone()]).await.unwrap();
        index.upsert(&[r]).await.unwrap();
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn search_returns_descending_scores() {
        let index = InMemoryIndex::new();
        index
            .upsert(&[
                record("c1", "billing invoice run", vec![1.0, 0.0]),
                record("c2", "unrelated content", vec![0.0, 1.0]),
                record("c3", "billing reconciliation", vec![0.9, 0.1]),
            ])
            .await
            .unwrap();

        let hits = index.search("billing", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits.len(), 3);
        for pair in hits.windows(2) {
            assert!(pair[0].score.unwrap() >= pair[1].score.unwrap());
        }
    }

    #[tokio::test]
    async fn search_respects_top_k() {
        let index = InMemoryIndex::new();
        index
            .upsert(&[
                record("c1", "alpha", vec![1.0, 0.0]),
                record("c2", "beta", vec![0.5, 0.5]),
                record("c3", "gamma", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = index.search("alpha", &[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
    }
}
