//! Shared service context.
//!
//! All external clients are built once at process start and shared behind
//! `Arc` trait objects. Pipeline components receive what they need from
//! here instead of constructing clients themselves, so tests can swap in
//! the in-memory implementations wholesale.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::blob::{BlobStore, FsBlobStore};
use crate::chat::{ChatApi, HttpChatApi};
use crate::config::Config;
use crate::embedding::{Embedder, HttpEmbeddingApi};
use crate::search_index::{HttpSearchIndex, SearchIndex};
use crate::tokenizer::Tokenizer;

pub struct Services {
    pub config: Config,
    pub tokenizer: Tokenizer,
    pub embedder: Embedder,
    pub chat: Arc<dyn ChatApi>,
    pub index: Arc<dyn SearchIndex>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Services {
    /// Build the production wiring from config: HTTP clients for embedding,
    /// chat, and search, filesystem-backed blob storage.
    pub fn from_config(config: Config) -> Result<Self> {
        let tokenizer = Tokenizer::new().context("loading tokenizer")?;

        let embedding_api =
            HttpEmbeddingApi::new(&config.embedding).context("building embedding client")?;
        let embedder = Embedder::new(Arc::new(embedding_api), config.embedding.dims);

        let chat: Arc<dyn ChatApi> =
            Arc::new(HttpChatApi::new(&config.chat).context("building chat client")?);

        let index: Arc<dyn SearchIndex> = Arc::new(
            HttpSearchIndex::new(&config.search_index).context("building search client")?,
        );

        let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(&config.blob));

        Ok(Self {
            config,
            tokenizer,
            embedder,
            chat,
            index,
            blobs,
        })
    }

    /// Wiring for tests and offline runs: caller supplies every backend.
    pub fn with_backends(
        config: Config,
        embedder: Embedder,
        chat: Arc<dyn ChatApi>,
        index: Arc<dyn SearchIndex>,
        blobs: Arc<dyn BlobStore>,
    ) -> Result<Self> {
        let tokenizer = Tokenizer::new().context("loading tokenizer")?;
        Ok(Self {
            config,
            tokenizer,
            embedder,
            chat,
            index,
            blobs,
        })
    }
}
