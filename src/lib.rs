//! # project-recall
//!
//! A retrieval-augmented pipeline over historical project documents.
//! Documents are chunked on sentence boundaries under a token budget,
//! embedded, and upserted into a hybrid (keyword + vector) search index.
//! A new requirement is answered by retrieving the most similar historical
//! passages, assembling them into a bounded context, and asking a chat
//! model for an analysis grounded strictly in that context.
//!
//! External services — embeddings, chat completion, the search index, and
//! blob storage — sit behind trait interfaces with HTTP implementations
//! for production and in-memory implementations for tests.

pub mod analyze;
pub mod blob;
pub mod chat;
pub mod chunk;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod index;
pub mod ingest;
pub mod models;
pub mod retrieve;
pub mod search_index;
pub mod services;
pub mod tokenizer;
