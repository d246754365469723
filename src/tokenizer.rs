//! Token counting for chunk budgeting.
//!
//! Wraps a tiktoken `cl100k_base` encoder so the chunker measures text the
//! same way the embedding and chat models bill it. Construction is done once
//! and the encoder shared; encoding itself is a pure function of the text.

use anyhow::{Context, Result};
use tiktoken_rs::CoreBPE;

pub struct Tokenizer {
    bpe: CoreBPE,
}

impl Tokenizer {
    /// Build the `cl100k_base` encoder used by the GPT-4 family.
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().context("failed to load cl100k_base encoding")?;
        Ok(Self { bpe })
    }

    /// Number of tokens the model would see for `text`.
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}
