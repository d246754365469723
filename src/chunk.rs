//! Sentence-boundary text chunker.
//!
//! Splits document text into passages that respect a `max_tokens` budget,
//! measured with the real model tokenizer rather than a character heuristic.
//! Splitting happens on sentence terminators (`.`), and sentences are
//! accumulated greedily: a chunk is flushed only when adding the next
//! sentence would push it over budget.
//!
//! # Guarantees
//!
//! - Chunks appear in original document order.
//! - Every chunk is within `max_tokens`, except a single sentence that
//!   exceeds the budget on its own — it is emitted as one oversized chunk
//!   rather than truncated.
//! - Empty or whitespace-only input produces zero chunks.

use crate::tokenizer::Tokenizer;

/// Split `text` into token-bounded, sentence-aligned passages.
pub fn chunk_text(text: &str, max_tokens: usize, tokenizer: &Tokenizer) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in text.split('.') {
        if sentence.trim().is_empty() {
            continue;
        }

        let mut candidate = String::with_capacity(current.len() + sentence.len() + 1);
        candidate.push_str(&current);
        candidate.push_str(sentence);
        candidate.push('.');

        if tokenizer.count(&candidate) <= max_tokens {
            current = candidate;
        } else {
            if !current.trim().is_empty() {
                chunks.push(current.trim().to_string());
            }
            // The candidate sentence starts the next buffer even if it is
            // oversized by itself; it will be flushed whole.
            current = format!("{}.", sentence);
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}
