//! Context assembly for the analysis prompt.
//!
//! Renders ranked search results into the text block the chat model sees.
//! Output is never empty: with no results the model gets an explicit
//! sentinel instead, so it cannot mistake silence for relevant history.

use crate::models::SearchResult;

/// Rendered when retrieval finds nothing.
pub const NO_PRIOR_WORK: &str = "No related prior projects were found.";

/// Render up to `max_rendered` results as numbered blocks.
///
/// Each block carries the source filename, the document labels, the score
/// to two decimals, and the chunk text cut to `snippet_chars` characters.
pub fn build_context(results: &[SearchResult], max_rendered: usize, snippet_chars: usize) -> String {
    if results.is_empty() {
        return NO_PRIOR_WORK.to_string();
    }

    let mut out = String::from("=== Prior similar projects ===\n\n");

    for (i, result) in results.iter().take(max_rendered).enumerate() {
        out.push_str(&format!("Project {}:\n", i + 1));
        out.push_str(&format!("- Filename: {}\n", result.filename));
        out.push_str(&format!("- Project type: {}\n", result.project_type));
        out.push_str(&format!("- Technology: {}\n", result.technology));
        out.push_str(&format!("- Department: {}\n", result.department));
        out.push_str(&format!("- Similarity: {:.2}\n", result.score));
        out.push_str(&format!(
            "- Content: {}...\n",
            truncate_chars(&result.chunk, snippet_chars)
        ));
        out.push_str(&format!("\n{}\n\n", "=".repeat(50)));
    }

    out
}

/// First `max_chars` characters of `text`, never splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
