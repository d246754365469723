//! Grounded analysis generation.
//!
//! Takes a new requirement and the assembled retrieval context and asks the
//! chat model for an analysis grounded strictly in that context. The
//! generator never fails: any model or transport error is logged and the
//! caller gets a fixed fallback message instead.

use std::sync::Arc;

use crate::chat::ChatApi;
use crate::config::ChatConfig;

/// Returned verbatim when the chat call fails for any reason.
pub const ANALYSIS_FALLBACK: &str = "An error occurred while analyzing the requirements.";

const SYSTEM_PROMPT: &str = "You are a billing system domain expert. Analyze the user's \
development requirement and provide:\n\
\n\
1. The main features that need to be developed\n\
2. A comparative analysis against similar past projects\n\
\n\
Be concrete and practical. Base every statement strictly on the supplied \
context; do not write anything that is not in the context. If the context \
contains product reference material, billing reference material, or \
source-code-related content, be sure to mention it.";

pub struct Analyzer {
    chat: Arc<dyn ChatApi>,
    temperature: f64,
    max_output_tokens: u32,
}

impl Analyzer {
    pub fn new(chat: Arc<dyn ChatApi>, config: &ChatConfig) -> Self {
        Self {
            chat,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    /// Produce the analysis for `requirement` grounded in `context`.
    pub async fn analyze(&self, requirement: &str, context: &str) -> String {
        let user_prompt = format!(
            "New development requirement:\n{}\n\n\
             Similar past projects for reference:\n{}\n\n\
             Based on the above, analyze the features that need to be developed, \
             including a comparison with the past projects. Use only what is in \
             the context.",
            requirement, context
        );

        match self
            .chat
            .complete(
                SYSTEM_PROMPT,
                &user_prompt,
                self.temperature,
                self.max_output_tokens,
            )
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(error = %e, "analysis generation failed");
                ANALYSIS_FALLBACK.to_string()
            }
        }
    }
}
