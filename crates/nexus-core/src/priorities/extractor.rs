//! LLM-backed extractor.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::traits::{Extractor, GenerationOptions, Llm};
use crate::types::{ExtractedPriorities, Message, Period, TranscriptText};

use super::parser::parse_priorities;
use super::prompts::{format_transcripts, priority_extraction_prompt};

const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Extracts priorities by prompting an [`Llm`] and parsing its JSON answer.
pub struct LlmExtractor {
    llm: Arc<dyn Llm>,
    max_tokens: u32,
}

impl LlmExtractor {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self {
            llm,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, transcripts: &[TranscriptText], period: Period) -> ExtractedPriorities {
        let formatted = format_transcripts(transcripts);
        if formatted.is_empty() {
            warn!("No transcripts to analyze");
            return ExtractedPriorities::empty();
        }

        info!(
            transcripts = transcripts.len(),
            model = self.llm.model_name(),
            period = %period,
            "Analyzing transcripts"
        );

        let messages = [Message::user(priority_extraction_prompt(&formatted, period))];
        let options = GenerationOptions {
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = match self.llm.generate(&messages, Some(options)).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, "Priority extraction failed");
                return ExtractedPriorities::empty();
            }
        };

        match parse_priorities(response.content_or_empty()) {
            Ok(priorities) => {
                let counts = priorities.counts();
                info!(
                    commitments = counts.commitments,
                    requests = counts.requests,
                    deadlines = counts.deadlines,
                    "Extracted priorities"
                );
                priorities
            }
            Err(e) => {
                error!(error = %e, "Failed to parse extraction response");
                debug!(response = response.content_or_empty(), "Raw extraction response");
                ExtractedPriorities::empty()
            }
        }
    }
}
