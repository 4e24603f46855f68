//! Factory for creating LLM providers.

use std::sync::Arc;

use nexus_core::error::NexusResult;
use nexus_core::traits::{Llm, LlmConfig};

use crate::anthropic::AnthropicLlm;

/// Factory for creating LLM providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create the Anthropic provider from the `anthropic` config section.
    pub fn anthropic(config: LlmConfig) -> NexusResult<Arc<dyn Llm>> {
        Ok(Arc::new(AnthropicLlm::new(config)?))
    }
}
