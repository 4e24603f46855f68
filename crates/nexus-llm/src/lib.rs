//! nexus-llm - LLM provider implementations for nexus.
//!
//! The priority extractor talks to the model through the core `Llm` trait.
//! This crate provides the Anthropic (Claude) implementation of it.
//!
//! # Example
//!
//! ```ignore
//! use nexus_llm::LlmFactory;
//!
//! let llm = LlmFactory::anthropic(config.anthropic.clone())?;
//! let extractor = LlmExtractor::new(llm);
//! ```

mod anthropic;
mod factory;

pub use anthropic::{AnthropicLlm, ANTHROPIC_API_URL};
pub use factory::LlmFactory;

// Re-export core types for convenience
pub use nexus_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse};
