//! Priority extraction trait.

use async_trait::async_trait;

use crate::types::{ExtractedPriorities, Period, TranscriptText};

/// Turns transcript text into categorized candidate items.
///
/// Implementations never fail: any internal problem yields
/// [`ExtractedPriorities::empty`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, transcripts: &[TranscriptText], period: Period) -> ExtractedPriorities;
}
