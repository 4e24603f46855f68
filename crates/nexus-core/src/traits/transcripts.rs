//! Transcript source trait.

use async_trait::async_trait;

use crate::error::NexusResult;
use crate::types::{RemoteMemory, RemoteTranscript, TranscriptQuery};

/// Read access to the personal-memory provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Transcripts matching `query`, at most `limit` of them.
    async fn fetch_transcripts(
        &self,
        query: TranscriptQuery,
        limit: usize,
    ) -> NexusResult<Vec<RemoteTranscript>>;

    /// Memories recorded in the last `days` days.
    async fn recent_memories(&self, days: u32, limit: usize) -> NexusResult<Vec<RemoteMemory>>;

    /// Connectivity probe.
    async fn is_connected(&self) -> bool;
}
