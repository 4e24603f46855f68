//! Upcoming context: what is coming up across all connected services.

use serde::Serialize;
use tracing::warn;

use crate::types::{RecordFilter, RecordKind, RemoteEvent, RemoteMemory, StoredRecord};

use super::SyncService;

/// Snapshot of upcoming events, open tasks and recent memories.
///
/// Each list is empty when its service is unavailable or its fetch failed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpcomingContext {
    pub calendar_events: Vec<RemoteEvent>,
    pub tasks: Vec<StoredRecord>,
    pub memories: Vec<RemoteMemory>,
}

impl UpcomingContext {
    pub fn is_empty(&self) -> bool {
        self.calendar_events.is_empty() && self.tasks.is_empty() && self.memories.is_empty()
    }
}

impl SyncService {
    /// Gather context for the next `days` days.
    pub async fn upcoming_context(&self, days: u32) -> UpcomingContext {
        let registry = self.registry();
        let mut context = UpcomingContext::default();

        if let Some(calendar) = &registry.calendar {
            match calendar.fetch_upcoming(days).await {
                Ok(events) => context.calendar_events = events,
                Err(e) => warn!(error = %e, "Failed to fetch upcoming events"),
            }
        }

        if let Some(notes) = &registry.notes {
            match notes.query_records(&RecordFilter::kind(RecordKind::Task)).await {
                Ok(tasks) => context.tasks = tasks,
                Err(e) => warn!(error = %e, "Failed to query tasks"),
            }
        }

        if let Some(transcripts) = &registry.transcripts {
            match transcripts
                .recent_memories(days, self.config().transcript_limit)
                .await
            {
                Ok(memories) => context.memories = memories,
                Err(e) => warn!(error = %e, "Failed to fetch recent memories"),
            }
        }

        context
    }
}
