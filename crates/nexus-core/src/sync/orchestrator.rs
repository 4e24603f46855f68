//! One sync cycle: pull from each source, map, write, aggregate.
//!
//! Every failure below this level is contained. A fetch failure costs its
//! source one error and the next source still runs; a mapping or write
//! failure costs one record and the rest of the batch still runs.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::NexusResult;
use crate::mapper::{map_event, map_transcript_note};
use crate::traits::NotesStore;
use crate::types::{
    ActionItem, CyclePhase, CycleResult, NotesRecord, SourceStats, StepOutcome, SyncSource,
    TimeWindow, TranscriptQuery,
};

use super::ServiceRegistry;

/// Something the scheduler can run repeatedly.
#[async_trait]
pub trait SyncCycle: Send + Sync {
    /// Run one cycle. An `Err` means the cycle failed beyond per-source
    /// containment and the scheduler should cool down.
    async fn run_cycle(&self) -> NexusResult<CycleResult>;
}

/// Sync orchestrator over a fixed set of adapters.
pub struct SyncService {
    registry: ServiceRegistry,
    config: SyncConfig,
}

impl SyncService {
    pub fn new(registry: ServiceRegistry, config: SyncConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one cycle with `now` as the reference time for windows and defaults.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> CycleResult {
        trace_phase(CyclePhase::Idle);
        let mut result = CycleResult::new(now);
        info!("Starting sync cycle");

        result.record(SyncSource::Calendar, self.sync_calendar(now).await);
        result.record(SyncSource::Transcripts, self.sync_transcripts(now).await);

        result.complete(Utc::now());
        trace_phase(CyclePhase::Done);
        info!(
            calendar_synced = result.count(SyncSource::Calendar),
            transcripts_synced = result.count(SyncSource::Transcripts),
            skipped = result.skipped_count(),
            errors = result.error_count(),
            "Sync cycle complete"
        );
        result
    }

    /// Copy calendar events in the configured window into the notes store.
    pub async fn sync_calendar(&self, now: DateTime<Utc>) -> StepOutcome {
        let (calendar, notes) = match (&self.registry.calendar, &self.registry.notes) {
            (Some(calendar), Some(notes)) => (calendar, notes),
            (calendar, _) => {
                let reason = unavailable_reason(calendar.is_some(), "calendar");
                warn!(source = "calendar", reason = %reason, "Calendar sync skipped");
                return StepOutcome::Skipped { reason };
            }
        };

        trace_phase(CyclePhase::FetchingCalendar);
        let window = TimeWindow::around(
            now,
            self.config.calendar_past_days,
            self.config.calendar_future_days,
        );
        let events = match calendar.fetch_events(window).await {
            Ok(events) => events,
            Err(e) => {
                warn!(source = "calendar", error = %e, "Failed to fetch calendar events");
                return StepOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        trace_phase(CyclePhase::MappingAndWritingCalendar);
        let mut stats = SourceStats {
            fetched: events.len(),
            ..Default::default()
        };
        for event in &events {
            match map_event(event) {
                Ok(record) => write_record(notes, &record, &[], &mut stats).await,
                Err(e) => {
                    debug!(error = %e, "Dropping calendar event");
                    stats.skipped += 1;
                }
            }
        }

        info!(
            fetched = stats.fetched,
            synced = stats.synced,
            skipped = stats.skipped,
            errors = stats.errors,
            "Synced calendar events"
        );
        StepOutcome::Synced(stats)
    }

    /// Copy recent meeting notes into the notes store, with their action items.
    pub async fn sync_transcripts(&self, now: DateTime<Utc>) -> StepOutcome {
        let (transcripts, notes) = match (&self.registry.transcripts, &self.registry.notes) {
            (Some(transcripts), Some(notes)) => (transcripts, notes),
            (transcripts, _) => {
                let reason = unavailable_reason(transcripts.is_some(), "transcript source");
                warn!(source = "transcripts", reason = %reason, "Transcript sync skipped");
                return StepOutcome::Skipped { reason };
            }
        };

        trace_phase(CyclePhase::FetchingTranscripts);
        let query = TranscriptQuery::meeting_notes(self.config.transcript_days);
        let fetched = match transcripts
            .fetch_transcripts(query, self.config.transcript_limit)
            .await
        {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(source = "transcripts", error = %e, "Failed to fetch meeting notes");
                return StepOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        trace_phase(CyclePhase::MappingAndWritingTranscripts);
        let mut stats = SourceStats {
            fetched: fetched.len(),
            ..Default::default()
        };
        for note in &fetched {
            let (record, actions) = map_transcript_note(note, now);
            write_record(notes, &record, &actions, &mut stats).await;
        }

        info!(
            fetched = stats.fetched,
            synced = stats.synced,
            errors = stats.errors,
            "Synced meeting notes"
        );
        StepOutcome::Synced(stats)
    }
}

#[async_trait]
impl SyncCycle for SyncService {
    async fn run_cycle(&self) -> NexusResult<CycleResult> {
        Ok(self.run_cycle_at(Utc::now()).await)
    }
}

async fn write_record(
    notes: &Arc<dyn NotesStore>,
    record: &NotesRecord,
    children: &[ActionItem],
    stats: &mut SourceStats,
) {
    match notes.create_record(record, children).await {
        Ok(Some(handle)) => {
            debug!(id = %handle.id, title = %record.title, kind = %record.kind, "Created record");
            stats.synced += 1;
        }
        Ok(None) => {
            warn!(title = %record.title, "Notes store returned no record");
            stats.errors += 1;
        }
        Err(e) => {
            warn!(title = %record.title, error = %e, "Failed to create record");
            stats.errors += 1;
        }
    }
}

fn unavailable_reason(source_available: bool, source: &str) -> String {
    if source_available {
        "notes store not connected".to_string()
    } else {
        format!("{} not connected", source)
    }
}

fn trace_phase(phase: CyclePhase) {
    debug!(phase = %phase, "Sync phase");
}
