//! Per-cycle sync results.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// A source the orchestrator pulls from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SyncSource {
    Calendar,
    Transcripts,
}

/// Phase of a sync cycle. Traced as the cycle advances, starting from `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CyclePhase {
    Idle,
    FetchingCalendar,
    MappingAndWritingCalendar,
    FetchingTranscripts,
    MappingAndWritingTranscripts,
    Done,
}

/// Counts for one source in one cycle.
///
/// `fetched == synced + skipped + errors` once the step has finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStats {
    pub fetched: usize,
    pub synced: usize,
    /// Records dropped because a mandatory field could not be derived.
    pub skipped: usize,
    /// Records whose write failed or returned no handle.
    pub errors: usize,
}

/// How one source's step ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Source or notes store unavailable; nothing attempted.
    Skipped { reason: String },
    /// Fetch succeeded; per-record results are in the stats.
    Synced(SourceStats),
    /// Fetch failed; counts as one error.
    Failed { error: String },
}

impl StepOutcome {
    pub fn synced(&self) -> usize {
        match self {
            StepOutcome::Synced(stats) => stats.synced,
            _ => 0,
        }
    }

    pub fn skipped(&self) -> usize {
        match self {
            StepOutcome::Synced(stats) => stats.skipped,
            _ => 0,
        }
    }

    pub fn errors(&self) -> usize {
        match self {
            StepOutcome::Synced(stats) => stats.errors,
            StepOutcome::Failed { .. } => 1,
            StepOutcome::Skipped { .. } => 0,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub source: SyncSource,
    pub outcome: StepOutcome,
}

/// Result of one sync cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleResult {
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepReport>,
}

impl CycleResult {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            completed_at: None,
            steps: Vec::new(),
        }
    }

    pub fn record(&mut self, source: SyncSource, outcome: StepOutcome) {
        self.steps.push(StepReport { source, outcome });
    }

    pub fn complete(&mut self, completed_at: DateTime<Utc>) {
        self.completed_at = Some(completed_at);
    }

    pub fn outcome(&self, source: SyncSource) -> Option<&StepOutcome> {
        self.steps
            .iter()
            .find(|step| step.source == source)
            .map(|step| &step.outcome)
    }

    /// Records synced from one source.
    pub fn count(&self, source: SyncSource) -> usize {
        self.outcome(source).map(StepOutcome::synced).unwrap_or(0)
    }

    pub fn total_synced(&self) -> usize {
        self.steps.iter().map(|s| s.outcome.synced()).sum()
    }

    pub fn error_count(&self) -> usize {
        self.steps.iter().map(|s| s.outcome.errors()).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.steps.iter().map(|s| s.outcome.skipped()).sum()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.completed_at.map(|done| done - self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_labels() {
        assert_eq!(CyclePhase::Idle.to_string(), "idle");
        assert_eq!(
            CyclePhase::MappingAndWritingTranscripts.to_string(),
            "mapping_and_writing_transcripts"
        );
    }

    #[test]
    fn test_cycle_result_aggregates_steps() {
        let mut result = CycleResult::new(Utc::now());
        result.record(
            SyncSource::Calendar,
            StepOutcome::Synced(SourceStats {
                fetched: 5,
                synced: 3,
                skipped: 1,
                errors: 1,
            }),
        );
        result.record(
            SyncSource::Transcripts,
            StepOutcome::Failed {
                error: "timeout".to_string(),
            },
        );

        assert_eq!(result.count(SyncSource::Calendar), 3);
        assert_eq!(result.count(SyncSource::Transcripts), 0);
        assert_eq!(result.total_synced(), 3);
        assert_eq!(result.error_count(), 2);
        assert_eq!(result.skipped_count(), 1);
        assert!(result.has_errors());
    }

    #[test]
    fn test_skipped_step_contributes_nothing() {
        let mut result = CycleResult::new(Utc::now());
        result.record(
            SyncSource::Calendar,
            StepOutcome::Skipped {
                reason: "not connected".to_string(),
            },
        );
        assert_eq!(result.error_count(), 0);
        assert_eq!(result.total_synced(), 0);
        assert!(!result.has_errors());
        assert!(result.elapsed().is_none());
    }
}
