//! One-shot priority workflow: fetch transcripts, extract, optionally persist.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::PriorityConfig;
use crate::mapper::{map_candidate, map_transcript_text};
use crate::sync::ServiceRegistry;
use crate::types::{CategoryCounts, ExtractedPriorities, Period, TranscriptQuery, TranscriptText};

/// How a workflow run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// No transcripts for the period; extraction was not invoked.
    NoData,
    /// Extraction ran and found nothing.
    NoPriorities,
    /// Extraction found items (and, outside dry-run, creation was attempted).
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowStats {
    pub transcripts_analyzed: usize,
    pub priorities_detected: usize,
    /// Records actually created, per category. Always zero in dry-run.
    pub created: CategoryCounts,
    /// Creation attempts that failed or returned no record.
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowResult {
    pub success: bool,
    pub status: WorkflowStatus,
    pub message: String,
    pub period: Period,
    pub dry_run: bool,
    pub priorities: ExtractedPriorities,
    pub stats: WorkflowStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes_url: Option<String>,
}

impl WorkflowResult {
    fn new(period: Period, dry_run: bool, status: WorkflowStatus, message: String) -> Self {
        Self {
            success: status != WorkflowStatus::NoData,
            status,
            message,
            period,
            dry_run,
            priorities: ExtractedPriorities::empty(),
            stats: WorkflowStats::default(),
            notes_url: None,
        }
    }

    pub fn created_total(&self) -> usize {
        self.stats.created.total()
    }
}

pub struct PriorityWorkflow {
    registry: ServiceRegistry,
    config: PriorityConfig,
}

impl PriorityWorkflow {
    pub fn new(registry: ServiceRegistry, config: PriorityConfig) -> Self {
        Self { registry, config }
    }

    /// Run the workflow for `period`. With `dry_run`, nothing is written.
    pub async fn run(&self, period: Period, dry_run: bool) -> WorkflowResult {
        info!(period = %period, dry_run, "Running priority detection");

        let transcripts = self.fetch_transcripts(period).await;
        if transcripts.is_empty() {
            warn!(period = %period, "No transcripts found");
            return WorkflowResult::new(period, dry_run, WorkflowStatus::NoData, "no data".into());
        }

        let priorities = match &self.registry.extractor {
            Some(extractor) => extractor.extract(&transcripts, period).await,
            None => {
                warn!("No extractor configured");
                ExtractedPriorities::empty()
            }
        };
        let detected = priorities.total();
        info!(detected, "Detected priorities");

        if detected == 0 {
            let mut result = WorkflowResult::new(
                period,
                dry_run,
                WorkflowStatus::NoPriorities,
                "no priorities".into(),
            );
            result.stats.transcripts_analyzed = transcripts.len();
            return result;
        }

        let mut stats = WorkflowStats {
            transcripts_analyzed: transcripts.len(),
            priorities_detected: detected,
            ..Default::default()
        };
        let mut notes_url = None;

        if dry_run {
            info!("Dry run: skipping record creation");
        } else {
            self.create_records(&priorities, &mut stats).await;
            notes_url = self.registry.notes.as_ref().and_then(|n| n.database_url());
            info!(
                created = stats.created.total(),
                failed = stats.failed,
                "Created priority records"
            );
        }

        let mut result = WorkflowResult::new(
            period,
            dry_run,
            WorkflowStatus::Completed,
            format!(
                "Analyzed {} transcripts, detected {} priorities",
                stats.transcripts_analyzed, detected
            ),
        );
        result.priorities = priorities;
        result.stats = stats;
        result.notes_url = notes_url;
        result
    }

    /// Fetch and reduce transcripts. A fetch failure reads as no data.
    async fn fetch_transcripts(&self, period: Period) -> Vec<TranscriptText> {
        let Some(source) = &self.registry.transcripts else {
            warn!("Transcript source not connected");
            return Vec::new();
        };

        let query = TranscriptQuery::lifelogs(period.lookback_days());
        match source
            .fetch_transcripts(query, self.config.transcript_limit)
            .await
        {
            Ok(transcripts) => {
                info!(count = transcripts.len(), "Retrieved transcripts");
                transcripts.iter().filter_map(map_transcript_text).collect()
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch transcripts");
                Vec::new()
            }
        }
    }

    async fn create_records(&self, priorities: &ExtractedPriorities, stats: &mut WorkflowStats) {
        let Some(notes) = &self.registry.notes else {
            warn!("Notes store not connected, no records created");
            stats.failed = priorities.total();
            return;
        };

        for item in priorities.iter() {
            let record = map_candidate(item);
            match notes.create_record(&record, &[]).await {
                Ok(Some(_)) => stats.created.record(item.category),
                Ok(None) => {
                    warn!(title = %item.title, "Notes store returned no record");
                    stats.failed += 1;
                }
                Err(e) => {
                    warn!(title = %item.title, error = %e, "Failed to create priority record");
                    stats.failed += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NexusError;
    use crate::traits::{MockExtractor, MockNotesStore, MockTranscriptSource};
    use crate::types::{
        CandidateCategory, CandidateItem, RecordHandle, RecordKind, RemoteTranscript,
        TranscriptFeed, TranscriptWindow,
    };
    use std::sync::Arc;

    fn transcripts_source(count: usize) -> MockTranscriptSource {
        let mut source = MockTranscriptSource::new();
        source.expect_fetch_transcripts().returning(move |_, _| {
            Ok((0..count)
                .map(|i| RemoteTranscript {
                    title: Some(format!("Conversation {}", i)),
                    transcript: Some("I'll send the report by Friday".to_string()),
                    ..Default::default()
                })
                .collect())
        });
        source
    }

    fn priorities(commitments: usize, requests: usize, deadlines: usize) -> ExtractedPriorities {
        let mut result = ExtractedPriorities::empty();
        for i in 0..commitments {
            result.push(CandidateItem::new(CandidateCategory::Commitment, format!("c{}", i)));
        }
        for i in 0..requests {
            result.push(CandidateItem::new(CandidateCategory::Request, format!("r{}", i)));
        }
        for i in 0..deadlines {
            result.push(CandidateItem::new(CandidateCategory::Deadline, format!("d{}", i)));
        }
        result
    }

    fn extractor_returning(result: ExtractedPriorities) -> MockExtractor {
        let mut extractor = MockExtractor::new();
        extractor
            .expect_extract()
            .times(1)
            .returning(move |_, _| result.clone());
        extractor
    }

    fn handle() -> Option<RecordHandle> {
        Some(RecordHandle {
            id: "page".to_string(),
            url: None,
        })
    }

    #[tokio::test]
    async fn test_no_transcripts_is_no_data() {
        let mut extractor = MockExtractor::new();
        extractor.expect_extract().never();

        let registry = ServiceRegistry::new()
            .with_transcripts(Arc::new(transcripts_source(0)))
            .with_extractor(Arc::new(extractor));
        let workflow = PriorityWorkflow::new(registry, PriorityConfig::default());

        let result = workflow.run(Period::Today, false).await;
        assert!(!result.success);
        assert_eq!(result.status, WorkflowStatus::NoData);
        assert_eq!(result.message, "no data");
        assert!(result.priorities.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_no_data() {
        let mut source = MockTranscriptSource::new();
        source
            .expect_fetch_transcripts()
            .returning(|_, _| Err(NexusError::transcripts("503")));
        let registry = ServiceRegistry::new().with_transcripts(Arc::new(source));
        let workflow = PriorityWorkflow::new(registry, PriorityConfig::default());

        let result = workflow.run(Period::Week, false).await;
        assert_eq!(result.status, WorkflowStatus::NoData);
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_period_sets_lookback() {
        let mut source = MockTranscriptSource::new();
        source
            .expect_fetch_transcripts()
            .withf(|query, limit| {
                query.feed == TranscriptFeed::Lifelogs
                    && query.window == TranscriptWindow::LastDays(7)
                    && *limit == 100
            })
            .times(1)
            .returning(|_, _| Ok(vec![]));
        let registry = ServiceRegistry::new().with_transcripts(Arc::new(source));
        let workflow = PriorityWorkflow::new(registry, PriorityConfig::default());

        workflow.run(Period::Week, true).await;
    }

    #[tokio::test]
    async fn test_zero_priorities_is_success() {
        let registry = ServiceRegistry::new()
            .with_transcripts(Arc::new(transcripts_source(2)))
            .with_extractor(Arc::new(extractor_returning(priorities(0, 0, 0))));
        let workflow = PriorityWorkflow::new(registry, PriorityConfig::default());

        let result = workflow.run(Period::Today, false).await;
        assert!(result.success);
        assert_eq!(result.status, WorkflowStatus::NoPriorities);
        assert_eq!(result.stats.transcripts_analyzed, 2);
        assert_eq!(result.stats.priorities_detected, 0);
    }

    #[tokio::test]
    async fn test_creates_one_record_per_candidate() {
        let mut notes = MockNotesStore::new();
        notes
            .expect_create_record()
            .times(3)
            .returning(|record, children| {
                assert!(children.is_empty());
                assert!(record.kind.is_todo());
                Ok(handle())
            });
        notes
            .expect_database_url()
            .return_const(Some("https://notion.so/abc".to_string()));

        let registry = ServiceRegistry::new()
            .with_transcripts(Arc::new(transcripts_source(1)))
            .with_extractor(Arc::new(extractor_returning(priorities(2, 1, 0))))
            .with_notes(Arc::new(notes));
        let workflow = PriorityWorkflow::new(registry, PriorityConfig::default());

        let result = workflow.run(Period::Today, false).await;
        assert!(result.success);
        assert_eq!(result.status, WorkflowStatus::Completed);
        assert_eq!(result.stats.priorities_detected, 3);
        assert_eq!(result.stats.created.commitments, 2);
        assert_eq!(result.stats.created.requests, 1);
        assert_eq!(result.created_total(), 3);
        assert_eq!(result.notes_url.as_deref(), Some("https://notion.so/abc"));
        assert!(!result.dry_run);
    }

    #[tokio::test]
    async fn test_partial_creation_failure_still_succeeds() {
        let mut notes = MockNotesStore::new();
        notes
            .expect_create_record()
            .times(3)
            .returning(|record, _| match record.title.as_str() {
                "c1" => Err(NexusError::notes("validation failed")),
                "d0" => Ok(None),
                _ => Ok(handle()),
            });
        notes.expect_database_url().return_const(None::<String>);

        let registry = ServiceRegistry::new()
            .with_transcripts(Arc::new(transcripts_source(1)))
            .with_extractor(Arc::new(extractor_returning(priorities(2, 0, 1))))
            .with_notes(Arc::new(notes));
        let workflow = PriorityWorkflow::new(registry, PriorityConfig::default());

        let result = workflow.run(Period::Today, false).await;
        assert!(result.success);
        assert_eq!(result.created_total(), 1);
        assert_eq!(result.stats.failed, 2);
        assert_eq!(
            result.created_total() + result.stats.failed,
            result.stats.priorities_detected
        );
    }

    #[tokio::test]
    async fn test_dry_run_creates_nothing() {
        let mut notes = MockNotesStore::new();
        notes.expect_create_record().never();

        let registry = ServiceRegistry::new()
            .with_transcripts(Arc::new(transcripts_source(1)))
            .with_extractor(Arc::new(extractor_returning(priorities(1, 1, 1))))
            .with_notes(Arc::new(notes));
        let workflow = PriorityWorkflow::new(registry, PriorityConfig::default());

        let result = workflow.run(Period::Week, true).await;
        assert!(result.success);
        assert!(result.dry_run);
        assert_eq!(result.created_total(), 0);
        assert_eq!(result.stats.priorities_detected, 3);
        assert!(result.notes_url.is_none());
    }

    #[tokio::test]
    async fn test_missing_notes_store_counts_failures() {
        let registry = ServiceRegistry::new()
            .with_transcripts(Arc::new(transcripts_source(1)))
            .with_extractor(Arc::new(extractor_returning(priorities(1, 0, 1))));
        let workflow = PriorityWorkflow::new(registry, PriorityConfig::default());

        let result = workflow.run(Period::Today, false).await;
        assert!(result.success);
        assert_eq!(result.created_total(), 0);
        assert_eq!(result.stats.failed, 2);
    }

    #[test]
    fn test_deadline_candidate_maps_to_deadline_record() {
        let item = CandidateItem::new(CandidateCategory::Deadline, "Renew domain");
        assert_eq!(map_candidate(&item).kind, RecordKind::Deadline);
    }
}
