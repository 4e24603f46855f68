//! Human-readable output: sync summaries, priority reports, context listings.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::priorities::WorkflowResult;
use crate::sync::UpcomingContext;
use crate::types::{CandidateCategory, CandidateItem, CycleResult, StepOutcome, SyncSource};

/// Items shown per section of the context listing.
pub const CONTEXT_PREVIEW: usize = 5;

/// One-paragraph summary of a sync cycle.
pub fn cycle_summary(result: &CycleResult) -> String {
    let mut out = String::from("Sync cycle summary\n");
    for source in [SyncSource::Calendar, SyncSource::Transcripts] {
        let name: &'static str = source.into();
        let line = match result.outcome(source) {
            Some(StepOutcome::Synced(stats)) => format!(
                "  {:<12} {} synced, {} skipped, {} errors",
                name, stats.synced, stats.skipped, stats.errors
            ),
            Some(StepOutcome::Skipped { reason }) => {
                format!("  {:<12} skipped ({})", name, reason)
            }
            Some(StepOutcome::Failed { error }) => format!("  {:<12} failed: {}", name, error),
            None => format!("  {:<12} not run", name),
        };
        let _ = writeln!(out, "{}", line);
    }
    let _ = writeln!(
        out,
        "  total: {} synced, {} skipped, {} errors",
        result.total_synced(),
        result.skipped_count(),
        result.error_count()
    );
    if let Some(elapsed) = result.elapsed() {
        let _ = writeln!(
            out,
            "  elapsed: {:.1}s",
            elapsed.num_milliseconds() as f64 / 1000.0
        );
    }
    out
}

/// Markdown report of a priority workflow run.
///
/// Items below `low_confidence` are annotated with their confidence.
pub fn priorities_report(result: &WorkflowResult, today: NaiveDate, low_confidence: f32) -> String {
    let mut lines = vec![
        format!(
            "## Priorities for {} - {}",
            result.period.describe(),
            today.format("%d %B %Y")
        ),
        String::new(),
    ];

    for category in CandidateCategory::all() {
        let items = result.priorities.items(category);
        if items.is_empty() {
            continue;
        }
        lines.push(format!("### {}", category.heading()));
        lines.extend(items.iter().map(|item| priority_line(item, low_confidence)));
        lines.push(String::new());
    }

    lines.push("---".to_string());
    lines.push(String::new());

    let stats = &result.stats;
    if stats.priorities_detected == 0 {
        lines.push("No priorities detected for this period".to_string());
    } else if result.dry_run {
        lines.push(format!(
            "DRY-RUN: {} priorities detected (not created)",
            stats.priorities_detected
        ));
    } else {
        lines.push(format!("{} TODOs created", stats.created.total()));
        if stats.failed > 0 {
            lines.push(format!("{} TODOs could not be created", stats.failed));
        }
        if let Some(url) = &result.notes_url {
            lines.push(format!("View in Notion: {}", url));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Statistics: {} transcripts analyzed",
        stats.transcripts_analyzed
    ));
    lines.join("\n")
}

fn priority_line(item: &CandidateItem, low_confidence: f32) -> String {
    let mut line = format!("- [ ] {}", item.title);
    if item.category == CandidateCategory::Deadline {
        if let Some(due) = item.due_date {
            let _ = write!(line, " (deadline: {})", due.format("%Y-%m-%d"));
        }
        if !item.source.is_empty() {
            let _ = write!(line, " [{}]", item.source);
        }
    } else if !item.source.is_empty() {
        let _ = write!(line, " ({})", item.source);
    }
    if item.confidence() < low_confidence {
        let _ = write!(
            line,
            " [confidence: {}%]",
            (item.confidence() * 100.0).round() as u32
        );
    }
    line
}

/// Listing of the upcoming context, first few entries per source.
pub fn context_summary(context: &UpcomingContext, days: u32) -> String {
    let mut out = format!("Context for the next {} days\n", days);

    let _ = writeln!(
        out,
        "\nCalendar events ({}):",
        context.calendar_events.len()
    );
    for event in context.calendar_events.iter().take(CONTEXT_PREVIEW) {
        let start = event
            .start
            .as_ref()
            .and_then(|s| s.date_time.as_deref().or(s.date.as_deref()))
            .unwrap_or("?");
        let _ = writeln!(
            out,
            "  - {} ({})",
            event.summary.as_deref().unwrap_or("Untitled Event"),
            start
        );
    }

    let _ = writeln!(out, "\nTasks ({}):", context.tasks.len());
    for task in context.tasks.iter().take(CONTEXT_PREVIEW) {
        let status = task.status.as_deref().unwrap_or("?");
        let _ = writeln!(out, "  - {} [{}]", task.title, status);
    }

    let _ = writeln!(out, "\nRecent memories ({}):", context.memories.len());
    for memory in context.memories.iter().take(CONTEXT_PREVIEW) {
        let label = memory
            .title
            .as_deref()
            .or(memory.content.as_deref())
            .unwrap_or("Untitled");
        let _ = writeln!(out, "  - {}", label);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::priorities::{WorkflowStats, WorkflowStatus};
    use crate::types::{
        CategoryCounts, ExtractedPriorities, Period, RemoteEvent, RemoteMemory, SourceStats,
        StoredRecord,
    };
    use chrono::{Duration, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    fn result(priorities: ExtractedPriorities, dry_run: bool) -> WorkflowResult {
        let detected = priorities.total();
        let mut created = CategoryCounts::default();
        if !dry_run {
            for item in priorities.iter() {
                created.record(item.category);
            }
        }
        WorkflowResult {
            success: true,
            status: WorkflowStatus::Completed,
            message: String::new(),
            period: Period::Today,
            dry_run,
            priorities,
            stats: WorkflowStats {
                transcripts_analyzed: 4,
                priorities_detected: detected,
                created,
                failed: 0,
            },
            notes_url: Some("https://notion.so/abc123".to_string()),
        }
    }

    fn sample() -> ExtractedPriorities {
        let mut priorities = ExtractedPriorities::empty();
        priorities.push(
            CandidateItem::new(CandidateCategory::Commitment, "Send the deck")
                .with_source("call with Sam"),
        );
        priorities.push(
            CandidateItem::new(CandidateCategory::Request, "Review the budget")
                .with_confidence(0.75),
        );
        priorities.push(
            CandidateItem::new(CandidateCategory::Deadline, "File taxes")
                .with_source("accountant")
                .with_due_date(NaiveDate::from_ymd_opt(2024, 4, 15)),
        );
        priorities
    }

    #[test]
    fn test_priorities_report_sections() {
        let report = priorities_report(&result(sample(), false), today(), 0.9);

        assert!(report.starts_with("## Priorities for today - 05 March 2024"));
        assert!(report.contains("### Commitments made\n- [ ] Send the deck (call with Sam)"));
        assert!(report.contains("### Requests received\n- [ ] Review the budget [confidence: 75%]"));
        assert!(report.contains("- [ ] File taxes (deadline: 2024-04-15) [accountant]"));
        assert!(report.contains("3 TODOs created"));
        assert!(report.contains("View in Notion: https://notion.so/abc123"));
        assert!(report.ends_with("Statistics: 4 transcripts analyzed"));
    }

    #[test]
    fn test_priorities_report_dry_run() {
        let report = priorities_report(&result(sample(), true), today(), 0.9);
        assert!(report.contains("DRY-RUN: 3 priorities detected (not created)"));
        assert!(!report.contains("TODOs created"));
    }

    #[test]
    fn test_priorities_report_empty() {
        let report = priorities_report(&result(ExtractedPriorities::empty(), false), today(), 0.9);
        assert!(report.contains("No priorities detected for this period"));
        assert!(!report.contains("###"));
    }

    #[test]
    fn test_cycle_summary() {
        let start = Utc.with_ymd_and_hms(2024, 3, 5, 9, 0, 0).unwrap();
        let mut cycle = CycleResult::new(start);
        cycle.record(
            SyncSource::Calendar,
            StepOutcome::Synced(SourceStats {
                fetched: 5,
                synced: 4,
                skipped: 1,
                errors: 0,
            }),
        );
        cycle.record(
            SyncSource::Transcripts,
            StepOutcome::Skipped {
                reason: "transcripts not connected".to_string(),
            },
        );
        cycle.complete(start + Duration::milliseconds(2500));

        let summary = cycle_summary(&cycle);
        assert!(summary.contains("4 synced, 1 skipped, 0 errors"));
        assert!(summary.contains("skipped (transcripts not connected)"));
        assert!(summary.contains("elapsed: 2.5s"));
    }

    #[test]
    fn test_context_summary_limits_preview() {
        let context = UpcomingContext {
            calendar_events: (0..8)
                .map(|i| RemoteEvent {
                    summary: Some(format!("Event {}", i)),
                    ..Default::default()
                })
                .collect(),
            tasks: vec![StoredRecord {
                external_id: "t1".to_string(),
                title: "Pay invoice".to_string(),
                kind: Some("Task".to_string()),
                status: Some("To Do".to_string()),
                date: None,
                url: None,
            }],
            memories: vec![RemoteMemory {
                content: Some("Prefers morning meetings".to_string()),
                ..Default::default()
            }],
        };

        let summary = context_summary(&context, 7);
        assert!(summary.contains("Calendar events (8):"));
        assert!(summary.contains("Event 4"));
        assert!(!summary.contains("Event 5"));
        assert!(summary.contains("- Pay invoice [To Do]"));
        assert!(summary.contains("- Prefers morning meetings"));
    }
}
