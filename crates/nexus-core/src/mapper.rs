//! Pure transformations from service payloads to notes records.
//!
//! Nothing here reads the clock or does I/O. Where a default timestamp is
//! needed, the caller passes `now`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use crate::types::{
    ActionItem, CandidateCategory, CandidateItem, NotesRecord, RecordKind, RecordStatus,
    RemoteEvent, RemoteTranscript, TranscriptText,
};

/// Title for events without a summary.
pub const UNTITLED_EVENT: &str = "Untitled Event";
/// Title for meeting notes without one.
pub const DEFAULT_NOTE_TITLE: &str = "Meeting Note";
/// Title for transcripts handed to the extractor without one.
pub const UNTITLED: &str = "Untitled";

/// Store limit for rich-text bodies.
pub const MAX_BODY_CHARS: usize = 2000;
/// Store limit for provenance strings.
pub const MAX_SOURCE_CHARS: usize = 1000;

/// A mandatory field could not be derived; the record is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("event '{id}' has no start time")]
    MissingStart { id: String },

    #[error("event '{id}' has an unparseable start time '{value}'")]
    InvalidStart { id: String, value: String },
}

/// Map a calendar event to a "Calendar Event" record.
pub fn map_event(event: &RemoteEvent) -> Result<NotesRecord, MappingError> {
    let id = event.id.clone().unwrap_or_default();
    let start = event
        .start
        .as_ref()
        .ok_or_else(|| MappingError::MissingStart { id: id.clone() })?;

    let date = match (start.date_time.as_deref(), start.date.as_deref()) {
        (Some(value), _) => parse_timestamp(value).ok_or_else(|| MappingError::InvalidStart {
            id: id.clone(),
            value: value.to_string(),
        })?,
        (None, Some(value)) => parse_date(value).ok_or_else(|| MappingError::InvalidStart {
            id: id.clone(),
            value: value.to_string(),
        })?,
        (None, None) => return Err(MappingError::MissingStart { id }),
    };

    let mut record = NotesRecord::new(
        RecordKind::CalendarEvent,
        non_empty(event.summary.as_deref()).unwrap_or(UNTITLED_EVENT),
    );
    record.date = Some(date);
    record.body =
        non_empty(event.description.as_deref()).map(|d| truncate_chars(d, MAX_BODY_CHARS));
    Ok(record)
}

/// Map a meeting note to a "Meeting" record plus its action items.
///
/// Total: every missing field has a default, and an absent or unparseable
/// date becomes `now`.
pub fn map_transcript_note(
    note: &RemoteTranscript,
    now: DateTime<Utc>,
) -> (NotesRecord, Vec<ActionItem>) {
    let mut record = NotesRecord::new(
        RecordKind::Meeting,
        non_empty(note.title.as_deref()).unwrap_or(DEFAULT_NOTE_TITLE),
    );
    record.date = Some(note.timestamp().and_then(parse_any).unwrap_or(now));
    record.attendees = note
        .attendees
        .iter()
        .filter_map(|a| a.label())
        .filter_map(|label| non_empty(Some(label)))
        .map(str::to_string)
        .collect();
    record.body = Some(note.body().unwrap_or_default().to_string());

    let actions = note
        .action_items
        .iter()
        .filter_map(|item| non_empty(Some(item.as_str())))
        .map(ActionItem::new)
        .collect();

    (record, actions)
}

/// Reduce a transcript to extractor input. Transcripts without text are dropped.
pub fn map_transcript_text(transcript: &RemoteTranscript) -> Option<TranscriptText> {
    let text = transcript.body()?;
    Some(TranscriptText {
        title: non_empty(transcript.title.as_deref())
            .unwrap_or(UNTITLED)
            .to_string(),
        date: non_empty(transcript.timestamp())
            .unwrap_or("Unknown date")
            .to_string(),
        text: text.to_string(),
    })
}

/// Map a detected priority to a to-do record.
pub fn map_candidate(item: &CandidateItem) -> NotesRecord {
    let mut record = NotesRecord::new(RecordKind::from(item.category), item.title.clone());
    record.status = Some(RecordStatus::ToDo);
    record.body =
        non_empty(Some(item.description.as_str())).map(|d| truncate_chars(d, MAX_BODY_CHARS));
    record.source =
        non_empty(Some(item.source.as_str())).map(|s| truncate_chars(s, MAX_SOURCE_CHARS));
    record.confidence = Some(item.confidence());
    if item.category == CandidateCategory::Deadline {
        record.due_date = item.due_date;
    }
    record
}

/// Truncate to at most `max` characters, on a char boundary.
pub fn truncate_chars(value: &str, max: usize) -> String {
    match value.char_indices().nth(max) {
        Some((idx, _)) => value[..idx].to_string(),
        None => value.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// RFC 3339 timestamp, or a naive ISO timestamp taken as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// All-day date at midnight UTC.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_any(value: &str) -> Option<DateTime<Utc>> {
    parse_timestamp(value).or_else(|| parse_date(value))
}
