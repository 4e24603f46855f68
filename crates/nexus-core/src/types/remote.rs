//! Read-only payloads fetched from remote services.
//!
//! Every field is optional: services omit fields freely, and the mapper decides
//! which absences are tolerable.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A calendar event as returned by the calendar API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: Option<EventTime>,
    #[serde(default)]
    pub end: Option<EventTime>,
    #[serde(default)]
    pub attendees: Vec<EventAttendee>,
    #[serde(default)]
    pub html_link: Option<String>,
}

/// Start or end of an event: a timestamp, or a date for all-day events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendee {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// An attendee on a transcript, either a bare name or a person object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranscriptAttendee {
    Name(String),
    Person {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        email: Option<String>,
    },
}

impl TranscriptAttendee {
    /// Best display label, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            TranscriptAttendee::Name(name) => Some(name.as_str()),
            TranscriptAttendee::Person { name, email } => {
                name.as_deref().or(email.as_deref())
            }
        }
    }
}

/// A transcript or meeting note from the memory provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteTranscript {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, rename = "startTime")]
    pub start_time: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub attendees: Vec<TranscriptAttendee>,
    #[serde(default, alias = "actionItems")]
    pub action_items: Vec<String>,
}

impl RemoteTranscript {
    /// The text body: the first non-empty of `content`, `transcript`, `markdown`.
    pub fn body(&self) -> Option<&str> {
        [&self.content, &self.transcript, &self.markdown]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|text| !text.trim().is_empty())
    }

    /// Raw timestamp string, preferring `date` over `startTime`.
    pub fn timestamp(&self) -> Option<&str> {
        self.date.as_deref().or(self.start_time.as_deref())
    }
}

/// A recent memory entry, shown in the upcoming-context view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteMemory {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, alias = "createdAt", alias = "created_at")]
    pub date: Option<String>,
}

/// Closed time range for calendar queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window spanning `past_days` before and `future_days` after `now`.
    pub fn around(now: DateTime<Utc>, past_days: u32, future_days: u32) -> Self {
        Self {
            start: now - Duration::days(i64::from(past_days)),
            end: now + Duration::days(i64::from(future_days)),
        }
    }

    /// Window from `now` to `days` ahead.
    pub fn upcoming(now: DateTime<Utc>, days: u32) -> Self {
        Self::around(now, 0, days)
    }
}

/// Which transcript feed to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptFeed {
    /// Full conversation transcripts.
    Lifelogs,
    /// Summarized meeting notes with attendees and action items.
    MeetingNotes,
}

/// How far back to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptWindow {
    LastDays(u32),
    Date(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranscriptQuery {
    pub feed: TranscriptFeed,
    pub window: TranscriptWindow,
}

impl TranscriptQuery {
    /// Meeting notes from the last `days` days.
    pub fn meeting_notes(days: u32) -> Self {
        Self {
            feed: TranscriptFeed::MeetingNotes,
            window: TranscriptWindow::LastDays(days),
        }
    }

    /// Lifelog transcripts from the last `days` days.
    pub fn lifelogs(days: u32) -> Self {
        Self {
            feed: TranscriptFeed::Lifelogs,
            window: TranscriptWindow::LastDays(days),
        }
    }

    /// Lifelog transcripts since midnight UTC of `date`.
    ///
    /// Builds the date half of the `days_or_date` window. The cycle and the
    /// priorities workflow use day counts, so this is the entry point for
    /// callers that pin a calendar day.
    pub fn lifelogs_on(date: NaiveDate) -> Self {
        Self {
            feed: TranscriptFeed::Lifelogs,
            window: TranscriptWindow::Date(date),
        }
    }
}

/// A transcript reduced to what the extractor reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptText {
    pub title: String,
    pub date: String,
    pub text: String,
}
