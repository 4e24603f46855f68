//! Notes records: the common shape every service payload is mapped into.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use super::CandidateCategory;

/// Category of a notes record, written to the store's `Type` select.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum RecordKind {
    #[strum(serialize = "Calendar Event")]
    #[serde(rename = "Calendar Event")]
    CalendarEvent,
    Meeting,
    Commitment,
    Request,
    Deadline,
    Task,
}

impl RecordKind {
    /// Whether records of this kind go to the to-do database.
    pub fn is_todo(&self) -> bool {
        matches!(
            self,
            RecordKind::Commitment | RecordKind::Request | RecordKind::Deadline
        )
    }
}

impl From<CandidateCategory> for RecordKind {
    fn from(category: CandidateCategory) -> Self {
        match category {
            CandidateCategory::Commitment => RecordKind::Commitment,
            CandidateCategory::Request => RecordKind::Request,
            CandidateCategory::Deadline => RecordKind::Deadline,
        }
    }
}

/// Workflow status of a to-do record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
pub enum RecordStatus {
    #[default]
    #[strum(serialize = "To Do")]
    #[serde(rename = "To Do")]
    ToDo,
    #[strum(serialize = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

/// An action item attached to a meeting record as a to-do child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub text: String,
    #[serde(default)]
    pub checked: bool,
}

impl ActionItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            checked: false,
        }
    }
}

/// A record ready to be written to the notes store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotesRecord {
    pub title: String,
    pub kind: RecordKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    /// Free-text body (event description, meeting notes, item description).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<String>,
}

impl NotesRecord {
    /// Create a record with only a title and kind set.
    pub fn new(kind: RecordKind, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind,
            status: None,
            body: None,
            source: None,
            confidence: None,
            due_date: None,
            date: None,
            attendees: Vec::new(),
        }
    }
}

/// Handle returned by the store for a created record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordHandle {
    /// Store-assigned identifier.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A record read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub external_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Filter for querying the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub kind: Option<RecordKind>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    /// Match records of one kind.
    pub fn kind(kind: RecordKind) -> Self {
        Self {
            kind: Some(kind),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
