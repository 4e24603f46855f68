//! Explicitly constructed set of adapters shared by the orchestrator and the
//! priority workflow.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::traits::{CalendarSource, Extractor, NotesStore, TranscriptSource};

/// Adapters available to this process. `None` means not configured.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    pub calendar: Option<Arc<dyn CalendarSource>>,
    pub transcripts: Option<Arc<dyn TranscriptSource>>,
    pub notes: Option<Arc<dyn NotesStore>>,
    pub extractor: Option<Arc<dyn Extractor>>,
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("calendar", &self.calendar.is_some())
            .field("transcripts", &self.transcripts.is_some())
            .field("notes", &self.notes.is_some())
            .field("extractor", &self.extractor.is_some())
            .finish()
    }
}

/// Result of probing one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    NotConfigured,
    Connected,
    Unreachable,
}

impl ServiceState {
    fn probe(configured: bool, reachable: bool) -> Self {
        match (configured, reachable) {
            (false, _) => ServiceState::NotConfigured,
            (true, true) => ServiceState::Connected,
            (true, false) => ServiceState::Unreachable,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ServiceState::Connected)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceState::NotConfigured => "not configured",
            ServiceState::Connected => "connected",
            ServiceState::Unreachable => "not connected",
        };
        f.pad(label)
    }
}

/// Per-service outcome of [`ServiceRegistry::connect_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub limitless: ServiceState,
    pub google_calendar: ServiceState,
    pub notion: ServiceState,
}

impl ConnectionStatus {
    pub fn any_connected(&self) -> bool {
        self.entries().iter().any(|(_, state)| state.is_connected())
    }

    pub fn entries(&self) -> [(&'static str, ServiceState); 3] {
        [
            ("limitless", self.limitless),
            ("google_calendar", self.google_calendar),
            ("notion", self.notion),
        ]
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarSource>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn with_transcripts(mut self, transcripts: Arc<dyn TranscriptSource>) -> Self {
        self.transcripts = Some(transcripts);
        self
    }

    pub fn with_notes(mut self, notes: Arc<dyn NotesStore>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn Extractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Probe every configured adapter and drop the unreachable ones.
    ///
    /// The calendar authenticates; the transcript provider and notes store run
    /// their connectivity checks.
    pub async fn connect_all(&mut self) -> ConnectionStatus {
        let transcripts_ok = match &self.transcripts {
            Some(source) => source.is_connected().await,
            None => false,
        };
        let calendar_ok = match &self.calendar {
            Some(source) => source.authenticate().await,
            None => false,
        };
        let notes_ok = match &self.notes {
            Some(store) => store.is_connected().await,
            None => false,
        };

        let status = ConnectionStatus {
            limitless: ServiceState::probe(self.transcripts.is_some(), transcripts_ok),
            google_calendar: ServiceState::probe(self.calendar.is_some(), calendar_ok),
            notion: ServiceState::probe(self.notes.is_some(), notes_ok),
        };

        for (service, state) in status.entries() {
            match state {
                ServiceState::Unreachable => warn!(service, "Service not connected"),
                _ => info!(service, status = %state, "Service status"),
            }
        }

        if !transcripts_ok {
            self.transcripts = None;
        }
        if !calendar_ok {
            self.calendar = None;
        }
        if !notes_ok {
            self.notes = None;
        }

        status
    }
}
