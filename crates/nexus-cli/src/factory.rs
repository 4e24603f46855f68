//! Build adapters from configuration.

use std::sync::Arc;

use nexus_client::{GoogleCalendarClient, LimitlessClient, NotionClient};
use nexus_core::error::NexusResult;
use nexus_core::traits::{CalendarSource, Extractor, NotesStore, TranscriptSource};
use nexus_core::{LlmExtractor, NexusConfig, ServiceRegistry};
use nexus_llm::LlmFactory;
use tracing::{debug, warn};

/// Which adapters a command needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Needs {
    pub calendar: bool,
    pub transcripts: bool,
    pub notes: bool,
    pub extractor: bool,
}

impl Needs {
    pub const SYNC: Needs = Needs {
        calendar: true,
        transcripts: true,
        notes: true,
        extractor: false,
    };

    pub const CONTEXT: Needs = Needs {
        calendar: true,
        transcripts: true,
        notes: true,
        extractor: false,
    };

    pub const PRIORITIES: Needs = Needs {
        calendar: false,
        transcripts: true,
        notes: true,
        extractor: true,
    };
}

/// Construct every needed adapter whose section is configured.
///
/// A section that is configured but fails to build is logged and left out,
/// the same as an unconfigured one.
pub fn build_registry(config: &NexusConfig, needs: Needs) -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();

    if needs.transcripts {
        registry.transcripts = build("limitless", config.limitless.is_configured(), || {
            Ok(Arc::new(LimitlessClient::new(&config.limitless)?) as Arc<dyn TranscriptSource>)
        });
    }
    if needs.calendar {
        registry.calendar = build(
            "google_calendar",
            config.google_calendar.is_configured(),
            || {
                Ok(Arc::new(GoogleCalendarClient::new(config.google_calendar.clone())?)
                    as Arc<dyn CalendarSource>)
            },
        );
    }
    if needs.notes {
        registry.notes = build("notion", config.notion.is_configured(), || {
            Ok(Arc::new(NotionClient::new(&config.notion)?) as Arc<dyn NotesStore>)
        });
    }
    if needs.extractor {
        registry.extractor = build("anthropic", config.anthropic.is_configured(), || {
            let llm = LlmFactory::anthropic(config.anthropic.clone())?;
            Ok(Arc::new(LlmExtractor::new(llm).with_max_tokens(config.anthropic.max_tokens))
                as Arc<dyn Extractor>)
        });
    }

    registry
}

fn build<T: ?Sized>(
    service: &'static str,
    configured: bool,
    make: impl FnOnce() -> NexusResult<Arc<T>>,
) -> Option<Arc<T>> {
    if !configured {
        debug!(service, "Service not configured");
        return None;
    }
    match make() {
        Ok(adapter) => Some(adapter),
        Err(e) => {
            warn!(service, error = %e, "Failed to set up service");
            None
        }
    }
}
