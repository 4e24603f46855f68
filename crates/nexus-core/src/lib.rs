//! nexus-core - Core library for nexus.
//!
//! This crate holds the types, adapter traits, configuration and workflows
//! that keep a notes database in step with a calendar and a stream of
//! conversation transcripts.
//!
//! # Example
//!
//! ```ignore
//! use nexus_core::{ContinuousSync, NexusConfig, ServiceRegistry, SyncService};
//!
//! let config = NexusConfig::load(None)?;
//! let mut registry = ServiceRegistry::new()
//!     .with_calendar(calendar)
//!     .with_transcripts(transcripts)
//!     .with_notes(notes);
//! registry.connect_all().await;
//!
//! let service = Arc::new(SyncService::new(registry, config.sync.clone()));
//! let scheduler = ContinuousSync::new(service, (&config.sync).into());
//! scheduler.run(cancel).await;
//! ```

pub mod config;
pub mod error;
pub mod mapper;
pub mod priorities;
pub mod report;
pub mod scheduler;
pub mod sync;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{NexusConfig, NexusConfigBuilder};
pub use error::{ErrorCode, NexusError, NexusResult};
pub use mapper::MappingError;
pub use priorities::{
    LlmExtractor, PriorityWorkflow, WorkflowResult, WorkflowStats, WorkflowStatus,
};
pub use scheduler::{ContinuousSync, SchedulerConfig, SchedulerStats};
pub use sync::{
    ConnectionStatus, ServiceRegistry, ServiceState, SyncCycle, SyncService, UpcomingContext,
};
pub use traits::{CalendarSource, Extractor, Llm, LlmConfig, NotesStore, TranscriptSource};
pub use types::{
    CandidateCategory, CandidateItem, CycleResult, ExtractedPriorities, Message, MessageRole,
    NotesRecord, Period, RecordKind, StepOutcome, SyncSource,
};
