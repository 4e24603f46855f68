//! Cross-service synchronization.

mod context;
mod orchestrator;
mod registry;

pub use context::UpcomingContext;
pub use orchestrator::{SyncCycle, SyncService};
pub use registry::{ConnectionStatus, ServiceRegistry, ServiceState};
