//! Calendar source trait.

use async_trait::async_trait;

use crate::error::NexusResult;
use crate::types::{RemoteEvent, TimeWindow};

/// Read access to a calendar.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Load or refresh credentials. Returns whether the source is usable.
    async fn authenticate(&self) -> bool;

    /// Events overlapping `window`, ordered by start time.
    async fn fetch_events(&self, window: TimeWindow) -> NexusResult<Vec<RemoteEvent>>;

    /// Events from now until `days` ahead.
    async fn fetch_upcoming(&self, days: u32) -> NexusResult<Vec<RemoteEvent>>;

    /// Whether a previous `authenticate` succeeded.
    fn is_connected(&self) -> bool;
}
