//! Notes store trait.

use async_trait::async_trait;

use crate::error::NexusResult;
use crate::types::{ActionItem, NotesRecord, RecordFilter, RecordHandle, StoredRecord};

/// Write access to the structured-notes database.
///
/// Records are only ever created, never updated.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotesStore: Send + Sync {
    /// Create a record, with `children` attached as to-do sub-items.
    ///
    /// `Ok(None)` means the store accepted the call but returned no record;
    /// callers count it as a failed write.
    async fn create_record(
        &self,
        record: &NotesRecord,
        children: &[ActionItem],
    ) -> NexusResult<Option<RecordHandle>>;

    async fn query_records(&self, filter: &RecordFilter) -> NexusResult<Vec<StoredRecord>>;

    /// Connectivity probe.
    async fn is_connected(&self) -> bool;

    /// Browser URL of the database detected priorities are written to.
    fn database_url(&self) -> Option<String>;
}
