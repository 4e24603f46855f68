//! Notion client: database pages for events, meetings and to-dos.

mod blocks;

pub use blocks::{
    chunk_text, meeting_children, page_properties, stored_record, MAX_CHILDREN_PER_REQUEST,
    RICH_TEXT_LIMIT,
};

use async_trait::async_trait;
use reqwest::header::HeaderValue;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use nexus_core::config::NotionConfig;
use nexus_core::error::{NexusError, NexusResult};
use nexus_core::traits::NotesStore;
use nexus_core::types::{
    ActionItem, NotesRecord, RecordFilter, RecordHandle, RecordKind, StoredRecord,
};

use crate::http::{bearer_headers, HttpClient, RetryPolicy, Service};

#[derive(Debug, Deserialize)]
struct PageResponse {
    id: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
}

/// Client for the Notion API.
pub struct NotionClient {
    http: HttpClient,
    endpoint: String,
    database_id: Option<String>,
    todo_database_id: Option<String>,
    page_size: u32,
}

impl NotionClient {
    /// Requires `notion.api_token` and at least one database id.
    pub fn new(config: &NotionConfig) -> NexusResult<Self> {
        let token = config
            .api_token
            .clone()
            .filter(|t| !t.is_empty())
            .map(SecretString::new)
            .ok_or_else(|| NexusError::Configuration("notion.api_token is not set".to_string()))?;
        if config.database_id.is_none() && config.todo_database_id.is_none() {
            return Err(NexusError::Configuration(
                "notion.database_id is not set".to_string(),
            ));
        }

        let mut headers = bearer_headers(&token)?;
        headers.insert(
            "Notion-Version",
            HeaderValue::from_str(&config.api_version).map_err(|_| {
                NexusError::Configuration("Invalid notion.api_version".to_string())
            })?,
        );

        Ok(Self {
            http: HttpClient::new(Service::Notion, config.timeout_secs, headers)?,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            database_id: config.database_id.clone(),
            todo_database_id: config.todo_database_id.clone(),
            page_size: config.page_size,
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.http.set_retry(retry);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    /// To-dos go to the to-do database when one is set; everything else to
    /// the main database.
    fn database_for(&self, kind: Option<RecordKind>) -> NexusResult<&str> {
        let id = match kind {
            Some(kind) if kind.is_todo() => {
                self.todo_database_id.as_ref().or(self.database_id.as_ref())
            }
            _ => self.database_id.as_ref(),
        };
        id.map(String::as_str).ok_or_else(|| {
            NexusError::validation_with_suggestion(
                "no Notion database configured for this record type",
                "Set notion.database_id",
            )
        })
    }

    /// Page creation payload, plus the child blocks that did not fit in it.
    fn page_body(
        &self,
        database_id: &str,
        record: &NotesRecord,
        children: &[ActionItem],
    ) -> (Value, Vec<Value>) {
        let mut body = json!({
            "parent": { "database_id": database_id },
            "properties": page_properties(record),
        });
        let mut overflow = Vec::new();
        if record.kind == RecordKind::Meeting {
            let mut blocks = meeting_children(record, children);
            if blocks.len() > MAX_CHILDREN_PER_REQUEST {
                overflow = blocks.split_off(MAX_CHILDREN_PER_REQUEST);
            }
            body["children"] = Value::Array(blocks);
        }
        (body, overflow)
    }

    /// Append blocks to an existing page in request-sized batches.
    ///
    /// The page already exists, so a failed batch is logged and the rest are
    /// dropped rather than failing the record.
    async fn append_children(&self, page_id: &str, blocks: Vec<Value>) {
        let url = self.url(&format!("blocks/{}/children", page_id));
        for (batch, chunk) in blocks.chunks(MAX_CHILDREN_PER_REQUEST).enumerate() {
            let request = self
                .http
                .inner()
                .patch(&url)
                .json(&json!({ "children": chunk }));
            if let Err(e) = self.http.send::<Value>(request).await {
                warn!(page_id, batch, error = %e, "Failed to append blocks to Notion page");
                return;
            }
        }
        debug!(page_id, blocks = blocks.len(), "Appended overflow blocks");
    }
}

/// Notion failures on a query carry the query code, not the create code.
fn query_error(error: NexusError) -> NexusError {
    match error {
        NexusError::Notes { message, .. } => NexusError::notes_query(message),
        other => other,
    }
}

#[async_trait]
impl NotesStore for NotionClient {
    async fn create_record(
        &self,
        record: &NotesRecord,
        children: &[ActionItem],
    ) -> NexusResult<Option<RecordHandle>> {
        let database_id = self.database_for(Some(record.kind))?;
        let (body, overflow) = self.page_body(database_id, record, children);

        let page: PageResponse = self
            .http
            .send(self.http.inner().post(self.url("pages")).json(&body))
            .await?;

        match page.id {
            Some(id) => {
                debug!(page_id = %id, kind = %record.kind, "Created Notion page");
                if !overflow.is_empty() {
                    self.append_children(&id, overflow).await;
                }
                Ok(Some(RecordHandle { id, url: page.url }))
            }
            None => {
                warn!(title = %record.title, "Notion returned a page without an id");
                Ok(None)
            }
        }
    }

    async fn query_records(&self, filter: &RecordFilter) -> NexusResult<Vec<StoredRecord>> {
        let database_id = self.database_for(filter.kind)?;
        let page_size = filter
            .limit
            .map(|l| (l as u32).clamp(1, self.page_size))
            .unwrap_or(self.page_size);

        let mut body = json!({ "page_size": page_size });
        if let Some(kind) = filter.kind {
            body["filter"] = json!({
                "property": "Type",
                "select": { "equals": kind.to_string() },
            });
        }

        let response: QueryResponse = self
            .http
            .send(
                self.http
                    .inner()
                    .post(self.url(&format!("databases/{}/query", database_id)))
                    .json(&body),
            )
            .await
            .map_err(query_error)?;

        let records: Vec<StoredRecord> =
            response.results.iter().filter_map(stored_record).collect();
        info!(count = records.len(), "Retrieved Notion records");
        Ok(records)
    }

    async fn is_connected(&self) -> bool {
        let Some(database_id) = self.database_id.as_ref().or(self.todo_database_id.as_ref())
        else {
            return false;
        };
        let probe: NexusResult<Value> = self
            .http
            .send(
                self.http
                    .inner()
                    .get(self.url(&format!("databases/{}", database_id))),
            )
            .await;
        match probe {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Notion connectivity check failed");
                false
            }
        }
    }

    fn database_url(&self) -> Option<String> {
        self.todo_database_id
            .as_ref()
            .or(self.database_id.as_ref())
            .map(|id| format!("https://notion.so/{}", id.replace('-', "")))
    }
}
