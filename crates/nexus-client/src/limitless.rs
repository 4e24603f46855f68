//! Limitless client: lifelogs, meeting notes and memories.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::{info, warn};

use nexus_core::config::LimitlessConfig;
use nexus_core::error::{NexusError, NexusResult};
use nexus_core::traits::TranscriptSource;
use nexus_core::types::{
    RemoteMemory, RemoteTranscript, TranscriptFeed, TranscriptQuery, TranscriptWindow,
};

use crate::http::{bearer_headers, HttpClient, RetryPolicy, Service};

const SINCE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Deserialize)]
struct LifelogsResponse {
    #[serde(default)]
    lifelogs: Vec<RemoteTranscript>,
}

#[derive(Debug, Deserialize)]
struct NotesResponse {
    #[serde(default)]
    notes: Vec<RemoteTranscript>,
}

#[derive(Debug, Deserialize)]
struct MemoriesResponse {
    #[serde(default)]
    memories: Vec<RemoteMemory>,
}

/// Client for the Limitless API.
pub struct LimitlessClient {
    http: HttpClient,
    endpoint: String,
}

impl LimitlessClient {
    /// Requires `limitless.api_key`.
    pub fn new(config: &LimitlessConfig) -> NexusResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .map(SecretString::new)
            .ok_or_else(|| NexusError::Configuration("limitless.api_key is not set".to_string()))?;

        let http = HttpClient::new(
            Service::Limitless,
            config.timeout_secs,
            bearer_headers(&api_key)?,
        )?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.http.set_retry(retry);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    async fn lifelogs(&self, since: String, limit: usize) -> NexusResult<Vec<RemoteTranscript>> {
        info!(since = %since, limit, "Fetching lifelogs");
        let response: LifelogsResponse = self
            .http
            .get_json(
                &self.url("lifelogs"),
                &[
                    ("since", since),
                    ("limit", limit.to_string()),
                    ("include_transcripts", "true".to_string()),
                ],
                None,
            )
            .await?;
        info!(count = response.lifelogs.len(), "Retrieved lifelogs");
        Ok(response.lifelogs)
    }

    async fn meeting_notes(&self, days: u32, limit: usize) -> NexusResult<Vec<RemoteTranscript>> {
        let response: NotesResponse = self
            .http
            .get_json(
                &self.url("meetings/notes"),
                &[("days", days.to_string())],
                None,
            )
            .await?;
        info!(count = response.notes.len(), "Retrieved meeting notes");
        Ok(response.notes.into_iter().take(limit).collect())
    }
}

fn since_days(days: u32) -> String {
    (Utc::now() - Duration::days(i64::from(days)))
        .format(SINCE_FORMAT)
        .to_string()
}

fn since_date(date: NaiveDate) -> String {
    format!("{}T00:00:00Z", date.format("%Y-%m-%d"))
}

#[async_trait]
impl TranscriptSource for LimitlessClient {
    async fn fetch_transcripts(
        &self,
        query: TranscriptQuery,
        limit: usize,
    ) -> NexusResult<Vec<RemoteTranscript>> {
        match (query.feed, query.window) {
            (TranscriptFeed::Lifelogs, TranscriptWindow::LastDays(days)) => {
                self.lifelogs(since_days(days), limit).await
            }
            (TranscriptFeed::Lifelogs, TranscriptWindow::Date(date)) => {
                self.lifelogs(since_date(date), limit).await
            }
            (TranscriptFeed::MeetingNotes, TranscriptWindow::LastDays(days)) => {
                self.meeting_notes(days, limit).await
            }
            (TranscriptFeed::MeetingNotes, TranscriptWindow::Date(date)) => {
                // the notes endpoint only takes a lookback
                let days = (Utc::now().date_naive() - date).num_days().max(1);
                self.meeting_notes(u32::try_from(days).unwrap_or(u32::MAX), limit)
                    .await
            }
        }
    }

    async fn recent_memories(&self, days: u32, limit: usize) -> NexusResult<Vec<RemoteMemory>> {
        let response: MemoriesResponse = self
            .http
            .get_json(
                &self.url("memories"),
                &[("since", since_days(days)), ("limit", limit.to_string())],
                None,
            )
            .await?;
        info!(count = response.memories.len(), "Retrieved memories");
        Ok(response.memories)
    }

    async fn is_connected(&self) -> bool {
        let probe: NexusResult<LifelogsResponse> = self
            .http
            .send(
                self.http
                    .inner()
                    .get(self.url("lifelogs"))
                    .query(&[("limit", "1")]),
            )
            .await;
        match probe {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Limitless connectivity check failed");
                false
            }
        }
    }
}
