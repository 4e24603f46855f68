//! Google Calendar client backed by an authorized-user token file.
//!
//! The token file is the JSON written by Google's installed-app OAuth flow
//! (`token`, `refresh_token`, `client_id`, `client_secret`, `token_uri`,
//! `expiry`). Running that flow is left to external tooling; this client
//! loads the file, refreshes an expired access token and writes it back.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use url::Url;

use nexus_core::config::GoogleCalendarConfig;
use nexus_core::error::{NexusError, NexusResult};
use nexus_core::traits::CalendarSource;
use nexus_core::types::{RemoteEvent, TimeWindow};

use crate::http::{HttpClient, RetryPolicy, Service};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// On-disk authorized-user credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizedUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    /// Fields this client does not interpret, written back untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AuthorizedUser {
    fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.token, self.expiry) {
            (None, _) => true,
            (Some(_), Some(expiry)) => expiry - Duration::seconds(EXPIRY_MARGIN_SECS) <= now,
            (Some(_), None) => false,
        }
    }

    fn can_refresh(&self) -> bool {
        self.refresh_token.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<RemoteEvent>,
}

/// Client for the Google Calendar v3 events API.
///
/// The loaded credentials are kept for the life of the client. Every request
/// first refreshes an access token that is within the expiry margin, and a
/// request rejected as unauthorized is retried once after a forced refresh.
pub struct GoogleCalendarClient {
    http: HttpClient,
    config: GoogleCalendarConfig,
    credentials: RwLock<Option<AuthorizedUser>>,
}

impl GoogleCalendarClient {
    pub fn new(config: GoogleCalendarConfig) -> NexusResult<Self> {
        let http = HttpClient::new(
            Service::GoogleCalendar,
            config.timeout_secs,
            Default::default(),
        )?;
        Ok(Self {
            http,
            config,
            credentials: RwLock::new(None),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.http.set_retry(retry);
        self
    }

    fn token_file(&self) -> &Path {
        &self.config.token_file
    }

    fn events_url(&self) -> NexusResult<Url> {
        let mut url = Url::parse(&self.config.endpoint).map_err(|e| {
            NexusError::Configuration(format!("Invalid google_calendar.endpoint: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                NexusError::Configuration("google_calendar.endpoint cannot be a base".to_string())
            })?
            .pop_if_empty()
            .extend(["calendars", self.config.calendar_id.as_str(), "events"]);
        Ok(url)
    }

    async fn load_credentials(&self) -> NexusResult<AuthorizedUser> {
        let raw = tokio::fs::read_to_string(self.token_file()).await?;
        serde_json::from_str(&raw).map_err(|e| {
            NexusError::missing_credentials(format!(
                "Invalid token file {}: {}",
                self.token_file().display(),
                e
            ))
        })
    }

    async fn save_credentials(&self, credentials: &AuthorizedUser) -> NexusResult<()> {
        let json = serde_json::to_string_pretty(credentials)?;
        tokio::fs::write(self.token_file(), json).await?;
        Ok(())
    }

    async fn refresh(&self, credentials: &mut AuthorizedUser) -> NexusResult<()> {
        let token_uri = credentials
            .token_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", credentials.refresh_token.as_deref().unwrap_or_default()),
            ("client_id", credentials.client_id.as_deref().unwrap_or_default()),
            ("client_secret", credentials.client_secret.as_deref().unwrap_or_default()),
        ];

        let response: RefreshResponse = self
            .http
            .send(self.http.inner().post(&token_uri).form(&form))
            .await?;

        credentials.token = Some(response.access_token);
        credentials.expiry = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        Ok(())
    }

    /// Refresh `credentials` in place and write them back to the token file.
    ///
    /// A rejected refresh means the stored grant is no longer usable.
    async fn refresh_and_save(&self, credentials: &mut AuthorizedUser) -> NexusResult<()> {
        if !credentials.can_refresh() {
            return Err(NexusError::expired_token(
                "Google Calendar token expired and cannot be refreshed",
            ));
        }

        info!("Refreshing Google Calendar access token");
        self.refresh(credentials).await.map_err(|e| {
            if e.is_transient() {
                e
            } else {
                NexusError::expired_token(format!("Google Calendar token refresh failed: {}", e))
            }
        })?;

        if let Err(e) = self.save_credentials(credentials).await {
            warn!(error = %e, "Failed to save refreshed Google Calendar token");
        }
        Ok(())
    }

    async fn try_authenticate(&self) -> NexusResult<()> {
        if !self.token_file().exists() {
            let hint = match &self.config.credentials_file {
                Some(path) => format!(
                    "authorize with the OAuth client in {} and save the token to {}",
                    path.display(),
                    self.token_file().display()
                ),
                None => "set google_calendar.credentials_file and authorize once".to_string(),
            };
            return Err(NexusError::missing_credentials(format!(
                "Google Calendar token file {} not found: {}",
                self.token_file().display(),
                hint
            )));
        }

        let mut credentials = self.load_credentials().await?;
        if credentials.needs_refresh(Utc::now()) {
            self.refresh_and_save(&mut credentials).await?;
        }
        if credentials.token.is_none() {
            return Err(NexusError::missing_credentials(
                "Google Calendar token file has no token",
            ));
        }

        *self.credentials.write().await = Some(credentials);
        Ok(())
    }

    /// Current access token, refreshed first when it is about to expire or
    /// when `force_refresh` is set.
    async fn access_token(&self, force_refresh: bool) -> NexusResult<SecretString> {
        if !force_refresh {
            let guard = self.credentials.read().await;
            let credentials = guard
                .as_ref()
                .ok_or_else(|| NexusError::not_connected("google_calendar"))?;
            if !credentials.needs_refresh(Utc::now()) {
                if let Some(token) = &credentials.token {
                    return Ok(SecretString::new(token.clone()));
                }
            }
        }

        let mut guard = self.credentials.write().await;
        let credentials = guard
            .as_mut()
            .ok_or_else(|| NexusError::not_connected("google_calendar"))?;
        // Another request may have refreshed while this one waited for the lock.
        if force_refresh || credentials.needs_refresh(Utc::now()) {
            self.refresh_and_save(credentials).await?;
        }
        credentials
            .token
            .clone()
            .map(SecretString::new)
            .ok_or_else(|| NexusError::missing_credentials("Google Calendar token is missing"))
    }

    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        max_results: u32,
    ) -> NexusResult<Vec<RemoteEvent>> {
        let query = [
            ("timeMin", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("timeMax", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("maxResults", max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];

        let token = self.access_token(false).await?;
        let response = match self.request_events(&token, &query).await {
            Err(NexusError::Authentication { message, .. }) => {
                warn!(error = %message, "Google Calendar rejected the access token, refreshing");
                let token = self.access_token(true).await?;
                self.request_events(&token, &query).await?
            }
            other => other?,
        };

        info!(count = response.items.len(), "Retrieved calendar events");
        Ok(response.items)
    }

    async fn request_events(
        &self,
        token: &SecretString,
        query: &[(&str, String)],
    ) -> NexusResult<EventsResponse> {
        let url = self.events_url()?;
        self.http
            .get_json(url.as_str(), query, Some(token.expose_secret()))
            .await
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarClient {
    async fn authenticate(&self) -> bool {
        match self.try_authenticate().await {
            Ok(()) => {
                info!("Authenticated with Google Calendar");
                true
            }
            Err(e) => {
                error!(error = %e, "Google Calendar authentication failed");
                false
            }
        }
    }

    async fn fetch_events(&self, window: TimeWindow) -> NexusResult<Vec<RemoteEvent>> {
        self.list_events(window.start, window.end, self.config.max_results)
            .await
    }

    async fn fetch_upcoming(&self, days: u32) -> NexusResult<Vec<RemoteEvent>> {
        let window = TimeWindow::upcoming(Utc::now(), days);
        self.list_events(window.start, window.end, self.config.upcoming_max_results)
            .await
    }

    fn is_connected(&self) -> bool {
        self.credentials
            .try_read()
            .map(|credentials| credentials.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_needs_refresh() {
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        let mut creds = AuthorizedUser {
            token: Some("t".to_string()),
            expiry: Some(now + Duration::minutes(30)),
            ..Default::default()
        };
        assert!(!creds.needs_refresh(now));

        creds.expiry = Some(now + Duration::seconds(30));
        assert!(creds.needs_refresh(now));

        creds.token = None;
        creds.expiry = None;
        assert!(creds.needs_refresh(now));
    }

    #[test]
    fn test_events_url_encodes_calendar_id() {
        let config = GoogleCalendarConfig {
            calendar_id: "team@group.calendar.google.com".to_string(),
            ..Default::default()
        };
        let client = GoogleCalendarClient::new(config).unwrap();
        let url = client.events_url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/team@group.calendar.google.com/events"
        );
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let json = r#"{"token": "a", "scopes": ["calendar.readonly"], "universe_domain": "googleapis.com"}"#;
        let creds: AuthorizedUser = serde_json::from_str(json).unwrap();
        let out = serde_json::to_value(&creds).unwrap();
        assert_eq!(out["scopes"][0], "calendar.readonly");
        assert_eq!(out["token"], "a");
    }
}
