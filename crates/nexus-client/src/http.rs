//! Shared HTTP plumbing: client construction, status mapping, retried GETs.

use std::fmt;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use nexus_core::error::{NexusError, NexusResult};

/// Backoff for idempotent reads. Writes are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Single attempt.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_max_times(self.max_retries)
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
    }
}

/// Remote service an [`HttpClient`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Service {
    Limitless,
    GoogleCalendar,
    Notion,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Service::Limitless => "limitless",
            Service::GoogleCalendar => "google_calendar",
            Service::Notion => "notion",
        })
    }
}

impl Service {
    /// Map a non-success status to an error.
    ///
    /// Auth, rate limit and server errors share the generic mapping; other
    /// client errors become the service's own error kind.
    fn status_error(self, status: u16, body: &str) -> NexusError {
        let message = error_message(body);
        match status {
            401 | 403 | 429 | 500..=599 => NexusError::from_http_status(status, &message),
            _ => {
                let message = format!("HTTP {}: {}", status, message);
                match self {
                    Service::Limitless => NexusError::transcripts(message),
                    Service::GoogleCalendar => NexusError::calendar(message),
                    Service::Notion => NexusError::notes(message),
                }
            }
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Pull a readable message out of a JSON error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return body.trim().to_string();
    };
    if let Some(message) = parsed.message {
        return message;
    }
    match parsed.error {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.trim().to_string()),
        _ => body.trim().to_string(),
    }
}

/// Map a transport failure, keeping timeouts distinct.
fn request_error(service: Service, error: reqwest::Error) -> NexusError {
    if error.is_timeout() {
        NexusError::timeout(format!("{} request timed out: {}", service, error))
    } else {
        NexusError::api(format!("{} request failed: {}", service, error))
    }
}

/// Build an `Authorization: Bearer` header marked sensitive.
pub(crate) fn bearer_header(token: &SecretString) -> NexusResult<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
        .map_err(|_| NexusError::Configuration("Invalid API token format".to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

pub(crate) fn bearer_headers(token: &SecretString) -> NexusResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, bearer_header(token)?);
    Ok(headers)
}

/// A reqwest client bound to one service.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    client: Client,
    service: Service,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(service: Service, timeout_secs: u64, headers: HeaderMap) -> NexusResult<Self> {
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                NexusError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            service,
            retry: RetryPolicy::default(),
        })
    }

    pub fn set_retry(&mut self, retry: RetryPolicy) {
        self.retry = retry;
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// GET `url` and decode the JSON body, retrying transient failures.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        bearer: Option<&str>,
    ) -> NexusResult<T> {
        let attempt = || async {
            let mut request = self.client.get(url).query(query);
            if let Some(token) = bearer {
                request = request.bearer_auth(token);
            }
            self.send(request).await
        };

        attempt
            .retry(self.retry.backoff())
            .when(|e: &NexusError| e.is_transient())
            .notify(|e: &NexusError, delay: Duration| {
                warn!(
                    service = %self.service,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "Request failed, retrying"
                );
            })
            .await
    }

    /// Send once and decode the JSON body.
    pub async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> NexusResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| request_error(self.service, e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| request_error(self.service, e))?;

        if !status.is_success() {
            return Err(self.service.status_error(status.as_u16(), &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| NexusError::parse(format!("Invalid {} response: {}", self.service, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_core::error::ErrorCode;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(r#"{"message": "bad filter"}"#), "bad filter");
        assert_eq!(
            error_message(r#"{"error": {"code": 400, "message": "Invalid timeMin"}}"#),
            "Invalid timeMin"
        );
        assert_eq!(error_message(r#"{"error": "invalid_grant"}"#), "invalid_grant");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_status_error_mapping() {
        let err = Service::Notion.status_error(400, r#"{"message": "validation failed"}"#);
        assert_eq!(err.code(), ErrorCode::NoteCreateFailed);
        assert!(err.to_string().contains("validation failed"));
        assert!(!err.is_transient());

        assert!(Service::Limitless.status_error(503, "").is_transient());
        assert!(Service::GoogleCalendar.status_error(429, "").is_transient());
        assert_eq!(
            Service::GoogleCalendar.status_error(401, "").code(),
            ErrorCode::AuthInvalidKey
        );
    }

    #[test]
    fn test_retry_policy_none() {
        assert_eq!(RetryPolicy::none().max_retries, 0);
        assert_eq!(RetryPolicy::default().max_retries, 3);
    }
}
