//! Configuration system for nexus.
//!
//! Configuration is read from a TOML, JSON or YAML file, then overlaid with
//! environment variables. Every section has defaults, so a missing section just
//! means that service is not configured.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{NexusError, NexusResult};
use crate::traits::LlmConfig;

/// Location searched when no path is given and `config/config.toml` is absent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("nexus").join("config.toml"))
}

const LOCAL_CONFIG_PATH: &str = "config/config.toml";

/// Limitless (transcript provider) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitlessConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for LimitlessConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.limitless.ai/v1".to_string(),
            timeout_secs: 30,
        }
    }
}

impl LimitlessConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Google Calendar settings.
///
/// The token file holds an authorized-user credential (access token plus an
/// optional refresh token and client credentials).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleCalendarConfig {
    pub credentials_file: Option<PathBuf>,
    pub token_file: PathBuf,
    pub calendar_id: String,
    pub endpoint: String,
    pub max_results: u32,
    pub upcoming_max_results: u32,
    pub timeout_secs: u64,
}

impl Default for GoogleCalendarConfig {
    fn default() -> Self {
        Self {
            credentials_file: None,
            token_file: PathBuf::from("token.json"),
            calendar_id: "primary".to_string(),
            endpoint: "https://www.googleapis.com/calendar/v3".to_string(),
            max_results: 100,
            upcoming_max_results: 50,
            timeout_secs: 30,
        }
    }
}

impl GoogleCalendarConfig {
    pub fn is_configured(&self) -> bool {
        self.credentials_file.is_some() || self.token_file.exists()
    }
}

/// Notion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    pub api_token: Option<String>,
    /// Database receiving calendar events and meeting notes.
    pub database_id: Option<String>,
    /// Database receiving detected priorities. Falls back to `database_id`.
    pub todo_database_id: Option<String>,
    pub page_size: u32,
    pub endpoint: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            database_id: None,
            todo_database_id: None,
            page_size: 100,
            endpoint: "https://api.notion.com/v1".to_string(),
            api_version: "2022-06-28".to_string(),
            timeout_secs: 30,
        }
    }
}

impl NotionConfig {
    pub fn is_configured(&self) -> bool {
        self.api_token.as_deref().is_some_and(|t| !t.is_empty())
            && (self.database_id.is_some() || self.todo_database_id.is_some())
    }
}

/// Sync cycle windows and scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub interval_minutes: u64,
    pub error_cooldown_secs: u64,
    pub calendar_past_days: u32,
    pub calendar_future_days: u32,
    pub transcript_days: u32,
    pub transcript_limit: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
            error_cooldown_secs: 60,
            calendar_past_days: 7,
            calendar_future_days: 30,
            transcript_days: 7,
            transcript_limit: 100,
        }
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    pub fn error_cooldown(&self) -> Duration {
        Duration::from_secs(self.error_cooldown_secs)
    }
}

/// Priority workflow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityConfig {
    pub transcript_limit: usize,
    /// Items below this confidence are annotated in the report.
    pub low_confidence_threshold: f32,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            transcript_limit: 100,
            low_confidence_threshold: 0.9,
        }
    }
}

/// Logging settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NexusConfig {
    pub limitless: LimitlessConfig,
    pub google_calendar: GoogleCalendarConfig,
    pub notion: NotionConfig,
    pub anthropic: LlmConfig,
    pub sync: SyncConfig,
    pub priorities: PriorityConfig,
    pub logging: LoggingConfig,
}

impl NexusConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> NexusResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NexusError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::parse(&content, path.extension().and_then(|e| e.to_str()))
    }

    fn parse(content: &str, ext: Option<&str>) -> NexusResult<Self> {
        match ext {
            Some("toml") => {
                toml::from_str(content).map_err(|e| NexusError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(content)
                .map_err(|e| NexusError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(content)
                .map_err(|e| NexusError::Configuration(e.to_string())),
            _ => Err(NexusError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Resolve, read, overlay and validate the configuration.
    ///
    /// An explicit path must exist. Without one, `config/config.toml` and then
    /// the user config directory are tried; if neither exists the defaults are
    /// used and only the environment configures services.
    pub fn load(explicit: Option<&Path>) -> NexusResult<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::discover() {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "Loading configuration");
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_PATH);
        if local.exists() {
            return Some(local);
        }
        default_config_path().filter(|p| p.exists())
    }

    /// Overlay environment variables onto this configuration.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("LIMITLESS_API_KEY") {
            self.limitless.api_key = Some(key);
        }
        if let Some(endpoint) = get("LIMITLESS_ENDPOINT") {
            self.limitless.endpoint = endpoint;
        }

        if let Some(path) = get("GOOGLE_CALENDAR_CREDENTIALS_FILE") {
            self.google_calendar.credentials_file = Some(PathBuf::from(path));
        }
        if let Some(path) = get("GOOGLE_CALENDAR_TOKEN_FILE") {
            self.google_calendar.token_file = PathBuf::from(path);
        }
        if let Some(id) = get("GOOGLE_CALENDAR_ID") {
            self.google_calendar.calendar_id = id;
        }

        if let Some(token) = get("NOTION_API_TOKEN") {
            self.notion.api_token = Some(token);
        }
        if let Some(id) = get("NOTION_DATABASE_ID") {
            self.notion.database_id = Some(id);
        }
        if let Some(id) = get("NOTION_TODO_DATABASE_ID") {
            self.notion.todo_database_id = Some(id);
        }

        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.anthropic.api_key = Some(key);
        }
        if let Some(model) = get("ANTHROPIC_MODEL") {
            self.anthropic.model = model;
        }

        if let Some(minutes) = get("NEXUS_SYNC_INTERVAL_MINUTES") {
            match minutes.parse() {
                Ok(minutes) => self.sync.interval_minutes = minutes,
                Err(_) => tracing::warn!(
                    value = %minutes,
                    "Ignoring non-numeric NEXUS_SYNC_INTERVAL_MINUTES"
                ),
            }
        }
        if let Some(level) = get("NEXUS_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> NexusResult<()> {
        if self.sync.interval_minutes == 0 {
            return Err(NexusError::Configuration(
                "sync.interval_minutes must be at least 1".to_string(),
            ));
        }
        if self.sync.error_cooldown() >= self.sync.interval() {
            return Err(NexusError::Configuration(format!(
                "sync.error_cooldown_secs ({}) must be shorter than the sync interval ({} min)",
                self.sync.error_cooldown_secs, self.sync.interval_minutes
            )));
        }
        if self.sync.transcript_limit == 0 || self.priorities.transcript_limit == 0 {
            return Err(NexusError::Configuration(
                "transcript_limit must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.notion.page_size) {
            return Err(NexusError::Configuration(
                "notion.page_size must be between 1 and 100".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.priorities.low_confidence_threshold) {
            return Err(NexusError::Configuration(
                "priorities.low_confidence_threshold must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> NexusConfigBuilder {
        NexusConfigBuilder::default()
    }
}

/// Builder for NexusConfig.
#[derive(Default)]
pub struct NexusConfigBuilder {
    config: NexusConfig,
}

impl NexusConfigBuilder {
    pub fn limitless(mut self, config: LimitlessConfig) -> Self {
        self.config.limitless = config;
        self
    }

    pub fn google_calendar(mut self, config: GoogleCalendarConfig) -> Self {
        self.config.google_calendar = config;
        self
    }

    pub fn notion(mut self, config: NotionConfig) -> Self {
        self.config.notion = config;
        self
    }

    pub fn anthropic(mut self, config: LlmConfig) -> Self {
        self.config.anthropic = config;
        self
    }

    pub fn sync(mut self, config: SyncConfig) -> Self {
        self.config.sync = config;
        self
    }

    pub fn priorities(mut self, config: PriorityConfig) -> Self {
        self.config.priorities = config;
        self
    }

    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.config.logging = config;
        self
    }

    /// Set the sync interval in minutes.
    pub fn interval_minutes(mut self, minutes: u64) -> Self {
        self.config.sync.interval_minutes = minutes;
        self
    }

    pub fn build(self) -> NexusConfig {
        self.config
    }
}
