//! nexus-client - HTTP adapters for the services nexus connects.
//!
//! Each client implements one of the core adapter traits:
//!
//! - [`LimitlessClient`] - `TranscriptSource` (lifelogs, meeting notes, memories)
//! - [`GoogleCalendarClient`] - `CalendarSource`
//! - [`NotionClient`] - `NotesStore`
//!
//! Reads are retried with exponential backoff on network errors, rate limits
//! and 5xx responses. Writes are sent once.
//!
//! # Example
//!
//! ```ignore
//! use nexus_client::{LimitlessClient, NotionClient};
//!
//! let transcripts = LimitlessClient::new(&config.limitless)?;
//! let notes = NotionClient::new(&config.notion)?;
//! ```

mod google_calendar;
mod http;
mod limitless;
pub mod notion;

pub use google_calendar::{AuthorizedUser, GoogleCalendarClient, DEFAULT_TOKEN_URI};
pub use http::RetryPolicy;
pub use limitless::LimitlessClient;
pub use notion::NotionClient;
