//! Adapter traits: the seams between the core and remote services.

mod calendar;
mod extractor;
mod llm;
mod notes;
mod transcripts;

pub use calendar::*;
pub use extractor::*;
pub use llm::*;
pub use notes::*;
pub use transcripts::*;
