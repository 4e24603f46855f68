//! Priority detection: extract commitments, requests and deadlines from
//! transcripts and turn them into to-do records.

mod extractor;
mod parser;
mod prompts;
mod workflow;

pub use extractor::LlmExtractor;
pub use parser::{extract_json_object, parse_priorities};
pub use prompts::{format_transcripts, priority_extraction_prompt};
pub use workflow::{PriorityWorkflow, WorkflowResult, WorkflowStats, WorkflowStatus};
