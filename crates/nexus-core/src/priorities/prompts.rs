//! Prompt templates for priority extraction.

use crate::types::{Period, TranscriptText};

/// Render transcripts as delimited blocks. Transcripts with no text are left out.
pub fn format_transcripts(transcripts: &[TranscriptText]) -> String {
    transcripts
        .iter()
        .filter(|t| !t.text.trim().is_empty())
        .map(|t| format!("--- Transcript: {} ({}) ---\n{}\n", t.title, t.date, t.text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the extraction prompt for already formatted transcripts.
pub fn priority_extraction_prompt(transcripts: &str, period: Period) -> String {
    format!(
        r#"You are an assistant that analyzes conversation transcripts and voice notes to find what the user needs to act on.

Identify three kinds of action items:

1. COMMITMENTS - things the user promised to do
   - Phrases like "I will...", "I'll get back to you with...", "I commit to..."
   - Promises made to clients or prospects
   - Specific actions the user said they would take

2. REQUESTS - things someone asked the user to do
   - Direct questions: "Can you...", "I would need...", "Could you..."
   - Client requests to handle
   - Information someone asked for

3. DEADLINES - time-bound items
   - Explicit dates
   - "Before [date]", "By [day]", "No later than [deadline]"
   - Important due dates

Period analyzed: {period}

Transcripts:
{transcripts}

Return a JSON object in exactly this shape:
{{
  "commitments": [
    {{
      "title": "Short description of the commitment",
      "description": "Additional details",
      "confidence": 0.95,
      "source": "Conversation with [name] - [date]"
    }}
  ],
  "requests": [
    {{
      "title": "Short description of the request",
      "description": "Context and details",
      "confidence": 0.90,
      "source": "Conversation with [name] - [date]"
    }}
  ],
  "deadlines": [
    {{
      "title": "Action with a deadline",
      "description": "Details",
      "date": "YYYY-MM-DD",
      "confidence": 0.85,
      "source": "Conversation with [name] - [date]"
    }}
  ]
}}

Confidence is a number between 0 and 1. Use empty arrays when nothing applies.

Return ONLY valid JSON, no other text."#,
        period = period.describe(),
        transcripts = transcripts,
    )
}
