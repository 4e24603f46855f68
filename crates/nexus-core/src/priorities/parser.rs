//! Parsing of extraction responses.
//!
//! Models wrap JSON in prose or code fences and drift on key names, so the
//! parser is lenient: it finds the outermost object, accepts several key
//! spellings, and fills defaults for missing or mistyped fields.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{NexusError, NexusResult};
use crate::mapper::UNTITLED;
use crate::types::{CandidateCategory, CandidateItem, ExtractedPriorities};

static CODE_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid code block regex")
});

static TRAILING_COMMA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([\]}])").expect("valid trailing comma regex"));

/// Slice from the first `{` to the last `}`, looking inside a code fence first.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let text = text.trim();
    let body = CODE_BLOCK_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|inner| inner.contains('{'))
        .unwrap_or(text);

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| &body[start..=end])
}

type RawList = Option<Vec<Value>>;

/// Lists stay untyped so one malformed entry cannot sink the whole response.
/// A `null` list reads the same as a missing one.
#[derive(Debug, Default, Deserialize)]
struct RawPriorities {
    #[serde(default, alias = "engagements")]
    commitments: RawList,
    #[serde(default, alias = "demandes")]
    requests: RawList,
    #[serde(default)]
    deadlines: RawList,
}

/// Parse a model response into the three-list shape.
pub fn parse_priorities(response: &str) -> NexusResult<ExtractedPriorities> {
    let json = extract_json_object(response)
        .ok_or_else(|| NexusError::parse("no JSON object found in extraction response"))?;

    let raw: RawPriorities = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(first) => {
            // trailing commas are the most common defect
            let fixed = TRAILING_COMMA_RE.replace_all(json, "$1");
            serde_json::from_str(&fixed).map_err(|_| {
                NexusError::parse(format!("invalid extraction JSON: {}", first))
            })?
        }
    };

    let mut priorities = ExtractedPriorities::empty();
    let groups = [
        (CandidateCategory::Commitment, raw.commitments),
        (CandidateCategory::Request, raw.requests),
        (CandidateCategory::Deadline, raw.deadlines),
    ];
    for (category, items) in groups {
        for (index, item) in items.unwrap_or_default().iter().enumerate() {
            match into_candidate(category, item) {
                Some(candidate) => priorities.push(candidate),
                None => debug!(%category, index, "Skipping non-object extraction item"),
            }
        }
    }
    Ok(priorities)
}

/// Fields of the wrong type fall back to their defaults.
fn into_candidate(category: CandidateCategory, item: &Value) -> Option<CandidateItem> {
    let fields = item.as_object()?;
    let title = text_field(fields, "title")
        .filter(|t| !t.is_empty())
        .unwrap_or(UNTITLED)
        .to_string();
    let date = ["date", "due_date", "deadline"]
        .into_iter()
        .find_map(|key| text_field(fields, key));

    Some(
        CandidateItem::new(category, title)
            .with_description(text_field(fields, "description").unwrap_or_default())
            .with_source(text_field(fields, "source").unwrap_or_default())
            .with_confidence(parse_confidence(fields.get("confidence")))
            .with_due_date(date.and_then(parse_due_date)),
    )
}

fn text_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str).map(str::trim)
}

/// Numbers and numeric strings are accepted; anything else means full confidence.
fn parse_confidence(value: Option<&Value>) -> f32 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(1.0) as f32,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(1.0),
        _ => 1.0,
    }
}

fn parse_due_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    // tolerate a trailing time component
    let date_part = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
