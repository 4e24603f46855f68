//! Notion JSON: page properties, child blocks and page decoding.

use serde_json::{json, Map, Value};

use nexus_core::types::{ActionItem, NotesRecord, RecordKind, StoredRecord};

/// Notion's per-rich-text-object content limit.
pub const RICH_TEXT_LIMIT: usize = 2000;

/// Notion's limit on child blocks sent in a single request.
pub const MAX_CHILDREN_PER_REQUEST: usize = 100;

fn rich_text(content: &str) -> Value {
    json!([{ "type": "text", "text": { "content": content } }])
}

fn title(content: &str) -> Value {
    json!({ "title": rich_text(content) })
}

fn select(name: &str) -> Value {
    json!({ "select": { "name": name } })
}

/// Split into chunks of at most `max` characters.
pub fn chunk_text(text: &str, max: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let split = rest
            .char_indices()
            .nth(max)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(split);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Page properties for a record.
///
/// To-do kinds use the `Title` title property with status, confidence and
/// provenance; calendar events and meetings use `Name`.
pub fn page_properties(record: &NotesRecord) -> Map<String, Value> {
    let mut props = Map::new();
    let kind: &'static str = record.kind.into();

    if record.kind.is_todo() {
        props.insert("Title".into(), title(&record.title));
        props.insert("Type".into(), select(kind));
        let status: &'static str = record.status.unwrap_or_default().into();
        props.insert("Status".into(), select(status));
        if let Some(body) = record.body.as_deref().filter(|b| !b.is_empty()) {
            props.insert("Description".into(), json!({ "rich_text": rich_text(body) }));
        }
        if let Some(due) = record.due_date {
            props.insert(
                "Date".into(),
                json!({ "date": { "start": due.format("%Y-%m-%d").to_string() } }),
            );
        }
        if let Some(confidence) = record.confidence {
            props.insert("Confidence".into(), json!({ "number": confidence }));
        }
        if let Some(source) = record.source.as_deref().filter(|s| !s.is_empty()) {
            props.insert("Source".into(), json!({ "rich_text": rich_text(source) }));
        }
        return props;
    }

    props.insert("Name".into(), title(&record.title));
    props.insert("Type".into(), select(kind));
    if let Some(date) = record.date {
        props.insert("Date".into(), json!({ "date": { "start": date.to_rfc3339() } }));
    }
    match record.kind {
        RecordKind::Meeting => {
            let attendees: Vec<Value> = record
                .attendees
                .iter()
                // multi-select option names cannot contain commas
                .map(|a| json!({ "name": a.replace(',', " ") }))
                .collect();
            props.insert("Attendees".into(), json!({ "multi_select": attendees }));
        }
        _ => {
            if let Some(body) = record.body.as_deref().filter(|b| !b.is_empty()) {
                props.insert("Notes".into(), json!({ "rich_text": rich_text(body) }));
            }
            if let Some(status) = record.status {
                let status: &'static str = status.into();
                props.insert("Status".into(), select(status));
            }
        }
    }
    props
}

fn block(kind: &str, body: Value) -> Value {
    let mut map = Map::new();
    map.insert("object".into(), json!("block"));
    map.insert("type".into(), json!(kind));
    map.insert(kind.to_string(), body);
    Value::Object(map)
}

/// Child blocks for a meeting page: notes then action items.
pub fn meeting_children(record: &NotesRecord, actions: &[ActionItem]) -> Vec<Value> {
    let mut blocks = vec![block(
        "heading_2",
        json!({ "rich_text": rich_text("Notes") }),
    )];

    let body = record.body.as_deref().unwrap_or_default();
    let chunks = chunk_text(body, RICH_TEXT_LIMIT);
    if chunks.is_empty() {
        blocks.push(block("paragraph", json!({ "rich_text": [] })));
    }
    blocks.extend(
        chunks
            .into_iter()
            .map(|chunk| block("paragraph", json!({ "rich_text": rich_text(chunk) }))),
    );

    if !actions.is_empty() {
        blocks.push(block(
            "heading_2",
            json!({ "rich_text": rich_text("Action Items") }),
        ));
        blocks.extend(actions.iter().map(|item| {
            block(
                "to_do",
                json!({ "rich_text": rich_text(&item.text), "checked": item.checked }),
            )
        }));
    }
    blocks
}

fn plain_text(value: &Value) -> Option<String> {
    let parts = value.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| {
            part.get("plain_text")
                .or_else(|| part.pointer("/text/content"))
                .and_then(Value::as_str)
        })
        .collect();
    (!text.is_empty()).then_some(text)
}

fn option_name(property: &Value) -> Option<String> {
    property
        .pointer("/select/name")
        .or_else(|| property.pointer("/status/name"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Decode a page object from a database query.
pub fn stored_record(page: &Value) -> Option<StoredRecord> {
    let id = page.get("id")?.as_str()?.to_string();
    let props = page.get("properties").and_then(Value::as_object);

    let title = props
        .and_then(|p| {
            p.values()
                .find(|prop| prop.get("type").and_then(Value::as_str) == Some("title"))
        })
        .and_then(|prop| prop.get("title"))
        .and_then(plain_text)
        .unwrap_or_default();

    let property = |name: &str| props.and_then(|p| p.get(name));

    Some(StoredRecord {
        external_id: id,
        title,
        kind: property("Type").and_then(option_name),
        status: property("Status").and_then(option_name),
        date: property("Date")
            .and_then(|d| d.pointer("/date/start"))
            .and_then(Value::as_str)
            .map(str::to_string),
        url: page.get("url").and_then(Value::as_str).map(str::to_string),
    })
}
