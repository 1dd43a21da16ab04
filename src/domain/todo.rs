use serde::Serialize;
use serde_json::{Map, Value};

const ID_FIELDS: [&str; 2] = ["_id", "id"];
const LIST_FIELDS: [&str; 3] = ["items", "todos", "data"];

/// Identifier assigned by the remote store. Items the store returned
/// without a usable id are `Unidentified`: they render and edit locally but
/// can never be the target of a PUT or DELETE.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TodoId {
    Identified(String),
    #[default]
    Unidentified,
}

impl TodoId {
    /// Reads `_id`, then `id`. Objects, arrays, booleans, null and empty
    /// strings are not identifiers.
    pub fn from_wire(object: &Map<String, Value>) -> Self {
        ID_FIELDS
            .iter()
            .filter_map(|field| object.get(*field))
            .find_map(|value| match value {
                Value::String(s) if !s.is_empty() => Some(Self::Identified(s.clone())),
                Value::Number(n) => Some(Self::Identified(n.to_string())),
                _ => None,
            })
            .unwrap_or(Self::Unidentified)
    }
}

impl From<&str> for TodoId {
    fn from(id: &str) -> Self {
        if id.is_empty() { Self::Unidentified } else { Self::Identified(id.to_string()) }
    }
}

/// Canonical record. `fields` keeps every wire field except the title and
/// completion flag, so writing the record back preserves what the store sent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TodoItem {
    pub id: TodoId,
    pub title: String,
    pub completed: bool,
    pub fields: Map<String, Value>,
}

impl TodoItem {
    /// Read boundary. Returns `None` for anything that is not a JSON object.
    pub fn from_wire(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let title = ["title", "text"]
            .iter()
            .filter_map(|field| object.get(*field).and_then(Value::as_str))
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();
        let completed = object.get("completed").and_then(Value::as_bool).unwrap_or(false);
        let fields = object
            .iter()
            .filter(|(key, _)| !matches!(key.as_str(), "title" | "text" | "completed"))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Some(Self { id: TodoId::from_wire(object), title, completed, fields })
    }

    /// Write boundary: the retained fields plus the title under both accepted
    /// names.
    pub fn to_wire(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("title".into(), Value::String(self.title.clone()));
        object.insert("text".into(), Value::String(self.title.clone()));
        object.insert("completed".into(), Value::Bool(self.completed));
        Value::Object(object)
    }

    pub fn apply(&self, patch: &TodoPatch) -> Self {
        let mut merged = self.clone();
        if let Some(title) = &patch.title { merged.title = title.clone(); }
        if let Some(completed) = patch.completed { merged.completed = completed; }
        merged
    }
}

/// Body of a create request. Serializes the text under `title` and the
/// legacy `text` name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
}

#[derive(Serialize)]
struct NewTodoWire<'a> {
    title: &'a str,
    text: &'a str,
    completed: bool,
}

impl Serialize for NewTodo {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NewTodoWire { title: &self.title, text: &self.title, completed: false }.serialize(serializer)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn title(title: impl Into<String>) -> Self { Self { title: Some(title.into()), completed: None } }
    pub fn completed(completed: bool) -> Self { Self { title: None, completed: Some(completed) } }
}

/// Accepts a bare array or an object carrying the array under `items`,
/// `todos` or `data`. Any other shape is an empty list.
pub fn normalize_list(body: &Value) -> Vec<TodoItem> {
    let entries = match body {
        Value::Array(entries) => Some(entries),
        Value::Object(object) => LIST_FIELDS.iter().find_map(|field| object.get(*field)?.as_array()),
        _ => None,
    };
    let Some(entries) = entries else {
        tracing::warn!(shape = %shape_of(body), "unexpected list response shape");
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let item = TodoItem::from_wire(entry);
            if item.is_none() { tracing::warn!(entry = %entry, "skipping non-object list entry"); }
            item
        })
        .collect()
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
