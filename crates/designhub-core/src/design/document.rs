//! Design document model and structural normalization.
//!
//! A design document is opaque JSON produced by the visual editor. The only
//! thing this crate guarantees about it is the minimal shape every editor
//! load needs: an object `body` with an array `rows` and an object `values`,
//! plus a `schemaVersion`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Schema version stamped onto documents that do not carry one.
pub const CURRENT_SCHEMA_VERSION: u64 = 16;

/// A structurally well-formed design document.
///
/// The wrapped JSON is always an object satisfying the minimal shape; the
/// only ways to build one go through [`normalize`], including
/// deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct DesignDocument(Value);

impl DesignDocument {
    /// Returns the underlying JSON.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Consumes the document and returns the underlying JSON.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Rows of the body, in display order.
    pub fn rows(&self) -> &[Value] {
        self.0
            .pointer("/body/rows")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn row_count(&self) -> usize {
        self.rows().len()
    }

    /// Style/display settings of the body.
    pub fn values(&self) -> Option<&Map<String, Value>> {
        self.0.pointer("/body/values").and_then(Value::as_object)
    }

    /// The stored schema version, passed through as-is.
    pub fn schema_version(&self) -> &Value {
        self.0.get("schemaVersion").unwrap_or(&Value::Null)
    }

    /// URL of the first image content block, scanning rows, columns and
    /// contents in order. Used as a thumbnail in design listings.
    pub fn preview_image_url(&self) -> Option<String> {
        self.rows()
            .iter()
            .filter_map(|row| row.get("columns").and_then(Value::as_array))
            .flatten()
            .filter_map(|column| column.get("contents").and_then(Value::as_array))
            .flatten()
            .filter(|content| content.get("type").and_then(Value::as_str) == Some("image"))
            .filter_map(|content| content.pointer("/values/src/url").and_then(Value::as_str))
            .find(|url| !url.is_empty())
            .map(str::to_string)
    }
}

impl Default for DesignDocument {
    /// The blank template: no rows, default style values, current schema.
    fn default() -> Self {
        let mut values = default_body_values();
        values.insert(
            "backgroundImage".to_string(),
            json!({
                "url": "",
                "fullWidth": true,
                "repeat": "no-repeat",
                "center": true,
            }),
        );

        let mut body = Map::new();
        body.insert("id".to_string(), Value::String("body".to_string()));
        body.insert("rows".to_string(), Value::Array(Vec::new()));
        body.insert("values".to_string(), Value::Object(values));

        let mut design = Map::new();
        design.insert("body".to_string(), Value::Object(body));
        design.insert("schemaVersion".to_string(), json!(CURRENT_SCHEMA_VERSION));

        Self(Value::Object(design))
    }
}

impl From<Value> for DesignDocument {
    fn from(value: Value) -> Self {
        normalize(Some(value))
    }
}

impl From<DesignDocument> for Value {
    fn from(document: DesignDocument) -> Self {
        document.0
    }
}

/// Repairs `input` into a structurally valid design document.
///
/// Absent or non-object input (arrays included) yields the default document.
/// Otherwise only four things are checked and repaired in place: a missing or
/// non-object `body`, a non-array `body.rows`, a missing or non-object
/// `body.values` and a missing or falsy `schemaVersion`. Everything else is
/// passed through untouched. Never fails.
pub fn normalize(input: Option<Value>) -> DesignDocument {
    let mut design = match input {
        Some(Value::Object(map)) => map,
        Some(other) => {
            tracing::warn!(
                kind = json_kind(&other),
                "Invalid design data, creating default structure"
            );
            return DesignDocument::default();
        }
        None => return DesignDocument::default(),
    };

    if !matches!(design.get("body"), Some(Value::Object(_))) {
        design.insert("body".to_string(), Value::Object(default_body()));
    }

    if let Some(Value::Object(body)) = design.get_mut("body") {
        if !matches!(body.get("rows"), Some(Value::Array(_))) {
            body.insert("rows".to_string(), Value::Array(Vec::new()));
        }
        if !matches!(body.get("values"), Some(Value::Object(_))) {
            body.insert("values".to_string(), Value::Object(default_body_values()));
        }
    }

    if design.get("schemaVersion").is_none_or(is_falsy) {
        design.insert("schemaVersion".to_string(), json!(CURRENT_SCHEMA_VERSION));
    }

    DesignDocument(Value::Object(design))
}

fn default_body() -> Map<String, Value> {
    let mut body = Map::new();
    body.insert("id".to_string(), Value::String("body".to_string()));
    body.insert("rows".to_string(), Value::Array(Vec::new()));
    body.insert("values".to_string(), Value::Object(default_body_values()));
    body
}

fn default_body_values() -> Map<String, Value> {
    json!({
        "backgroundColor": "#ffffff",
        "contentWidth": "600px",
        "contentAlign": "center",
        "fontFamily": {
            "label": "Arial",
            "value": "arial,helvetica,sans-serif",
        },
        "textColor": "#000000",
        "linkColor": "#0000ee",
    })
    .as_object()
    .cloned()
    .unwrap_or_default()
}

/// Legacy writers treated null, false, 0, NaN and "" as unset.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().is_none_or(|f| f == 0.0 || f.is_nan()),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
