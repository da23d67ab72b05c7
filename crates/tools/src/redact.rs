use crate::traits::Redactor;
use serde_json::Value;
use std::collections::BTreeMap;

const DEFAULT_MAX_VALUE_LEN: usize = 120;

/// Whitelist redactor: copies only the named top-level fields, rendered as
/// bounded strings. Everything else in the request is dropped.
#[derive(Debug, Clone)]
pub struct FieldRedactor {
    fields: Vec<String>,
    max_value_len: usize,
}

impl FieldRedactor {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            max_value_len: DEFAULT_MAX_VALUE_LEN,
        }
    }

    /// Logs no request fields at all.
    pub fn none() -> Self {
        Self::new(Vec::<String>::new())
    }

    pub fn with_max_value_len(mut self, max_value_len: usize) -> Self {
        self.max_value_len = max_value_len;
        self
    }

    fn render(&self, value: &Value) -> String {
        let rendered = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            // nested structures may hide unlisted data
            Value::Array(_) => "[array]".to_string(),
            Value::Object(_) => "[object]".to_string(),
        };
        truncate_chars(&rendered, self.max_value_len)
    }
}

impl Redactor for FieldRedactor {
    fn redact(&self, request: &Value) -> BTreeMap<String, String> {
        let Some(map) = request.as_object() else {
            return BTreeMap::new();
        };
        self.fields
            .iter()
            .filter_map(|field| map.get(field).map(|v| (field.clone(), self.render(v))))
            .collect()
    }
}

pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
