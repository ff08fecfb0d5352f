use serde::{Deserialize, Serialize};

/// Key–value pair used for container environment variables.
///
/// Both fields are plain UTF-8 strings with no validation applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValue {
    /// Name of the variable.
    key: String,
    /// Value associated with the key.
    value: String,
}

impl KeyValue {
    /// Create a new key–value pair.
    pub fn new<K, V>(key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Get the key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Render as `KEY=VALUE`, the form container runtimes accept.
    pub fn render(&self) -> String {
        format!("{}={}", self.key, self.value)
    }
}

impl From<(String, String)> for KeyValue {
    fn from((key, value): (String, String)) -> Self {
        Self { key, value }
    }
}

impl From<(&str, &str)> for KeyValue {
    fn from((key, value): (&str, &str)) -> Self {
        Self::new(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::KeyValue;

    #[test]
    fn render_joins_with_equals() {
        let kv = KeyValue::new("POSTGRES_DB", "app");
        assert_eq!(kv.render(), "POSTGRES_DB=app");
    }

    #[test]
    fn render_keeps_equals_inside_value() {
        let kv: KeyValue = ("DSN", "user=app password=x").into();
        assert_eq!(kv.render(), "DSN=user=app password=x");
    }

    #[test]
    fn render_allows_empty_value() {
        let kv = KeyValue::new("EMPTY", "");
        assert_eq!(kv.render(), "EMPTY=");
    }

    #[test]
    fn serde_uses_camel_case_fields() {
        let kv = KeyValue::new("FOO", "bar");
        let json = serde_json::to_string(&kv).unwrap();
        assert_eq!(json, r#"{"key":"FOO","value":"bar"}"#);
    }
}
