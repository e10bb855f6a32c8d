use std::collections::BTreeMap;

/// Caller-supplied description of a desired payment operation.
///
/// An intent is an ephemeral bag of string fields (`to`, `from`, `amount`,
/// `transaction`, `reference`, ...). The gateway service may add fields to it
/// during optional-field completion; it is discarded once the request
/// completes. Key presence is explicit, there is no defaulting to empty
/// strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Intent {
    fields: BTreeMap<String, String>,
}

impl Intent {
    /// Create an empty intent
    pub fn new() -> Self {
        Self::default()
    }

    /// Fluent setter for building an intent
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Set a field, replacing any existing value
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Get a field value, if present
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Whether the field is present
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterate over fields in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Intent {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
