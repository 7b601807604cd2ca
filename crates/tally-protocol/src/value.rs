//! Property and trait maps.
//!
//! Every event carries a string-keyed map of JSON values. Dates travel as
//! ISO-8601 strings, exactly as the host serializes them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key holding a revenue figure inside event properties.
pub const REVENUE_KEY: &str = "revenue";

/// Key holding a display name inside traits or properties.
pub const NAME_KEY: &str = "name";

/// A string-keyed map of JSON values.
///
/// Used both for identify/group traits and for track/screen properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueMap(Map<String, Value>);

impl ValueMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from a JSON value.
    ///
    /// Returns `None` unless the value is a JSON object.
    #[must_use]
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    /// Insert a value, returning the previous one for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a string value by key.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Get a numeric value by key.
    ///
    /// Numeric strings are parsed; anything else yields `None`.
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Check whether a key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Project the map onto the given keys.
    ///
    /// Keys not present in the map are skipped.
    #[must_use]
    pub fn filter<I>(&self, keys: I) -> ValueMap
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut projected = Map::new();
        for key in keys {
            let key = key.as_ref();
            if let Some(value) = self.0.get(key) {
                projected.insert(key.to_string(), value.clone());
            }
        }
        Self(projected)
    }

    /// Rename keys through a lookup table of `(from, to)` pairs.
    ///
    /// Keys without an entry in the table pass through unchanged.
    #[must_use]
    pub fn transform(&self, table: &[(&str, &str)]) -> ValueMap {
        self.0
            .iter()
            .map(|(key, value)| {
                let renamed = table
                    .iter()
                    .find(|(from, _)| *from == key.as_str())
                    .map_or_else(|| key.clone(), |(_, to)| (*to).to_string());
                (renamed, value.clone())
            })
            .collect()
    }

    /// Revenue carried by the properties, or `0.0`.
    #[must_use]
    pub fn revenue(&self) -> f64 {
        self.get_f64(REVENUE_KEY).unwrap_or(0.0)
    }

    /// The `name` field, if it is a string.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.get_str(NAME_KEY)
    }

    /// Borrow the underlying JSON map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying JSON map.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ValueMap {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Object(map.0)
    }
}

impl FromIterator<(String, Value)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl std::fmt::Display for ValueMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}
