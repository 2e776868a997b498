//! Event payload: string keys mapped to type-erased values.
//!
//! A [`Payload`] is passed by reference to every listener reached by one
//! emission. Keys are kept in a `BTreeMap`, so iteration is lexicographic by
//! key (not insertion order) and runs in either direction.
//!
//! Reads and writes are deliberately asymmetric:
//!
//! - [`Payload::get`] is read-only and fails with [`EventError::KeyNotFound`]
//!   when the key is absent.
//! - [`Payload::entry`] is mutable and creates an empty slot when the key is
//!   absent.
//!
//! ```
//! use toolbox_events::Payload;
//!
//! let mut data = Payload::new();
//! data.set("Thing 1", 5_i32);
//! data.set("Thing 2", 5.9876_f64);
//!
//! assert_eq!(data.get_as::<i32>("Thing 1").unwrap(), &5);
//! assert!(data.get("Thing 3").is_err());
//!
//! data.entry("Thing 3").set("info string");
//! let keys: Vec<_> = data.keys().collect();
//! assert_eq!(keys, ["Thing 1", "Thing 2", "Thing 3"]);
//! ```

use core::any::Any;
use core::fmt;
use std::collections::BTreeMap;
use std::collections::btree_map;

use serde_json::Value as JsonValue;
use toolbox_core::Value;

use crate::error::{EventError, EventResult};

/// Ordered key/value data carried by one event.
#[derive(Default)]
pub struct Payload {
    entries: BTreeMap<String, Value>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set).
    pub fn with<T>(mut self, key: impl Into<String>, value: T) -> Self
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        self.set(key, value);
        self
    }

    /// Insert or overwrite the value stored at `key`.
    ///
    /// An already-erased [`Value`] is stored as-is, same as
    /// [`set_value`](Self::set_value).
    pub fn set<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        self.entries.insert(key.into(), Value::new(value));
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Read-only access. Never inserts.
    pub fn get(&self, key: &str) -> EventResult<&Value> {
        self.entries
            .get(key)
            .ok_or_else(|| EventError::key_not_found(key))
    }

    /// Read-only typed access: `KeyNotFound` or `TypeMismatch` on failure.
    pub fn get_as<T: Any>(&self, key: &str) -> EventResult<&T> {
        Ok(self.get(key)?.get::<T>()?)
    }

    /// Mutable access to the slot at `key`, created empty if absent.
    pub fn entry(&mut self, key: impl Into<String>) -> &mut Value {
        self.entries.entry(key.into()).or_default()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Pairs in ascending key order; call `.rev()` for descending order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, Value> {
        self.entries.iter_mut()
    }

    /// Build a payload from a JSON object.
    ///
    /// Integers become `i64` (or `u64` above `i64::MAX`), other numbers `f64`,
    /// strings `String`, booleans `bool` and `null` an empty slot. Arrays and
    /// nested objects are stored as [`serde_json::Value`].
    pub fn from_json(json: JsonValue) -> EventResult<Self> {
        let JsonValue::Object(map) = json else {
            return Err(EventError::invalid_payload(format!(
                "expected a JSON object, found {}",
                json_kind(&json)
            )));
        };

        Ok(map
            .into_iter()
            .map(|(key, value)| (key, json_to_value(value)))
            .collect())
    }

    /// Parse `input` as JSON and build a payload from the resulting object.
    pub fn from_json_str(input: &str) -> EventResult<Self> {
        let json: JsonValue = serde_json::from_str(input)
            .map_err(|e| EventError::invalid_payload(e.to_string()))?;
        Self::from_json(json)
    }
}

fn json_to_value(json: JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::empty(),
        JsonValue::Bool(b) => Value::new(b),
        JsonValue::String(s) => Value::new(s),
        JsonValue::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => Value::new(i),
            (None, Some(u), _) => Value::new(u),
            (None, None, Some(f)) => Value::new(f),
            _ => Value::new(JsonValue::Number(n)),
        },
        other => Value::new(other),
    }
}

fn json_kind(json: &JsonValue) -> &'static str {
    match json {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>> Extend<(K, Value)> for Payload {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        self.entries
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v)));
    }
}

impl<'a> IntoIterator for &'a Payload {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a mut Payload {
    type Item = (&'a String, &'a mut Value);
    type IntoIter = btree_map::IterMut<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter_mut()
    }
}

impl IntoIterator for Payload {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
