//! Arguments object: positional and named values merged over defaults

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::domain::DomainError;

/// Raw result of parsing command-line tokens.
///
/// Positional tokens keep their order of appearance, named flags keep the
/// last value seen for each key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    pub positional: Vec<Value>,
    pub named: BTreeMap<String, Value>,
}

impl ParsedArgs {
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// Arguments handed to the main function.
///
/// Integer-indexed positional entries and string-keyed named entries.
/// Serializes to a JSON object where positional indices become string keys
/// (`{"0": "sync", "paramA": 1}`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    positional: BTreeMap<usize, Value>,
    named: BTreeMap<String, Value>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set positional slot `index`.
    pub fn positional(mut self, index: usize, value: impl Into<Value>) -> Self {
        self.positional.insert(index, value.into());
        self
    }

    /// Builder: set named entry `key`.
    pub fn named(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(key.into(), value.into());
        self
    }

    /// Build from a JSON object.
    ///
    /// Canonical decimal keys (`"0"`, `"5"`, not `"05"`) become positional
    /// slots, every other key is a named entry.
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        let Value::Object(map) = value else {
            return Err(DomainError::DefaultsNotObject(value.to_string()));
        };

        let mut args = Self::default();
        for (key, value) in map {
            match index_key(&key) {
                Some(index) => {
                    let index = index.ok_or_else(|| DomainError::InvalidIndex(key.clone()))?;
                    args.positional.insert(index, value);
                }
                None => {
                    args.named.insert(key, value);
                }
            }
        }
        Ok(args)
    }

    /// Return a new value with `parsed` laid over `self`.
    ///
    /// Positional token `i` replaces slot `i`, named key `k` replaces `k`.
    /// A named index key (`--5 x`) replaces slot 5, and wins over a positional
    /// token for the same slot. Everything else keeps the default. Shallow:
    /// values are replaced whole.
    pub fn merged(&self, parsed: &ParsedArgs) -> Self {
        let mut merged = self.clone();
        for (index, value) in parsed.positional.iter().enumerate() {
            merged.positional.insert(index, value.clone());
        }
        for (key, value) in &parsed.named {
            match index_key(key) {
                Some(Some(index)) => {
                    merged.positional.insert(index, value.clone());
                }
                // index too large for a slot: no positional can collide with it
                Some(None) | None => {
                    merged.named.insert(key.clone(), value.clone());
                }
            }
        }
        merged
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.positional.get(&index)
    }

    pub fn get_named(&self, key: &str) -> Option<&Value> {
        self.named.get(key)
    }

    /// Positional slot as string slice, if it holds a string.
    pub fn str_at(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_str)
    }

    pub fn positionals(&self) -> impl Iterator<Item = (usize, &Value)> {
        self.positional.iter().map(|(i, v)| (*i, v))
    }

    pub fn named_entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.named.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON object view, same key convention as [`Arguments::from_value`].
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        for (index, value) in &self.positional {
            map.insert(index.to_string(), value.clone());
        }
        for (key, value) in &self.named {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

/// Canonical decimal keys (`"0"`, `"17"`, not `"07"`) address positional slots.
///
/// `None` for any other key, `Some(None)` for an index key that does not fit
/// in `usize`.
fn index_key(key: &str) -> Option<Option<usize>> {
    let canonical = !key.is_empty()
        && key.bytes().all(|b| b.is_ascii_digit())
        && (key == "0" || !key.starts_with('0'));
    canonical.then(|| key.parse::<usize>().ok())
}

impl Serialize for Arguments {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (index, value) in &self.positional {
            map.serialize_entry(&index.to_string(), value)?;
        }
        for (key, value) in &self.named {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl TryFrom<Value> for Arguments {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
