//! Flatten nested JSON records into dotted-key rows
//!
//! `{"driver": {"name": "Max"}}` becomes `{"driver.name": "Max"}`. Arrays are
//! kept whole. The typed accessors turn absent or mistyped fields into
//! `MalformedRecord` errors instead of silently defaulting.

use serde_json::{Map, Value};

use crate::{Result, SportsError};

/// A flattened record with dotted keys in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    fields: Map<String, Value>,
}

/// Flatten one JSON value
pub fn flatten(value: &Value) -> FlatRecord {
    let mut fields = Map::new();
    match value {
        Value::Object(map) => flatten_into(&mut fields, "", map),
        other => {
            fields.insert(String::new(), other.clone());
        }
    }
    FlatRecord { fields }
}

fn flatten_into(out: &mut Map<String, Value>, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, &full_key, inner),
            other => {
                out.insert(full_key, other.clone());
            }
        }
    }
}

impl FlatRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn str_field(&self, key: &str) -> Result<String> {
        self.opt_str(key)?
            .ok_or_else(|| SportsError::malformed(key, "missing"))
    }

    pub fn opt_str(&self, key: &str) -> Result<Option<String>> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(SportsError::malformed(
                key,
                format!("expected text, found {}", other),
            )),
        }
    }

    pub fn i64_field(&self, key: &str) -> Result<i64> {
        self.opt_i64(key)?
            .ok_or_else(|| SportsError::malformed(key, "missing"))
    }

    /// Integer field; numeric strings such as "2023" are accepted
    pub fn opt_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| SportsError::malformed(key, format!("not an integer: {}", n))),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| SportsError::malformed(key, format!("not an integer: {:?}", s))),
            Some(other) => Err(SportsError::malformed(
                key,
                format!("expected integer, found {}", other),
            )),
        }
    }

    /// Float field; numeric strings such as "575" are accepted
    pub fn opt_f64(&self, key: &str) -> Result<Option<f64>> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| SportsError::malformed(key, format!("not a number: {}", n))),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| SportsError::malformed(key, format!("not a number: {:?}", s))),
            Some(other) => Err(SportsError::malformed(
                key,
                format!("expected number, found {}", other),
            )),
        }
    }

    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(SportsError::malformed(
                key,
                format!("expected boolean, found {}", other),
            )),
        }
    }

    /// Array field, empty when absent
    pub fn array(&self, key: &str) -> Result<Vec<Value>> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(other) => Err(SportsError::malformed(
                key,
                format!("expected array, found {}", other),
            )),
        }
    }
}
