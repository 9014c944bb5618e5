use std::fmt;

use indexmap::IndexMap;
use serde_json::{Number, Value};

/// Loose host-native input for node construction.
///
/// Decoder output converts losslessly through `From<Value>`. The other
/// variants only come from hand-built input and are classified by the
/// [`UnsafeNodeFactory`](super::UnsafeNodeFactory).
#[derive(Debug)]
pub enum HostValue {
    Null,
    Bool(bool),
    Number(Number),
    /// A raw float; non-finite values cannot be represented.
    Float(f64),
    String(String),
    /// Keyed sequence. Packed when keyed `0, 1, 2, ...` in order.
    Sequence(IndexMap<HostKey, HostValue>),
    Record(IndexMap<String, HostValue>),
    Serializable(Box<dyn JsonSerializable>),
    Bytes(Vec<u8>),
}

/// Key of a [`HostValue::Sequence`] entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostKey {
    Index(i64),
    Name(String),
}

impl fmt::Display for HostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostKey::Index(i) => write!(f, "{i}"),
            HostKey::Name(n) => f.write_str(n),
        }
    }
}

/// A host object that knows its own JSON form.
pub trait JsonSerializable: fmt::Debug {
    fn json_serialize(&self) -> HostValue;
}

impl HostValue {
    /// Packed sequence of `items`.
    pub fn sequence<I>(items: I) -> Self
    where
        I: IntoIterator<Item = HostValue>,
    {
        HostValue::Sequence(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (HostKey::Index(i as i64), item))
                .collect(),
        )
    }

    pub fn record<I, K>(members: I) -> Self
    where
        I: IntoIterator<Item = (K, HostValue)>,
        K: Into<String>,
    {
        HostValue::Record(members.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Type name used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            HostValue::Null => "null",
            HostValue::Bool(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::Float(_) => "float",
            HostValue::String(_) => "string",
            HostValue::Sequence(_) => "sequence",
            HostValue::Record(_) => "record",
            HostValue::Serializable(_) => "serializable",
            HostValue::Bytes(_) => "bytes",
        }
    }
}

impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => HostValue::Null,
            Value::Bool(b) => HostValue::Bool(b),
            Value::Number(n) => HostValue::Number(n),
            Value::String(s) => HostValue::String(s),
            Value::Array(items) => HostValue::sequence(items.into_iter().map(HostValue::from)),
            Value::Object(members) => {
                HostValue::record(members.into_iter().map(|(k, v)| (k, HostValue::from(v))))
            }
        }
    }
}

impl From<&Value> for HostValue {
    fn from(value: &Value) -> Self {
        HostValue::from(value.clone())
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<i64> for HostValue {
    fn from(n: i64) -> Self {
        HostValue::Number(Number::from(n))
    }
}

impl From<f64> for HostValue {
    fn from(f: f64) -> Self {
        HostValue::Float(f)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::String(s.to_string())
    }
}

impl From<String> for HostValue {
    fn from(s: String) -> Self {
        HostValue::String(s)
    }
}
