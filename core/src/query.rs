//! Query-string serialization.
//!
//! `build_url` appends an ordered parameter list to a URL. Values are encoded
//! the way `encodeURIComponent` does it, after which `@ : $ , [ ]` are put back
//! and spaces become `+` so the result stays readable.

use chrono::{DateTime, SecondsFormat, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Characters left untouched: the `encodeURIComponent` unreserved set plus the
/// readability exceptions. Space is still encoded and rewritten to `+`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'@')
    .remove(b':')
    .remove(b'$')
    .remove(b',')
    .remove(b'[')
    .remove(b']');

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Skipped entirely when building the query.
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Date(DateTime<Utc>),
    /// Serialized as JSON text.
    Object(Map<String, Value>),
    /// Expands to one `key[]=value` pair per element.
    Array(Vec<ParamValue>),
}

impl ParamValue {
    /// Text form of a non-array value. `None` for `Null`.
    fn serialize(&self) -> Option<String> {
        match self {
            ParamValue::Null => None,
            ParamValue::Bool(b) => Some(b.to_string()),
            ParamValue::Number(n) => Some(number_text(n)),
            ParamValue::String(s) => Some(s.clone()),
            ParamValue::Date(d) => Some(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ParamValue::Object(map) => serde_json::to_string(map).ok(),
            // nested arrays stringify comma-joined
            ParamValue::Array(items) => Some(
                items
                    .iter()
                    .map(|item| item.serialize().unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        }
    }
}

/// Text of a number as JavaScript's `String(n)` prints it: whole values carry
/// no fraction, non-finite values spell out `Infinity` / `NaN`.
fn float_text(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        (value as i64).to_string()
    } else {
        value.to_string()
    }
}

fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(value) if n.is_f64() => float_text(value),
        _ => n.to_string(),
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ParamValue::Null,
            Value::Bool(b) => ParamValue::Bool(b),
            Value::Number(n) => ParamValue::Number(n),
            Value::String(s) => ParamValue::String(s),
            Value::Array(items) => ParamValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => ParamValue::Object(map),
        }
    }
}

impl From<ParamValue> for Value {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Null => Value::Null,
            ParamValue::Bool(b) => Value::Bool(b),
            ParamValue::Number(n) => Value::Number(n),
            ParamValue::String(s) => Value::String(s),
            ParamValue::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ParamValue::Object(map) => Value::Object(map),
            ParamValue::Array(items) => Value::Array(items.into_iter().map(Into::into).collect()),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

macro_rules! int_param {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(value: $t) -> Self {
                ParamValue::Number(Number::from(value))
            }
        })*
    };
}

int_param!(i32, i64, u32, u64, usize);

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        // non-finite values have no JSON number form
        Number::from_f64(value)
            .map(ParamValue::Number)
            .unwrap_or_else(|| ParamValue::String(float_text(value)))
    }
}

impl From<DateTime<Utc>> for ParamValue {
    fn from(value: DateTime<Utc>) -> Self {
        ParamValue::Date(value)
    }
}

impl From<Map<String, Value>> for ParamValue {
    fn from(value: Map<String, Value>) -> Self {
        ParamValue::Object(value)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(value: Vec<T>) -> Self {
        ParamValue::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ParamValue::Null)
    }
}

/// Ordered query parameters. Insertion order is the serialization order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Params(Vec<(String, ParamValue)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.push((key.to_string(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<Params> for Map<String, Value> {
    fn from(params: Params) -> Self {
        params.0.into_iter().map(|(k, v)| (k, v.into())).collect()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT)
        .to_string()
        .replace("%20", "+")
}

/// Serialize `params` into the query string of `url`.
///
/// Returns `url` unchanged when no pair survives (all values null or no
/// params). Otherwise any `#fragment` is dropped and the pairs are appended
/// with `?` or `&` depending on whether a query is already present.
pub fn build_url(url: &str, params: &Params) -> String {
    let mut parts = Vec::new();

    for (key, value) in params.iter() {
        match value {
            ParamValue::Null => continue,
            ParamValue::Array(items) => {
                let key = encode(&format!("{key}[]"));
                for item in items {
                    let text = item.serialize().unwrap_or_else(|| "null".to_string());
                    parts.push(format!("{key}={}", encode(&text)));
                }
            }
            other => {
                if let Some(text) = other.serialize() {
                    parts.push(format!("{}={}", encode(key), encode(&text)));
                }
            }
        }
    }

    if parts.is_empty() {
        return url.to_string();
    }

    let mut url = url.to_string();
    if let Some(mark) = url.find('#') {
        url.truncate(mark);
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    url.push(separator);
    url.push_str(&parts.join("&"));
    url
}
