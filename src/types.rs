//! Common types used throughout the tap
//!
//! Records, their field values, and the replication cursor that bounds an
//! incremental fetch.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Field Values
// ============================================================================

/// A single decoded field value.
///
/// Numbers are always exact decimals. Timestamps arrive as strings and can
/// be read with [`FieldValue::as_timestamp`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Decimal(BigDecimal),
    String(String),
    List(Vec<FieldValue>),
    Object(Record),
}

impl FieldValue {
    /// Convert a JSON value, turning every number into an exact decimal.
    ///
    /// Relies on serde_json's `arbitrary_precision` so `Number`'s text is
    /// the literal from the wire.
    pub fn from_json(value: Value) -> Result<Self, String> {
        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                let text = n.to_string();
                let decimal = BigDecimal::from_str(&text)
                    .map_err(|e| format!("invalid number literal '{text}': {e}"))?;
                Self::Decimal(decimal)
            }
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(Self::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => Self::Object(Record::from_json_map(map)?),
        })
    }

    /// Check for null
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrow as string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow as decimal
    pub fn as_decimal(&self) -> Option<&BigDecimal> {
        match self {
            Self::Decimal(d) => Some(d),
            _ => None,
        }
    }

    /// Read as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Parse a string value as a UTC timestamp.
    ///
    /// Accepts RFC 3339 date-times and plain `YYYY-MM-DD` dates (midnight UTC).
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.as_str()?)
    }

    /// Order two values the way a replication key advances.
    ///
    /// Decimals compare numerically, timestamp strings chronologically, other
    /// strings lexically. Mixed or non-scalar pairs are unordered.
    pub fn cursor_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (Self::String(a), Self::String(b)) => match (parse_timestamp(a), parse_timestamp(b)) {
                (Some(ta), Some(tb)) => Some(ta.cmp(&tb)),
                _ => Some(a.cmp(b)),
            },
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Render this value as an OData literal.
    ///
    /// Dates, date-times, decimals and booleans are written bare; other
    /// strings are single-quoted with embedded quotes doubled.
    pub fn to_odata_literal(&self) -> Option<String> {
        match self {
            Self::Null => Some("null".to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Decimal(d) => Some(d.to_plain_string()),
            Self::String(s) if parse_timestamp(s).is_some() => Some(s.clone()),
            Self::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
            Self::List(_) | Self::Object(_) => None,
        }
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Decimal(d) => f.write_str(&d.to_plain_string()),
            Self::String(s) => f.write_str(s),
            other => {
                let text = serde_json::to_string(other).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<BigDecimal> for FieldValue {
    fn from(d: BigDecimal) -> Self {
        Self::Decimal(d)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Decimal(d) => {
                // Plain notation through Number: no f64, no exponent form
                let text = d.to_plain_string();
                match serde_json::Number::from_str(&text) {
                    Ok(n) => n.serialize(serializer),
                    Err(_) => serializer.serialize_str(&text),
                }
            }
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => items.serialize(serializer),
            Self::Object(record) => record.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(value).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Records
// ============================================================================

/// An ordered mapping from field name to value.
///
/// Field order follows the response body. Lookups are linear; records in
/// this API carry tens of fields, not thousands.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert a JSON object, preserving key order
    pub fn from_json_map(map: JsonObject) -> Result<Self, String> {
        let mut fields = Vec::with_capacity(map.len());
        for (key, value) in map {
            fields.push((key, FieldValue::from_json(value)?));
        }
        Ok(Self { fields })
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Insert or replace a field, keeping the position of an existing key
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Iterate fields in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialize to a JSON string with exact decimals
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = JsonObject::deserialize(deserializer)?;
        Self::from_json_map(map).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Replication Cursor
// ============================================================================

/// Lower bound for an incremental fetch.
///
/// The fetcher only reads it; advancing it as records are consumed is up to
/// the caller.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReplicationCursor {
    /// Replication key field name
    pub key: String,
    /// Last value seen for that field
    pub value: FieldValue,
}

impl ReplicationCursor {
    /// Create a new cursor
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Render the `<key> gt <value>` filter clause
    pub fn filter_clause(&self) -> Option<String> {
        self.value
            .to_odata_literal()
            .map(|literal| format!("{} gt {literal}", self.key))
    }
}
