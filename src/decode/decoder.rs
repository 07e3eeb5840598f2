//! Record decoder implementation

use super::types::RecordLocation;
use crate::error::{Error, Result};
use crate::pagination::{ResponseShape, RECORDS_KEY};
use crate::types::Record;
use serde_json::Value;

/// Records of one page together with the shape the paginator inspects
#[derive(Debug, Clone, Default)]
pub struct DecodedPage {
    /// Decoded records, in response order
    pub records: Vec<Record>,
    /// What the paginator needs from the envelope
    pub shape: ResponseShape,
}

/// JSON decoder producing exact-decimal records
#[derive(Debug, Clone, Default)]
pub struct RecordDecoder {
    location: RecordLocation,
}

impl RecordDecoder {
    /// Create a decoder that auto-detects the envelope
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder for a fixed record location
    pub fn with_location(location: RecordLocation) -> Self {
        Self { location }
    }

    /// The configured record location
    pub fn location(&self) -> &RecordLocation {
        &self.location
    }

    /// Decode the records of a response body.
    ///
    /// `path` is only used for error context.
    pub fn decode(&self, path: &str, body: &str) -> Result<Vec<Record>> {
        Ok(self.decode_page(path, body)?.records)
    }

    /// Decode a body into records and its pagination shape, parsing once
    pub fn decode_page(&self, path: &str, body: &str) -> Result<DecodedPage> {
        let envelope = parse(path, body)?;
        let has_continuation = ResponseShape::from_body(&envelope).has_continuation;
        let records = self.extract(path, envelope)?;
        let shape = ResponseShape::new(has_continuation, records.len());
        Ok(DecodedPage { records, shape })
    }

    /// Pull the record list out of an already parsed envelope
    pub fn extract(&self, path: &str, envelope: Value) -> Result<Vec<Record>> {
        let items = match (&self.location, envelope) {
            (RecordLocation::Auto, Value::Object(mut map)) => {
                take_array(path, &mut map, RECORDS_KEY)?
            }
            (RecordLocation::Key(key), Value::Object(mut map)) => take_array(path, &mut map, key)?,
            (RecordLocation::Auto | RecordLocation::Root, Value::Array(items)) => items,
            (_, other) => {
                return Err(Error::decode(
                    path,
                    format!("unexpected {} envelope", type_name(&other)),
                ))
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Record::from_json_map(map)
                    .map_err(|e| Error::decode(path, format!("record {i}: {e}"))),
                other => Err(Error::decode(
                    path,
                    format!("record {i} is {}, expected object", type_name(&other)),
                )),
            })
            .collect()
    }
}

fn parse(path: &str, body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Err(Error::decode(path, "empty response body"));
    }
    serde_json::from_str(body).map_err(|e| Error::decode(path, format!("invalid JSON: {e}")))
}

fn take_array(path: &str, map: &mut serde_json::Map<String, Value>, key: &str) -> Result<Vec<Value>> {
    match map.remove(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(other) => Err(Error::decode(
            path,
            format!("'{key}' is {}, expected array", type_name(&other)),
        )),
        None => Err(Error::decode(path, format!("missing '{key}' in envelope"))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
