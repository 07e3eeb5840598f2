//! Response decoder module
//!
//! # Overview
//!
//! Turns a response body into records. Bodies are parsed with serde_json's
//! `arbitrary_precision`, so numeric literals keep their exact text and
//! become [`BigDecimal`](bigdecimal::BigDecimal) values instead of `f64`.
//! Only the record list is extracted from the enclosing envelope.

mod decoder;
mod types;

pub use decoder::{DecodedPage, RecordDecoder};
pub use types::RecordLocation;

#[cfg(test)]
mod tests;
