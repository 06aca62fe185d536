//! Scan Event Structures
//!
//! The canonical scan event produced by normalization, and the untyped
//! key→value bag shape in which scanner vendors deliver their broadcasts.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Normalized scan record produced from any recognized notification shape.
///
/// A `ScanEvent` only exists fully populated: `code` is never empty, and
/// `barcode_type`/`aim_id` are empty strings rather than absent when the
/// vendor did not report them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanEvent {
    /// Decoded scan payload.
    pub code: String,
    /// Payload length as reported or computed. Vendor firmware may report
    /// a byte count where the decoded text length differs; the value is
    /// surfaced as-is, not reconciled.
    pub length: usize,
    /// Vendor-reported symbology, empty when unknown.
    pub barcode_type: String,
    /// AIM identifier, empty when the vendor format does not carry one.
    pub aim_id: String,
    /// UTF-8 re-encoding of `code` for binary-sensitive consumers.
    pub raw: Vec<u8>,
}

impl ScanEvent {
    /// Build an event from its decoded parts, deriving `raw` from `code`.
    pub fn new(code: String, length: usize, barcode_type: String, aim_id: String) -> Self {
        let raw = code.clone().into_bytes();
        Self {
            code,
            length,
            barcode_type,
            aim_id,
            raw,
        }
    }
}

/// A single value inside a vendor notification bag.
///
/// Untagged so that plain JSON bags deserialize directly: strings become
/// `Text`, integers `Int`, and byte arrays `Bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtraValue {
    Text(String),
    Int(i64),
    Bytes(Vec<u8>),
}

/// Untyped key→value bag as delivered by a scanner broadcast.
///
/// Consumed once by the normalizer; never stored. Keys and value types are
/// vendor-specific and carry no schema guarantees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawNotification {
    extras: HashMap<String, ExtraValue>,
}

impl RawNotification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a string extra.
    pub fn with_text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), ExtraValue::Text(value.into()));
        self
    }

    /// Add an integer extra.
    pub fn with_int(mut self, key: impl Into<String>, value: i64) -> Self {
        self.extras.insert(key.into(), ExtraValue::Int(value));
        self
    }

    /// Add a byte-sequence extra.
    pub fn with_bytes(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.extras.insert(key.into(), ExtraValue::Bytes(value.into()));
        self
    }

    /// String value under `key`, if present with that type.
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.extras.get(key) {
            Some(ExtraValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    /// Integer value under `key`, if present with that type.
    pub fn int(&self, key: &str) -> Option<i64> {
        match self.extras.get(key) {
            Some(ExtraValue::Int(value)) => Some(*value),
            _ => None,
        }
    }

    /// Byte-sequence value under `key`, if present with that type.
    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        match self.extras.get(key) {
            Some(ExtraValue::Bytes(value)) => Some(value),
            _ => None,
        }
    }
}
