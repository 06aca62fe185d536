//! Notification Normalization
//!
//! Extracts a canonical [`ScanEvent`] from the untyped bags that scanner
//! vendors broadcast. Extraction probes a fixed sequence of known shapes
//! and takes the first that matches; candidates are never merged. A bag
//! matching none of the shapes yields `None` and must be dropped by the
//! caller with no further effect.

use log::debug;

use crate::event::{RawNotification, ScanEvent};

/// Zebra DataWedge decoded-data extra.
pub const DATAWEDGE_DATA: &str = "com.symbol.datawedge.data_string";
/// Zebra DataWedge symbology extra.
pub const DATAWEDGE_LABEL_TYPE: &str = "com.symbol.datawedge.label_type";
/// Generic string keys, probed in priority order.
pub const GENERIC_CODE_KEYS: [&str; 4] = ["barcode", "barCode", "data", "text"];
/// Byte-payload key used by several budget scanner firmwares (the typo is
/// theirs and is what actually arrives on the wire).
pub const BYTES_KEY: &str = "barocode";
/// Explicit length extra accompanying the byte payload.
pub const LENGTH_KEY: &str = "length";

const BARCODE_TYPE_KEY: &str = "barcodeType";
const AIM_ID_KEY: &str = "aimid";

/// Recognized notification shapes, in match order.
#[derive(Debug)]
enum Extracted {
    /// Vendor-structured DataWedge keys. Carries no AIM identifier.
    Vendor { data: String, label_type: String },
    /// One of the generic string keys.
    Generic {
        code: String,
        barcode_type: String,
        aim_id: String,
    },
    /// Byte payload plus an explicit length field.
    RawBytes {
        bytes: Vec<u8>,
        length: usize,
        barcode_type: String,
        aim_id: String,
    },
}

/// Normalize a raw notification into a canonical scan event.
///
/// Returns `None` when no extraction candidate matches, or when the
/// matching candidate decodes to an empty code (an event is either fully
/// populated or does not exist).
pub fn normalize(raw: &RawNotification) -> Option<ScanEvent> {
    let Some(extracted) = classify(raw) else {
        debug!("Notification matched no known shape, dropping");
        return None;
    };

    let event = match extracted {
        Extracted::Vendor { data, label_type } => {
            let length = data.chars().count();
            ScanEvent::new(data, length, label_type, String::new())
        }
        Extracted::Generic {
            code,
            barcode_type,
            aim_id,
        } => {
            let length = code.chars().count();
            ScanEvent::new(code, length, barcode_type, aim_id)
        }
        Extracted::RawBytes {
            bytes,
            length,
            barcode_type,
            aim_id,
        } => {
            let code = decode_bytes(&bytes, length);
            // The reported length is kept verbatim even when it disagrees
            // with the decoded text length.
            ScanEvent::new(code, length, barcode_type, aim_id)
        }
    };

    if event.code.is_empty() {
        debug!("Extracted an empty code, dropping");
        return None;
    }
    Some(event)
}

/// Ordered pattern match over the known shapes. First match wins; no
/// merging across candidates.
fn classify(raw: &RawNotification) -> Option<Extracted> {
    if let Some(data) = raw.text(DATAWEDGE_DATA) {
        return Some(Extracted::Vendor {
            data: data.to_string(),
            label_type: raw.text(DATAWEDGE_LABEL_TYPE).unwrap_or_default().to_string(),
        });
    }

    for key in GENERIC_CODE_KEYS {
        if let Some(code) = raw.text(key) {
            return Some(Extracted::Generic {
                code: code.to_string(),
                barcode_type: raw.text(BARCODE_TYPE_KEY).unwrap_or_default().to_string(),
                aim_id: raw.text(AIM_ID_KEY).unwrap_or_default().to_string(),
            });
        }
    }

    let bytes = raw.bytes(BYTES_KEY)?;
    let reported = raw.int(LENGTH_KEY).unwrap_or(bytes.len() as i64);
    let length = usize::try_from(reported).ok().filter(|len| *len > 0)?;
    Some(Extracted::RawBytes {
        bytes: bytes.to_vec(),
        length,
        barcode_type: raw.text(BARCODE_TYPE_KEY).unwrap_or_default().to_string(),
        aim_id: raw.text(AIM_ID_KEY).unwrap_or_default().to_string(),
    })
}

/// Decode up to `length` bytes as UTF-8, degrading to a one-byte-per-char
/// decoding on invalid sequences. Never fails the extraction.
fn decode_bytes(bytes: &[u8], length: usize) -> String {
    let take = length.min(bytes.len());
    match std::str::from_utf8(&bytes[..take]) {
        Ok(text) => text.to_string(),
        Err(_) => bytes[..take].iter().map(|&b| b as char).collect(),
    }
}
