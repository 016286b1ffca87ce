//! Typed, fallible extraction over [`WireValue`]
//!
//! Every accessor takes the logical field name it is reading so the
//! resulting [`ShapeError`] carries enough context to be useful in logs.
//! Accessors never panic; a wrong variant is always a typed failure the
//! caller can log and skip.

use crate::wire::value::{Addr, WireValue};
use std::time::Duration;
use thiserror::Error;

/// A field extraction found an unexpected payload variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("field `{field}`: expected {expected}, found {found}")]
pub struct ShapeError {
    /// Logical name of the field being extracted
    pub field: String,
    /// Variant tag the caller expected
    pub expected: &'static str,
    /// Variant tag actually observed
    pub found: &'static str,
}

impl ShapeError {
    pub fn new(field: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self {
            field: field.into(),
            expected,
            found,
        }
    }
}

impl WireValue {
    fn shape_err(&self, field: &str, expected: &'static str) -> ShapeError {
        ShapeError::new(field, expected, self.variant_name())
    }

    /// Extract a boolean.
    pub fn as_bool(&self, field: &str) -> Result<bool, ShapeError> {
        match self {
            WireValue::Bool(b) => Ok(*b),
            other => Err(other.shape_err(field, "bool")),
        }
    }

    /// Extract an integer count.
    pub fn as_count(&self, field: &str) -> Result<u64, ShapeError> {
        match self {
            WireValue::Count(n) => Ok(*n),
            other => Err(other.shape_err(field, "count")),
        }
    }

    /// Extract a text string.
    pub fn as_text(&self, field: &str) -> Result<&str, ShapeError> {
        match self {
            WireValue::Text(s) => Ok(s),
            other => Err(other.shape_err(field, "text")),
        }
    }

    /// Extract a byte address.
    pub fn as_addr(&self, field: &str) -> Result<Addr, ShapeError> {
        match self {
            WireValue::Address(a) => Ok(*a),
            other => Err(other.shape_err(field, "address")),
        }
    }

    /// Extract a time duration.
    pub fn as_interval(&self, field: &str) -> Result<Duration, ShapeError> {
        match self {
            WireValue::Interval(d) => Ok(*d),
            other => Err(other.shape_err(field, "interval")),
        }
    }

    /// Extract an ordered sequence.
    pub fn as_seq(&self, field: &str) -> Result<&[WireValue], ShapeError> {
        match self {
            WireValue::Seq(items) => Ok(items),
            other => Err(other.shape_err(field, "seq")),
        }
    }

    /// Extract a set of unique members.
    pub fn as_set(&self, field: &str) -> Result<&[WireValue], ShapeError> {
        match self {
            WireValue::Set(members) => Ok(members),
            other => Err(other.shape_err(field, "set")),
        }
    }

    /// Extract a key-value table.
    pub fn as_table(&self, field: &str) -> Result<&[(WireValue, WireValue)], ShapeError> {
        match self {
            WireValue::Table(pairs) => Ok(pairs),
            other => Err(other.shape_err(field, "table")),
        }
    }

    /// Extract the element at a positional index of a sequence.
    ///
    /// A too-short sequence reports the missing element as `absent`.
    pub fn seq_get(&self, index: usize, field: &str) -> Result<&WireValue, ShapeError> {
        let items = self.as_seq(field)?;
        items
            .get(index)
            .ok_or_else(|| ShapeError::new(format!("{field}[{index}]"), "seq element", "absent"))
    }

    /// Look up a table value by key, comparing keys structurally.
    pub fn table_get(&self, key: &WireValue, field: &str) -> Result<Option<&WireValue>, ShapeError> {
        let pairs = self.as_table(field)?;
        Ok(pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v))
    }
}

/// Convert a MAC address string to its canonical 48-bit device id.
///
/// Accepts exactly six colon-separated two-digit hex tokens. Anything else
/// (wrong token count, trailing garbage, bad digits) maps to device id 0
/// with a logged diagnostic — the original producer is the only party who
/// can fix a mangled MAC, so the decoder just flags it and moves on.
pub fn mac_to_device_id(text: &str) -> u64 {
    let mut id: u64 = 0;
    let mut tokens = 0usize;
    for token in text.split(':') {
        // from_str_radix tolerates a leading `+`, so check digits first
        if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            tracing::warn!(mac = text, "malformed MAC address token, mapping to device id 0");
            return 0;
        }
        match u8::from_str_radix(token, 16) {
            Ok(byte) => {
                id = (id << 8) | u64::from(byte);
                tokens += 1;
            }
            Err(_) => {
                tracing::warn!(mac = text, "non-hex MAC address token, mapping to device id 0");
                return 0;
            }
        }
    }
    if tokens != 6 {
        tracing::warn!(
            mac = text,
            tokens,
            "MAC address has wrong token count, mapping to device id 0"
        );
        return 0;
    }
    id
}

/// Format a 48-bit device id back into MAC address text.
pub fn device_id_to_mac(id: u64) -> String {
    let b = id.to_be_bytes();
    format!(
        "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
        b[2], b[3], b[4], b[5], b[6], b[7]
    )
}

/// Extract a 32-bit IPv4 value from a wire address.
///
/// IPv6 addresses contribute their lowest 4 bytes, matching the producer's
/// convention for mapped addresses.
pub fn ipv4_from_addr(addr: Addr) -> u32 {
    match addr {
        Addr::V4(b) => u32::from_be_bytes(b),
        Addr::V16(b) => u32::from_be_bytes([b[12], b[13], b[14], b[15]]),
    }
}
