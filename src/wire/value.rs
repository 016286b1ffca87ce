//! The [`WireValue`] tagged union — the payload model for every event
//! delivered by the transport.

use std::time::Duration;

/// A raw network address carried in a payload: IPv4 or IPv6 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addr {
    /// 4-byte IPv4 address, network byte order
    V4([u8; 4]),
    /// 16-byte IPv6 address, network byte order
    V16([u8; 16]),
}

impl std::fmt::Display for Addr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Addr::V4(b) => write!(f, "{}.{}.{}.{}", b[0], b[1], b[2], b[3]),
            Addr::V16(b) => {
                for (i, chunk) in b.chunks(2).enumerate() {
                    if i > 0 {
                        write!(f, ":")?;
                    }
                    write!(f, "{:02x}{:02x}", chunk[0], chunk[1])?;
                }
                Ok(())
            }
        }
    }
}

/// A dynamically-typed wire payload value.
///
/// Payloads arrive as arbitrarily nested compositions of these variants.
/// Tables are association lists keyed by structural equality — key order is
/// whatever the producer sent, and lookup is linear. Sets hold unique
/// members in arrival order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WireValue {
    /// No value present
    #[default]
    Absent,
    /// Boolean flag
    Bool(bool),
    /// Non-negative integer count
    Count(u64),
    /// UTF-8 text
    Text(String),
    /// Byte address (IPv4 or IPv6)
    Address(Addr),
    /// Time duration
    Interval(Duration),
    /// Ordered sequence of values
    Seq(Vec<WireValue>),
    /// Unordered set of unique values
    Set(Vec<WireValue>),
    /// Key-value table
    Table(Vec<(WireValue, WireValue)>),
}

impl WireValue {
    /// Variant tag name, used in shape diagnostics.
    pub fn variant_name(&self) -> &'static str {
        match self {
            WireValue::Absent => "absent",
            WireValue::Bool(_) => "bool",
            WireValue::Count(_) => "count",
            WireValue::Text(_) => "text",
            WireValue::Address(_) => "address",
            WireValue::Interval(_) => "interval",
            WireValue::Seq(_) => "seq",
            WireValue::Set(_) => "set",
            WireValue::Table(_) => "table",
        }
    }

    /// Convenience constructor for a text value.
    pub fn text(s: impl Into<String>) -> Self {
        WireValue::Text(s.into())
    }

    /// Build a set, deduplicating members by structural equality.
    pub fn set(members: impl IntoIterator<Item = WireValue>) -> Self {
        let mut unique: Vec<WireValue> = Vec::new();
        for m in members {
            if !unique.contains(&m) {
                unique.push(m);
            }
        }
        WireValue::Set(unique)
    }

    /// Build a table from key-value pairs.
    pub fn table(pairs: impl IntoIterator<Item = (WireValue, WireValue)>) -> Self {
        WireValue::Table(pairs.into_iter().collect())
    }

    /// Whether this value is the absent marker.
    pub fn is_absent(&self) -> bool {
        matches!(self, WireValue::Absent)
    }
}
