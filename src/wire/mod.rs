//! Wire payload model for pub/sub telemetry events
//!
//! Incoming events carry loosely-typed, recursively-structured payloads.
//! This module models them as the [`WireValue`] tagged union and provides
//! fallible typed extraction on top of it.
//!
//! The extraction contract is the backbone of the decoder's failure policy:
//! nothing here ever panics on a mis-shaped payload. Every accessor returns
//! a [`ShapeError`] naming the field and the expected-vs-observed variant,
//! and callers skip the offending sub-record and keep going.

pub mod extract;
pub mod value;

pub use extract::{device_id_to_mac, ipv4_from_addr, mac_to_device_id, ShapeError};
pub use value::{Addr, WireValue};
