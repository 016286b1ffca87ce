//! Core data types for the decode/aggregate pipeline
//!
//! This module contains the protocol and broadcast classifications shared
//! by the decoder, the registry, and the renderer seam, plus the per-cycle
//! telemetry snapshot the pipeline reports for display.
//!
//! # Main Types
//!
//! - [`ProtoClass`] - Coarse per-packet protocol classification
//! - [`BroadcastClass`] - Fixed four-tag multicast/broadcast bucket set
//! - [`CommSummary`] - Per-destination 4-counter traffic breakdown
//! - [`CycleStats`] - Telemetry emitted after each pipeline cycle

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Coarse protocol classification of observed L2 traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtoClass {
    /// IPv4 payloads
    Ipv4,
    /// IPv6 payloads
    Ipv6,
    /// ARP frames
    Arp,
    /// Anything else
    Unknown,
}

impl ProtoClass {
    /// All protocol classes, in counter order.
    pub fn all() -> [ProtoClass; 4] {
        [
            ProtoClass::Ipv4,
            ProtoClass::Ipv6,
            ProtoClass::Arp,
            ProtoClass::Unknown,
        ]
    }
}

impl std::fmt::Display for ProtoClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtoClass::Ipv4 => write!(f, "ipv4"),
            ProtoClass::Ipv6 => write!(f, "ipv6"),
            ProtoClass::Arp => write!(f, "arp"),
            ProtoClass::Unknown => write!(f, "unknown"),
        }
    }
}

/// Broadcast-class tag for multicast/broadcast address buckets.
///
/// The wire format delivers the four per-class breakdowns positionally in
/// exactly this order. `Odd` is the catch-all bucket for odd
/// least-significant-bit multicast addresses matching none of the fixed
/// prefixes; the classification itself happens producer-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BroadcastClass {
    /// `ff` prefix (link broadcast)
    Ff,
    /// `33` prefix (IPv6 multicast)
    Mc33,
    /// `01` prefix (IPv4 multicast / control protocols)
    Mc01,
    /// Other odd-LSB multicast addresses
    Odd,
}

impl BroadcastClass {
    /// All broadcast classes, in the fixed wire order ff/33/01/odd.
    pub fn all() -> [BroadcastClass; 4] {
        [
            BroadcastClass::Ff,
            BroadcastClass::Mc33,
            BroadcastClass::Mc01,
            BroadcastClass::Odd,
        ]
    }

    /// Positional index within the wire order.
    pub fn index(self) -> usize {
        match self {
            BroadcastClass::Ff => 0,
            BroadcastClass::Mc33 => 1,
            BroadcastClass::Mc01 => 2,
            BroadcastClass::Odd => 3,
        }
    }

    /// The short tag the producer uses for this class.
    pub fn tag(self) -> &'static str {
        match self {
            BroadcastClass::Ff => "ff",
            BroadcastClass::Mc33 => "33",
            BroadcastClass::Mc01 => "01",
            BroadcastClass::Odd => "odd",
        }
    }
}

impl std::fmt::Display for BroadcastClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Maximum simultaneous visual lines a single communication record may
/// request from the renderer, regardless of its packet count.
pub const MAX_VISUAL_LINES: u64 = 4;

/// Per-destination traffic breakdown: one counter per protocol class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommSummary {
    pub ipv4: u64,
    pub ipv6: u64,
    pub arp: u64,
    pub unknown: u64,
}

impl CommSummary {
    /// Counter for a single protocol class.
    pub fn get(&self, proto: ProtoClass) -> u64 {
        match proto {
            ProtoClass::Ipv4 => self.ipv4,
            ProtoClass::Ipv6 => self.ipv6,
            ProtoClass::Arp => self.arp,
            ProtoClass::Unknown => self.unknown,
        }
    }

    /// Total traffic weight of this record. Saturates: wire counts are
    /// untrusted and must not overflow into a panic or a wrapped counter.
    pub fn total(&self) -> u64 {
        self.ipv4
            .saturating_add(self.ipv6)
            .saturating_add(self.arp)
            .saturating_add(self.unknown)
    }

    /// Whether all counters are zero.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Number of visual lines this record should drive, capped at
    /// [`MAX_VISUAL_LINES`].
    pub fn line_count(&self) -> u64 {
        self.total().min(MAX_VISUAL_LINES)
    }
}

/// Per-cycle telemetry snapshot for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Events seen this cycle, decoded and dropped alike
    pub event_cnt: u64,
    /// Inverse sampling rate in effect after this cycle's transition
    pub inv_sample_rate: u32,
    /// Cumulative packets the producer reported dropping upstream
    pub tot_pkt_drop: u64,
    /// Cumulative events this pipeline dropped at the sampling gate
    pub tot_epoch_drop: u64,
    /// Most recently reported capture lag
    pub current_lag: Duration,
}
