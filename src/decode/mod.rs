//! Epoch-step decoding
//!
//! One pub/sub event on the epoch topic carries a batch of network
//! observations in a fixed positional schema. [`EpochDecoder`] turns one
//! such payload into a transient [`EpochStep`] of typed facts.
//!
//! # Wire schema
//!
//! The payload is an outer sequence, indexed positionally:
//!
//! | index | content |
//! |-------|---------|
//! | 0 | set of newly-seen device MAC strings |
//! | 1 | table src-MAC → (table dst-MAC → summary seq) |
//! | 2 | table MAC → IPv4 address (new L3 associations) |
//! | 3 | table MAC → (table MAC → IPv4 address) (ARP table) |
//!
//! Within a summary seq, index 1 is the 4-count protocol breakdown
//! `[ipv4, ipv6, arp, unknown]` and indices 2–5 are the four
//! broadcast-class breakdowns in the fixed tag order ff/33/01/odd.
//!
//! # Failure policy
//!
//! Decoding is defensive, field by field. A missing or mis-shaped field
//! aborts only the enclosing sub-record: it is logged and skipped, and
//! decoding continues with siblings. Partial decode is the normal failure
//! mode, never a fatal one.
//!
//! # Device creation rule
//!
//! The entered set (index 0) is processed first and is the only thing that
//! may create registry entries. Communication, L3, and ARP records whose
//! device ids are neither already registered nor in this event's entered
//! set are dropped — referencing a device does not register it.

use crate::registry::DeviceRegistry;
use crate::types::{BroadcastClass, CommSummary};
use crate::wire::{ipv4_from_addr, mac_to_device_id, ShapeError, WireValue};

/// Per-destination communication record: the protocol breakdown plus the
/// four broadcast-class sub-breakdowns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct L2CommRecord {
    /// Direct traffic breakdown by protocol class
    pub proto: CommSummary,
    /// Broadcast-class breakdowns, indexed by [`BroadcastClass::index`]
    pub broadcast: [CommSummary; 4],
}

impl L2CommRecord {
    /// Breakdown for one broadcast class.
    pub fn broadcast_for(&self, class: BroadcastClass) -> &CommSummary {
        &self.broadcast[class.index()]
    }
}

/// Typed facts decoded from one epoch-step event.
///
/// Constructed fresh per event, consumed immediately by the pipeline, then
/// discarded — never persisted.
#[derive(Debug, Default)]
pub struct EpochStep {
    /// Newly observed L2 device ids, deduplicated
    pub entered_l2: Vec<u64>,
    /// Per-source communication records: (src, [(dst, record)])
    pub device_comm: Vec<(u64, Vec<(u64, L2CommRecord)>)>,
    /// Newly observed L3 associations: (device, ipv4)
    pub entered_l3: Vec<(u64, u32)>,
    /// ARP table entries: (src, [(dst, ipv4)])
    pub arp_table: Vec<(u64, Vec<(u64, u32)>)>,
    /// Sum of all per-destination protocol totals — the event's weight
    pub packet_total: u64,
}

/// Decoder for epoch-step payloads.
///
/// Stateless; validation of device references reads the registry but the
/// decoder never mutates it. Applying the resulting [`EpochStep`] is the
/// pipeline's job.
#[derive(Debug, Default)]
pub struct EpochDecoder;

impl EpochDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode one epoch-step payload.
    ///
    /// Always returns a step; an unusable payload yields an empty one.
    pub fn decode(&self, payload: &WireValue, registry: &DeviceRegistry) -> EpochStep {
        let mut step = EpochStep::default();

        if let Err(e) = payload.as_seq("epoch_step") {
            tracing::warn!(error = %e, "epoch step payload is not a sequence, dropping event");
            return step;
        }

        // Order matters: the entered set must be known before communication
        // records are validated against it.
        match payload.seq_get(0, "epoch_step") {
            Ok(v) => self.decode_entered(v, &mut step),
            Err(e) => tracing::warn!(error = %e, "missing entered-device set"),
        }
        match payload.seq_get(1, "epoch_step") {
            Ok(v) => self.decode_comm(v, registry, &mut step),
            Err(e) => tracing::warn!(error = %e, "missing communication table"),
        }
        match payload.seq_get(2, "epoch_step") {
            Ok(v) => self.decode_l3(v, registry, &mut step),
            Err(e) => tracing::warn!(error = %e, "missing L3 association table"),
        }
        match payload.seq_get(3, "epoch_step") {
            Ok(v) => self.decode_arp(v, registry, &mut step),
            Err(e) => tracing::warn!(error = %e, "missing ARP table"),
        }

        step
    }

    /// Whether a device id may participate in this event's records.
    fn is_known(id: u64, registry: &DeviceRegistry, step: &EpochStep) -> bool {
        registry.contains(id) || step.entered_l2.contains(&id)
    }

    fn decode_entered(&self, value: &WireValue, step: &mut EpochStep) {
        let members = match value.as_set("entered_l2") {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "entered-device set mis-shaped, skipping");
                return;
            }
        };
        for member in members {
            match member.as_text("entered_l2.mac") {
                Ok(mac) => {
                    let id = mac_to_device_id(mac);
                    if !step.entered_l2.contains(&id) {
                        step.entered_l2.push(id);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "skipping entered-device entry"),
            }
        }
    }

    fn decode_comm(&self, value: &WireValue, registry: &DeviceRegistry, step: &mut EpochStep) {
        let table = match value.as_table("device_comm") {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "communication table mis-shaped, skipping");
                return;
            }
        };
        for (src_key, dst_table) in table {
            let src = match src_key.as_text("device_comm.src") {
                Ok(mac) => mac_to_device_id(mac),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping communication record");
                    continue;
                }
            };
            if !Self::is_known(src, registry, step) {
                tracing::warn!(
                    src = %crate::wire::device_id_to_mac(src),
                    "communication source never entered, dropping record"
                );
                continue;
            }
            let pairs = match dst_table.as_table("device_comm.dsts") {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping communication record");
                    continue;
                }
            };
            let mut dsts = Vec::new();
            for (dst_key, summary) in pairs {
                let dst = match dst_key.as_text("device_comm.dst") {
                    Ok(mac) => mac_to_device_id(mac),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping destination record");
                        continue;
                    }
                };
                if !Self::is_known(dst, registry, step) {
                    tracing::warn!(
                        dst = %crate::wire::device_id_to_mac(dst),
                        "communication destination never entered, dropping record"
                    );
                    continue;
                }
                match Self::comm_record(summary) {
                    Ok(record) => {
                        step.packet_total = step.packet_total.saturating_add(record.proto.total());
                        dsts.push((dst, record));
                    }
                    Err(e) => tracing::warn!(error = %e, "skipping destination record"),
                }
            }
            if !dsts.is_empty() {
                step.device_comm.push((src, dsts));
            }
        }
    }

    /// Parse one summary sequence into a communication record.
    fn comm_record(summary: &WireValue) -> Result<L2CommRecord, ShapeError> {
        let proto = Self::counts(summary.seq_get(1, "summary")?, "summary.proto")?;
        let mut broadcast = [CommSummary::default(); 4];
        for class in BroadcastClass::all() {
            let element = summary.seq_get(2 + class.index(), "summary")?;
            broadcast[class.index()] = Self::counts(element, class.tag())?;
        }
        Ok(L2CommRecord { proto, broadcast })
    }

    /// Parse a 4-count breakdown `[ipv4, ipv6, arp, unknown]`.
    fn counts(value: &WireValue, field: &str) -> Result<CommSummary, ShapeError> {
        Ok(CommSummary {
            ipv4: value.seq_get(0, field)?.as_count(field)?,
            ipv6: value.seq_get(1, field)?.as_count(field)?,
            arp: value.seq_get(2, field)?.as_count(field)?,
            unknown: value.seq_get(3, field)?.as_count(field)?,
        })
    }

    fn decode_l3(&self, value: &WireValue, registry: &DeviceRegistry, step: &mut EpochStep) {
        let table = match value.as_table("entered_l3") {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "L3 association table mis-shaped, skipping");
                return;
            }
        };
        for (key, addr) in table {
            let id = match key.as_text("entered_l3.mac") {
                Ok(mac) => mac_to_device_id(mac),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping L3 association");
                    continue;
                }
            };
            if !Self::is_known(id, registry, step) {
                tracing::warn!(
                    device = %crate::wire::device_id_to_mac(id),
                    "L3 association for device never entered, dropping"
                );
                continue;
            }
            match addr.as_addr("entered_l3.addr") {
                Ok(a) => step.entered_l3.push((id, ipv4_from_addr(a))),
                Err(e) => tracing::warn!(error = %e, "skipping L3 association"),
            }
        }
    }

    fn decode_arp(&self, value: &WireValue, registry: &DeviceRegistry, step: &mut EpochStep) {
        let table = match value.as_table("arp_table") {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "ARP table mis-shaped, skipping");
                return;
            }
        };
        for (src_key, entries) in table {
            let src = match src_key.as_text("arp_table.src") {
                Ok(mac) => mac_to_device_id(mac),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping ARP record");
                    continue;
                }
            };
            if !Self::is_known(src, registry, step) {
                tracing::warn!(
                    src = %crate::wire::device_id_to_mac(src),
                    "ARP source never entered, dropping record"
                );
                continue;
            }
            let pairs = match entries.as_table("arp_table.entries") {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping ARP record");
                    continue;
                }
            };
            let mut decoded = Vec::new();
            for (dst_key, addr) in pairs {
                let dst = match dst_key.as_text("arp_table.dst") {
                    Ok(mac) => mac_to_device_id(mac),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping ARP entry");
                        continue;
                    }
                };
                if !Self::is_known(dst, registry, step) {
                    tracing::warn!(
                        dst = %crate::wire::device_id_to_mac(dst),
                        "ARP destination never entered, dropping entry"
                    );
                    continue;
                }
                match addr.as_addr("arp_table.addr") {
                    Ok(a) => decoded.push((dst, ipv4_from_addr(a))),
                    Err(e) => tracing::warn!(error = %e, "skipping ARP entry"),
                }
            }
            if !decoded.is_empty() {
                step.arp_table.push((src, decoded));
            }
        }
    }
}
