//! Test data builders for wire payloads

use netvis_rs::wire::{Addr, WireValue};
use std::time::Duration;

/// Builder for epoch-step payloads in the positional wire schema.
pub struct EpochPayloadBuilder {
    entered: Vec<String>,
    comm: Vec<(String, String, [u64; 4], [[u64; 4]; 4])>,
    l3: Vec<(String, [u8; 4])>,
    arp: Vec<(String, String, [u8; 4])>,
}

impl EpochPayloadBuilder {
    pub fn new() -> Self {
        Self {
            entered: Vec::new(),
            comm: Vec::new(),
            l3: Vec::new(),
            arp: Vec::new(),
        }
    }

    /// Add a MAC to the entered-devices set.
    pub fn entered(mut self, mac: &str) -> Self {
        self.entered.push(mac.to_string());
        self
    }

    /// Add a communication record with only direct protocol counts.
    pub fn comm(self, src: &str, dst: &str, proto: [u64; 4]) -> Self {
        self.comm_with_broadcast(src, dst, proto, [[0; 4]; 4])
    }

    /// Add a communication record with broadcast-class breakdowns in the
    /// fixed ff/33/01/odd order.
    pub fn comm_with_broadcast(
        mut self,
        src: &str,
        dst: &str,
        proto: [u64; 4],
        broadcast: [[u64; 4]; 4],
    ) -> Self {
        self.comm
            .push((src.to_string(), dst.to_string(), proto, broadcast));
        self
    }

    /// Add a new L3 association.
    pub fn l3(mut self, mac: &str, ipv4: [u8; 4]) -> Self {
        self.l3.push((mac.to_string(), ipv4));
        self
    }

    /// Add an ARP table entry.
    pub fn arp(mut self, src: &str, dst: &str, ipv4: [u8; 4]) -> Self {
        self.arp.push((src.to_string(), dst.to_string(), ipv4));
        self
    }

    fn counts(values: [u64; 4]) -> WireValue {
        WireValue::Seq(values.into_iter().map(WireValue::Count).collect())
    }

    fn summary(proto: [u64; 4], broadcast: [[u64; 4]; 4]) -> WireValue {
        let mut items = vec![WireValue::Absent, Self::counts(proto)];
        items.extend(broadcast.into_iter().map(Self::counts));
        WireValue::Seq(items)
    }

    pub fn build(self) -> WireValue {
        let entered = WireValue::set(self.entered.iter().map(|m| WireValue::text(m.clone())));

        // Group communication records by source, preserving order.
        let mut comm: Vec<(WireValue, Vec<(WireValue, WireValue)>)> = Vec::new();
        for (src, dst, proto, broadcast) in &self.comm {
            let key = WireValue::text(src.clone());
            let entry = (
                WireValue::text(dst.clone()),
                Self::summary(*proto, *broadcast),
            );
            match comm.iter_mut().find(|(k, _)| *k == key) {
                Some((_, dsts)) => dsts.push(entry),
                None => comm.push((key, vec![entry])),
            }
        }
        let comm = WireValue::Table(
            comm.into_iter()
                .map(|(k, dsts)| (k, WireValue::Table(dsts)))
                .collect(),
        );

        let l3 = WireValue::Table(
            self.l3
                .iter()
                .map(|(mac, ip)| {
                    (
                        WireValue::text(mac.clone()),
                        WireValue::Address(Addr::V4(*ip)),
                    )
                })
                .collect(),
        );

        let mut arp: Vec<(WireValue, Vec<(WireValue, WireValue)>)> = Vec::new();
        for (src, dst, ip) in &self.arp {
            let key = WireValue::text(src.clone());
            let entry = (
                WireValue::text(dst.clone()),
                WireValue::Address(Addr::V4(*ip)),
            );
            match arp.iter_mut().find(|(k, _)| *k == key) {
                Some((_, entries)) => entries.push(entry),
                None => arp.push((key, vec![entry])),
            }
        }
        let arp = WireValue::Table(
            arp.into_iter()
                .map(|(k, entries)| (k, WireValue::Table(entries)))
                .collect(),
        );

        WireValue::Seq(vec![entered, comm, l3, arp])
    }
}

impl Default for EpochPayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a producer-stats payload: `[observed, dropped, lag]`.
pub fn stats_payload(observed: u64, dropped: u64, lag: Duration) -> WireValue {
    WireValue::Seq(vec![
        WireValue::Count(observed),
        WireValue::Count(dropped),
        WireValue::Interval(lag),
    ])
}
