//! Device registry — canonical device-id → device-state mapping
//!
//! The registry owns every [`DeviceState`] for the session. Entries are
//! created only through [`DeviceRegistry::ensure`], which the pipeline calls
//! exclusively for ids in an event's entered set; communication and ARP
//! records referencing an unknown id are skipped upstream, never
//! auto-created. The only deletion path is [`DeviceRegistry::reset`].

use std::collections::HashMap;

/// Aggregated state for one observed device.
#[derive(Debug, Clone)]
pub struct DeviceState {
    /// Canonical 48-bit device id (MAC)
    pub id: u64,
    /// Cumulative packets sent, monotonic
    pub sent: u64,
    /// Cumulative packets received, monotonic
    pub recv: u64,
    /// Liveness countdown: reset to the ceiling on traffic, decremented
    /// once per frame, floored at zero
    pub liveness: u32,
    /// Observed source IPs, append-only, deduplicated
    ips: Vec<u32>,
    /// Destination IP → peer device id, learned from ARP entries
    routes: HashMap<u32, u64>,
}

impl DeviceState {
    fn new(id: u64, liveness_ceiling: u32) -> Self {
        Self {
            id,
            sent: 0,
            recv: 0,
            liveness: liveness_ceiling,
            ips: Vec::new(),
            routes: HashMap::new(),
        }
    }

    /// Record an observed source IP. Duplicates are ignored.
    pub fn note_ip(&mut self, ipv4: u32) {
        if !self.ips.contains(&ipv4) {
            self.ips.push(ipv4);
        }
    }

    /// Record an ARP-learned route to a destination IP.
    pub fn note_route(&mut self, dst_ipv4: u32, peer: u64) {
        self.routes.insert(dst_ipv4, peer);
    }

    /// Observed source IPs, in first-seen order.
    pub fn ips(&self) -> &[u32] {
        &self.ips
    }

    /// ARP-learned peer for a destination IP, if known.
    pub fn route(&self, dst_ipv4: u32) -> Option<u64> {
        self.routes.get(&dst_ipv4).copied()
    }

    /// Number of ARP-learned routes.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Whether the liveness countdown has run out.
    pub fn is_stale(&self) -> bool {
        self.liveness == 0
    }
}

/// Session-wide device registry.
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: HashMap<u64, DeviceState>,
    liveness_ceiling: u32,
}

impl DeviceRegistry {
    /// Create an empty registry with the given liveness ceiling (frames).
    pub fn new(liveness_ceiling: u32) -> Self {
        Self {
            devices: HashMap::new(),
            liveness_ceiling,
        }
    }

    /// Get or create the state for a device id.
    ///
    /// Idempotent: repeated calls return the existing entry untouched —
    /// counters and liveness are not reset by re-entry.
    pub fn ensure(&mut self, id: u64) -> &mut DeviceState {
        let ceiling = self.liveness_ceiling;
        self.devices
            .entry(id)
            .or_insert_with(|| DeviceState::new(id, ceiling))
    }

    /// Record traffic between two already-registered devices.
    ///
    /// Unknown ids are a caller error (the decoder pre-validates against
    /// the entered set); they are logged and skipped, never auto-created.
    pub fn record_traffic(&mut self, src: u64, dst: u64, weight: u64) {
        if !self.devices.contains_key(&src) || !self.devices.contains_key(&dst) {
            tracing::warn!(
                src = %crate::wire::device_id_to_mac(src),
                dst = %crate::wire::device_id_to_mac(dst),
                "traffic record references unregistered device, skipping"
            );
            return;
        }
        let ceiling = self.liveness_ceiling;
        if let Some(s) = self.devices.get_mut(&src) {
            s.sent = s.sent.saturating_add(weight);
            s.liveness = ceiling;
        }
        if let Some(d) = self.devices.get_mut(&dst) {
            d.recv = d.recv.saturating_add(weight);
            d.liveness = ceiling;
        }
    }

    /// Record an observed L3 association for a registered device.
    pub fn note_l3(&mut self, id: u64, ipv4: u32) {
        match self.devices.get_mut(&id) {
            Some(state) => state.note_ip(ipv4),
            None => tracing::warn!(
                device = %crate::wire::device_id_to_mac(id),
                "L3 association references unregistered device, skipping"
            ),
        }
    }

    /// Record an ARP-learned route on a registered source device.
    pub fn note_route(&mut self, src: u64, dst_ipv4: u32, peer: u64) {
        match self.devices.get_mut(&src) {
            Some(state) => state.note_route(dst_ipv4, peer),
            None => tracing::warn!(
                device = %crate::wire::device_id_to_mac(src),
                "ARP entry references unregistered device, skipping"
            ),
        }
    }

    /// Advance one frame: decrement every liveness countdown, floored at
    /// zero. Devices are never evicted here — visual fade-out is the
    /// renderer's concern.
    pub fn tick(&mut self) {
        for state in self.devices.values_mut() {
            state.liveness = state.liveness.saturating_sub(1);
        }
    }

    /// Atomically clear the registry. The only deletion path.
    pub fn reset(&mut self) {
        self.devices.clear();
    }

    pub fn get(&self, id: u64) -> Option<&DeviceState> {
        self.devices.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.devices.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Iterate all device states, unordered.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceState> {
        self.devices.values()
    }
}
