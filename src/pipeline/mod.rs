//! Epoch pipeline — the per-frame decode cycle
//!
//! One [`EpochPipeline::run_cycle`] call per render frame:
//! 1. Drain transport status notifications into the diagnostics log.
//! 2. Drain buffered events, gating each through the sample-rate controller.
//! 3. Dispatch accepted events by topic: epoch steps through the decoder
//!    into the registry, pools, and visual sink; stats events into the
//!    drop/lag counters directly.
//! 4. Evaluate the sampler transition, push the cycle's decoded weight into
//!    the rate charts, advance device liveness, and report [`CycleStats`].
//!
//! The pipeline runs entirely on the caller's thread. It owns its transport
//! and sink explicitly — there is no global subscriber state — and
//! [`EpochPipeline::reset`] is the single full-teardown path the host
//! invokes on disconnect.

pub mod chart;
pub mod sampler;

use crate::config::PipelineConfig;
use crate::decode::{EpochDecoder, EpochStep};
use crate::pool::PrefixPoolSet;
use crate::registry::DeviceRegistry;
use crate::transport::{EventTransport, TOPIC_EPOCH, TOPIC_STATS};
use crate::types::{BroadcastClass, CycleStats, ProtoClass};
use crate::wire::WireValue;
use chart::RateChart;
use sampler::SampleRateController;
use std::time::Duration;

/// Renderer seam: callbacks fired synchronously during decode.
///
/// Implementations may create visible objects here; the pipeline does not
/// depend on the outcome. [`NullSink`] is the no-op implementation for
/// headless use.
#[cfg_attr(test, mockall::automock)]
pub trait VisualSink {
    /// A device appeared in an entered set.
    fn on_device_seen(&mut self, device: u64);
    /// Direct traffic between two registered devices, one protocol class.
    fn on_traffic(&mut self, src: u64, dst: u64, proto: ProtoClass, weight: u64);
    /// Broadcast-class traffic sourced by a registered device.
    fn on_broadcast_hit(&mut self, class: BroadcastClass, src: u64, weight: u64);
    /// A new L3 association was observed.
    fn on_l3_association(&mut self, device: u64, ipv4: u32);
    /// An ARP table entry was observed.
    fn on_arp_entry(&mut self, src: u64, dst: u64, ipv4: u32);
}

/// No-op sink for headless operation and benchmarks.
#[derive(Debug, Default)]
pub struct NullSink;

impl VisualSink for NullSink {
    fn on_device_seen(&mut self, _device: u64) {}
    fn on_traffic(&mut self, _src: u64, _dst: u64, _proto: ProtoClass, _weight: u64) {}
    fn on_broadcast_hit(&mut self, _class: BroadcastClass, _src: u64, _weight: u64) {}
    fn on_l3_association(&mut self, _device: u64, _ipv4: u32) {}
    fn on_arp_entry(&mut self, _src: u64, _dst: u64, _ipv4: u32) {}
}

/// The per-frame decode/aggregate orchestrator.
pub struct EpochPipeline<T, S> {
    transport: T,
    sink: S,
    decoder: EpochDecoder,
    registry: DeviceRegistry,
    pools: PrefixPoolSet,
    sampler: SampleRateController,
    short_chart: RateChart,
    long_chart: RateChart,
    tot_pkt_drop: u64,
    tot_epoch_drop: u64,
    current_lag: Duration,
    last_stats: CycleStats,
}

impl<T: EventTransport, S: VisualSink> EpochPipeline<T, S> {
    /// Build a pipeline owning its transport and sink.
    pub fn new(transport: T, sink: S, config: &PipelineConfig) -> Self {
        Self {
            transport,
            sink,
            decoder: EpochDecoder::new(),
            registry: DeviceRegistry::new(config.liveness_ceiling),
            pools: PrefixPoolSet::new(config.pool_capacity),
            sampler: SampleRateController::new(config.max_inv_sample_rate),
            short_chart: RateChart::new(config.short_window),
            long_chart: RateChart::new(config.long_window),
            tot_pkt_drop: 0,
            tot_epoch_drop: 0,
            current_lag: Duration::ZERO,
            last_stats: CycleStats::default(),
        }
    }

    /// Run one decode cycle. Called once per render/tick frame.
    pub fn run_cycle(&mut self) -> CycleStats {
        while let Some(status) = self.transport.poll_status() {
            if status.is_error {
                tracing::warn!(status = %status.message, "transport error");
            } else {
                tracing::info!(status = %status.message, "transport status");
            }
        }

        let mut cycle_weight: u64 = 0;
        for envelope in self.transport.poll_pending_events() {
            if !self.sampler.admit() {
                self.tot_epoch_drop += 1;
                continue;
            }
            match envelope.topic.as_str() {
                TOPIC_EPOCH => {
                    let step = self.decoder.decode(&envelope.payload, &self.registry);
                    cycle_weight += step.packet_total;
                    self.apply_step(step);
                }
                TOPIC_STATS => self.apply_stats(&envelope.payload),
                other => {
                    tracing::warn!(topic = other, "event on unknown topic dropped");
                }
            }
        }

        let event_cnt = self.sampler.end_cycle();
        self.short_chart.push(cycle_weight as f64);
        self.long_chart.push(cycle_weight as f64);
        self.registry.tick();

        self.last_stats = CycleStats {
            event_cnt,
            inv_sample_rate: self.sampler.inv_sample_rate(),
            tot_pkt_drop: self.tot_pkt_drop,
            tot_epoch_drop: self.tot_epoch_drop,
            current_lag: self.current_lag,
        };
        tracing::debug!(
            event_cnt,
            inv_sample_rate = self.last_stats.inv_sample_rate,
            cycle_weight,
            "decode cycle complete"
        );
        self.last_stats
    }

    /// Apply one decoded step to the registry, pools, and sink.
    fn apply_step(&mut self, step: EpochStep) {
        for id in &step.entered_l2 {
            self.registry.ensure(*id);
            self.sink.on_device_seen(*id);
        }
        for (src, dsts) in &step.device_comm {
            for (dst, record) in dsts {
                self.registry.record_traffic(*src, *dst, record.proto.total());
                for proto in ProtoClass::all() {
                    let weight = record.proto.get(proto);
                    if weight > 0 {
                        self.sink.on_traffic(*src, *dst, proto, weight);
                    }
                }
                for class in BroadcastClass::all() {
                    let weight = record.broadcast_for(class).total();
                    if weight > 0 {
                        self.pools.record(class, *src, weight);
                        self.sink.on_broadcast_hit(class, *src, weight);
                    }
                }
            }
        }
        for (id, ipv4) in &step.entered_l3 {
            self.registry.note_l3(*id, *ipv4);
            self.sink.on_l3_association(*id, *ipv4);
        }
        for (src, entries) in &step.arp_table {
            for (dst, ipv4) in entries {
                self.registry.note_route(*src, *ipv4, *dst);
                self.sink.on_arp_entry(*src, *dst, *ipv4);
            }
        }
    }

    /// Apply one producer-stats payload: `[observed, dropped, lag]`.
    fn apply_stats(&mut self, payload: &WireValue) {
        match payload
            .seq_get(1, "stats")
            .and_then(|v| v.as_count("stats.dropped"))
        {
            Ok(dropped) => self.tot_pkt_drop += dropped,
            Err(e) => tracing::warn!(error = %e, "skipping stats drop count"),
        }
        match payload
            .seq_get(2, "stats")
            .and_then(|v| v.as_interval("stats.lag"))
        {
            Ok(lag) => self.current_lag = lag,
            Err(e) => tracing::warn!(error = %e, "skipping stats lag"),
        }
    }

    /// Full teardown: clear the registry, pools, charts, counters, and
    /// sampler. Invoked by the host on user-initiated disconnect.
    pub fn reset(&mut self) {
        self.registry.reset();
        self.pools.clear();
        self.short_chart.clear();
        self.long_chart.clear();
        self.sampler.reset();
        self.tot_pkt_drop = 0;
        self.tot_epoch_drop = 0;
        self.current_lag = Duration::ZERO;
        self.last_stats = CycleStats::default();
        tracing::info!("pipeline reset");
    }

    /// Telemetry snapshot from the most recent cycle.
    pub fn telemetry(&self) -> CycleStats {
        self.last_stats
    }

    /// Device registry, for the renderer to read each frame.
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Broadcast pools, for the renderer to read each frame.
    pub fn pools(&self) -> &PrefixPoolSet {
        &self.pools
    }

    /// Short-window traffic-rate chart.
    pub fn short_chart(&self) -> &RateChart {
        &self.short_chart
    }

    /// Long-window traffic-rate chart.
    pub fn long_chart(&self) -> &RateChart {
        &self.long_chart
    }

    /// The visual sink, for hosts that need to read it back.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{channel, TransportHandle};
    use crate::wire::{mac_to_device_id, Addr};
    use mockall::predicate::eq;

    const MAC_A: &str = "aa:00:00:00:00:01";
    const MAC_B: &str = "aa:00:00:00:00:02";

    fn counts_seq(ipv4: u64, ipv6: u64, arp: u64, unknown: u64) -> WireValue {
        WireValue::Seq(vec![
            WireValue::Count(ipv4),
            WireValue::Count(ipv6),
            WireValue::Count(arp),
            WireValue::Count(unknown),
        ])
    }

    fn summary(proto: WireValue, ff: WireValue) -> WireValue {
        WireValue::Seq(vec![
            WireValue::Absent,
            proto,
            ff,
            counts_seq(0, 0, 0, 0),
            counts_seq(0, 0, 0, 0),
            counts_seq(0, 0, 0, 0),
        ])
    }

    fn epoch(entered: &[&str], comm: Vec<(WireValue, WireValue)>) -> WireValue {
        WireValue::Seq(vec![
            WireValue::set(entered.iter().map(|m| WireValue::text(*m))),
            WireValue::Table(comm),
            WireValue::Table(vec![]),
            WireValue::Table(vec![]),
        ])
    }

    fn publish_epoch(handle: &TransportHandle, payload: WireValue) {
        assert!(handle.publish(TOPIC_EPOCH, payload));
    }

    #[test]
    fn test_sink_callbacks_for_decoded_event() {
        let (handle, transport) = channel();
        let mut sink = MockVisualSink::new();
        let a = mac_to_device_id(MAC_A);
        let b = mac_to_device_id(MAC_B);
        sink.expect_on_device_seen().with(eq(a)).times(1).return_const(());
        sink.expect_on_device_seen().with(eq(b)).times(1).return_const(());
        sink.expect_on_traffic()
            .with(eq(a), eq(b), eq(ProtoClass::Ipv4), eq(10u64))
            .times(1)
            .return_const(());
        sink.expect_on_broadcast_hit()
            .with(eq(BroadcastClass::Ff), eq(a), eq(2u64))
            .times(1)
            .return_const(());

        let mut pipeline = EpochPipeline::new(transport, sink, &PipelineConfig::default());
        publish_epoch(
            &handle,
            epoch(
                &[MAC_A, MAC_B],
                vec![(
                    WireValue::text(MAC_A),
                    WireValue::table([(
                        WireValue::text(MAC_B),
                        summary(counts_seq(10, 0, 0, 0), counts_seq(2, 0, 0, 0)),
                    )]),
                )],
            ),
        );

        let stats = pipeline.run_cycle();
        assert_eq!(stats.event_cnt, 1);
        assert_eq!(pipeline.registry().get(a).unwrap().sent, 10);
        assert_eq!(pipeline.registry().get(b).unwrap().recv, 10);
        assert_eq!(pipeline.pools().pool(BroadcastClass::Ff).len(), 1);
    }

    #[test]
    fn test_gated_events_do_not_reach_sink() {
        let (handle, transport) = channel();

        // First cycle: 16 events ramp the sampler to rate 2.
        let mut sink = MockVisualSink::new();
        sink.expect_on_device_seen().return_const(());
        let mut pipeline = EpochPipeline::new(transport, sink, &PipelineConfig::default());
        for _ in 0..16 {
            publish_epoch(&handle, epoch(&[MAC_A], vec![]));
        }
        let stats = pipeline.run_cycle();
        assert_eq!(stats.inv_sample_rate, 2);
        assert_eq!(stats.tot_epoch_drop, 0);

        // Second cycle: 2 events at rate 2 — the first is dropped unread.
        for _ in 0..2 {
            publish_epoch(&handle, epoch(&[MAC_B], vec![]));
        }
        let stats = pipeline.run_cycle();
        assert_eq!(stats.event_cnt, 2);
        assert_eq!(stats.tot_epoch_drop, 1);
    }

    #[test]
    fn test_stats_topic_updates_counters() {
        let (handle, transport) = channel();
        let mut pipeline = EpochPipeline::new(transport, NullSink, &PipelineConfig::default());

        let payload = WireValue::Seq(vec![
            WireValue::Count(1000),
            WireValue::Count(25),
            WireValue::Interval(Duration::from_millis(120)),
        ]);
        assert!(handle.publish(TOPIC_STATS, payload));

        let stats = pipeline.run_cycle();
        assert_eq!(stats.tot_pkt_drop, 25);
        assert_eq!(stats.current_lag, Duration::from_millis(120));

        // Drop counts accumulate across stats events
        let payload = WireValue::Seq(vec![
            WireValue::Count(1000),
            WireValue::Count(5),
            WireValue::Interval(Duration::from_millis(80)),
        ]);
        assert!(handle.publish(TOPIC_STATS, payload));
        let stats = pipeline.run_cycle();
        assert_eq!(stats.tot_pkt_drop, 30);
        assert_eq!(stats.current_lag, Duration::from_millis(80));
    }

    #[test]
    fn test_mis_shaped_stats_skipped() {
        let (handle, transport) = channel();
        let mut pipeline = EpochPipeline::new(transport, NullSink, &PipelineConfig::default());

        assert!(handle.publish(TOPIC_STATS, WireValue::text("not a stats seq")));
        let stats = pipeline.run_cycle();
        assert_eq!(stats.tot_pkt_drop, 0);
        assert_eq!(stats.current_lag, Duration::ZERO);
    }

    #[test]
    fn test_unknown_topic_dropped() {
        let (handle, transport) = channel();
        let mut pipeline = EpochPipeline::new(transport, NullSink, &PipelineConfig::default());
        assert!(handle.publish("netvis/mystery", WireValue::Count(1)));
        let stats = pipeline.run_cycle();
        // Counted by the gate, decoded by nobody
        assert_eq!(stats.event_cnt, 1);
        assert!(pipeline.registry().is_empty());
    }

    #[test]
    fn test_charts_receive_cycle_weight() {
        let (handle, transport) = channel();
        let mut pipeline = EpochPipeline::new(transport, NullSink, &PipelineConfig::default());

        publish_epoch(
            &handle,
            epoch(
                &[MAC_A, MAC_B],
                vec![(
                    WireValue::text(MAC_A),
                    WireValue::table([(
                        WireValue::text(MAC_B),
                        summary(counts_seq(5, 0, 0, 0), counts_seq(0, 0, 0, 0)),
                    )]),
                )],
            ),
        );
        pipeline.run_cycle();
        assert_eq!(pipeline.short_chart().latest(), Some(5.0));
        assert_eq!(pipeline.long_chart().latest(), Some(5.0));

        // Idle cycle pushes a zero sample
        pipeline.run_cycle();
        assert_eq!(pipeline.short_chart().latest(), Some(0.0));
        assert_eq!(pipeline.short_chart().len(), 2);
    }

    #[test]
    fn test_liveness_ticks_each_cycle() {
        let (handle, transport) = channel();
        let config = PipelineConfig::default();
        let mut pipeline = EpochPipeline::new(transport, NullSink, &config);
        publish_epoch(&handle, epoch(&[MAC_A], vec![]));
        pipeline.run_cycle();

        let id = mac_to_device_id(MAC_A);
        // ensure happened this cycle, then tick decremented once
        assert_eq!(
            pipeline.registry().get(id).unwrap().liveness,
            config.liveness_ceiling - 1
        );
        pipeline.run_cycle();
        assert_eq!(
            pipeline.registry().get(id).unwrap().liveness,
            config.liveness_ceiling - 2
        );
    }

    #[test]
    fn test_l3_and_arp_reach_registry() {
        let (handle, transport) = channel();
        let mut pipeline = EpochPipeline::new(transport, NullSink, &PipelineConfig::default());
        let a = mac_to_device_id(MAC_A);
        let b = mac_to_device_id(MAC_B);

        let payload = WireValue::Seq(vec![
            WireValue::set([WireValue::text(MAC_A), WireValue::text(MAC_B)]),
            WireValue::Table(vec![]),
            WireValue::table([(
                WireValue::text(MAC_A),
                WireValue::Address(Addr::V4([10, 0, 0, 1])),
            )]),
            WireValue::table([(
                WireValue::text(MAC_A),
                WireValue::table([(
                    WireValue::text(MAC_B),
                    WireValue::Address(Addr::V4([10, 0, 0, 2])),
                )]),
            )]),
        ]);
        publish_epoch(&handle, payload);
        pipeline.run_cycle();

        assert_eq!(pipeline.registry().get(a).unwrap().ips(), &[0x0a00_0001]);
        assert_eq!(pipeline.registry().get(a).unwrap().route(0x0a00_0002), Some(b));
    }

    #[test]
    fn test_reset_clears_all_state() {
        let (handle, transport) = channel();
        let mut pipeline = EpochPipeline::new(transport, NullSink, &PipelineConfig::default());
        publish_epoch(&handle, epoch(&[MAC_A], vec![]));
        pipeline.run_cycle();
        assert!(!pipeline.registry().is_empty());

        pipeline.reset();
        assert!(pipeline.registry().is_empty());
        assert!(pipeline.short_chart().is_empty());
        assert!(pipeline.long_chart().is_empty());
        assert_eq!(pipeline.telemetry(), CycleStats::default());
        assert_eq!(pipeline.pools().pool(BroadcastClass::Ff).len(), 0);
    }

    #[test]
    fn test_status_notifications_do_not_interrupt() {
        let (handle, transport) = channel();
        let mut pipeline = EpochPipeline::new(transport, NullSink, &PipelineConfig::default());
        handle.report_status(true, "broker unreachable");
        handle.report_status(false, "reconnected");
        publish_epoch(&handle, epoch(&[MAC_A], vec![]));

        let stats = pipeline.run_cycle();
        assert_eq!(stats.event_cnt, 1);
        assert_eq!(pipeline.registry().len(), 1);
    }
}
