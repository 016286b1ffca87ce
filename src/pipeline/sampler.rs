//! Adaptive inverse-sampling controller
//!
//! Under burst load, decoding every incoming event stalls the render loop.
//! The controller trades completeness for frame-rate stability: it decodes
//! 1 of every N events, where N is a power of two that ramps up with load
//! and back down when the stream quiets.

/// Events-per-cycle multiple that triggers a ramp-up.
pub const RAMP_UP_MULTIPLE: u64 = 16;

/// Events-per-cycle threshold below which the rate ramps down.
pub const RAMP_DOWN_BELOW: u64 = 8;

/// State machine over `inv_sample_rate ∈ {1, 2, 4, 8, 16}`.
///
/// The ramp-down comparison uses the current cycle's event count, which is
/// itself gated by the previous cycle's rate; this can oscillate at rate
/// boundaries. The behavior is deliberate and kept as-is.
#[derive(Debug)]
pub struct SampleRateController {
    inv_sample_rate: u32,
    max_rate: u32,
    /// 1-based cumulative event position within the current cycle
    cycle_events: u64,
}

impl SampleRateController {
    /// Create a controller at rate 1.
    ///
    /// `max_rate` is rounded up to the nearest power of two (minimum 1) so
    /// the doubling ramp always lands exactly on the bound, even when a
    /// hand-built config bypassed
    /// [`PipelineConfig::validate`](crate::config::PipelineConfig::validate).
    pub fn new(max_rate: u32) -> Self {
        Self {
            inv_sample_rate: 1,
            max_rate: max_rate
                .max(1)
                .checked_next_power_of_two()
                .unwrap_or(1 << 31),
            cycle_events: 0,
        }
    }

    /// Current inverse sampling rate ("decode 1 of N").
    pub fn inv_sample_rate(&self) -> u32 {
        self.inv_sample_rate
    }

    /// Gate one incoming event. Returns whether it should be decoded.
    ///
    /// Event `i` (1-based within the cycle) is decoded iff
    /// `i % inv_sample_rate == 0`; at rate 1 every event passes.
    pub fn admit(&mut self) -> bool {
        self.cycle_events += 1;
        self.cycle_events % u64::from(self.inv_sample_rate) == 0
    }

    /// Close out the cycle: evaluate the rate transition against the number
    /// of events seen (decoded and dropped alike), then reset the in-cycle
    /// counter. Returns the cycle's event count.
    pub fn end_cycle(&mut self) -> u64 {
        let event_cnt = self.cycle_events;
        if event_cnt > 0 && event_cnt % RAMP_UP_MULTIPLE == 0 && self.inv_sample_rate < self.max_rate
        {
            self.inv_sample_rate *= 2;
            tracing::debug!(
                inv_sample_rate = self.inv_sample_rate,
                event_cnt,
                "sample rate ramped up"
            );
        } else if event_cnt < RAMP_DOWN_BELOW && self.inv_sample_rate > 1 {
            self.inv_sample_rate /= 2;
            tracing::debug!(
                inv_sample_rate = self.inv_sample_rate,
                event_cnt,
                "sample rate ramped down"
            );
        }
        self.cycle_events = 0;
        event_cnt
    }

    /// Return to rate 1 and clear the in-cycle counter.
    pub fn reset(&mut self) {
        self.inv_sample_rate = 1;
        self.cycle_events = 0;
    }
}
