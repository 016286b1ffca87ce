//! Rolling traffic-rate chart
//!
//! A fixed-capacity drop-oldest window of per-cycle samples with an O(n)
//! average over everything retained. Zeros are valid samples and count
//! toward the denominator; the average of an empty window is 0.

use std::collections::VecDeque;

/// Drop-oldest moving-average window.
#[derive(Debug)]
pub struct RateChart {
    capacity: usize,
    samples: VecDeque<f64>,
}

impl RateChart {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Push a sample, evicting the oldest when the window is full.
    pub fn push(&mut self, value: f64) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    /// Average over all retained samples; 0 when the window is empty.
    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Most recently pushed sample.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Retained samples in arrival order, for plotting.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
