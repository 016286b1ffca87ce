//! Broadcast-class contact pools
//!
//! Each broadcast class keeps a short FIFO history of recent hits so the
//! renderer can visualize pool activity. The history is ephemeral and
//! capped; old hits are evicted as new ones arrive.

use crate::types::BroadcastClass;
use std::collections::VecDeque;

/// One recorded broadcast hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolHit {
    /// Device id that sourced the broadcast traffic
    pub src: u64,
    /// Packet weight of the hit
    pub weight: u64,
}

/// Capped FIFO hit history for one broadcast class.
#[derive(Debug)]
pub struct PrefixPool {
    capacity: usize,
    hits: VecDeque<PoolHit>,
}

impl PrefixPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            hits: VecDeque::with_capacity(capacity),
        }
    }

    /// Record a hit, evicting the oldest entry when full.
    pub fn push(&mut self, hit: PoolHit) {
        if self.hits.len() >= self.capacity {
            self.hits.pop_front();
        }
        self.hits.push_back(hit);
    }

    /// Hits in arrival order, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &PoolHit> {
        self.hits.iter()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn clear(&mut self) {
        self.hits.clear();
    }
}

/// The four per-class pools, indexed by [`BroadcastClass`].
#[derive(Debug)]
pub struct PrefixPoolSet {
    pools: [PrefixPool; 4],
}

impl PrefixPoolSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            pools: [
                PrefixPool::new(capacity),
                PrefixPool::new(capacity),
                PrefixPool::new(capacity),
                PrefixPool::new(capacity),
            ],
        }
    }

    /// Record a hit against one broadcast class.
    pub fn record(&mut self, class: BroadcastClass, src: u64, weight: u64) {
        self.pools[class.index()].push(PoolHit { src, weight });
    }

    /// The pool for one broadcast class.
    pub fn pool(&self, class: BroadcastClass) -> &PrefixPool {
        &self.pools[class.index()]
    }

    /// Clear all pool histories.
    pub fn clear(&mut self) {
        for pool in &mut self.pools {
            pool.clear();
        }
    }
}
