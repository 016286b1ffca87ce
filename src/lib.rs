//! # netvis-rs: network-telemetry decode & aggregation core
//!
//! The headless core of a real-time network traffic visualizer. It
//! subscribes to a pub/sub event bus (through an abstract transport),
//! decodes structured telemetry events ("epoch steps") into typed domain
//! records, and maintains the device registry, broadcast pools, and rate
//! charts a renderer reads every frame. Rendering itself is a collaborator
//! behind the [`pipeline::VisualSink`] seam and is not part of this crate.
//!
//! ## Architecture
//!
//! - **Wire model**: loosely-typed payloads as the [`wire::WireValue`]
//!   tagged union with fallible typed extraction — shape mismatches are
//!   diagnostics, never panics
//! - **Decoder**: [`decode::EpochDecoder`] turns one event into an
//!   [`decode::EpochStep`] of typed facts, skipping mis-shaped sub-records
//! - **Registry**: [`registry::DeviceRegistry`] owns per-device counters,
//!   liveness countdowns, and L3/ARP associations
//! - **Back-pressure**: [`pipeline::sampler::SampleRateController`] sheds
//!   load by decoding 1 of N events under burst traffic
//! - **Orchestration**: [`pipeline::EpochPipeline::run_cycle`] runs the
//!   whole decode cycle once per frame on the caller's thread
//!
//! ## Example
//!
//! ```
//! use netvis_rs::{
//!     config::PipelineConfig,
//!     pipeline::{EpochPipeline, NullSink},
//!     transport::{channel, TOPIC_EPOCH},
//!     wire::WireValue,
//! };
//!
//! let (handle, transport) = channel();
//! let mut pipeline = EpochPipeline::new(transport, NullSink, &PipelineConfig::default());
//!
//! // A feeder thread or socket callback publishes events...
//! handle.publish(
//!     TOPIC_EPOCH,
//!     WireValue::Seq(vec![
//!         WireValue::set([WireValue::text("ba:dd:be:ee:ef:01")]),
//!         WireValue::Table(vec![]),
//!         WireValue::Table(vec![]),
//!         WireValue::Table(vec![]),
//!     ]),
//! );
//!
//! // ...and the host calls run_cycle once per frame.
//! let stats = pipeline.run_cycle();
//! assert_eq!(stats.event_cnt, 1);
//! assert_eq!(pipeline.registry().len(), 1);
//! ```

pub mod config;
pub mod decode;
pub mod error;
pub mod pipeline;
pub mod pool;
pub mod registry;
pub mod transport;
pub mod types;
pub mod wire;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use decode::{EpochDecoder, EpochStep, L2CommRecord};
pub use error::{NetVisError, Result};
pub use pipeline::{EpochPipeline, NullSink, VisualSink};
pub use registry::{DeviceRegistry, DeviceState};
pub use transport::{channel, ChannelTransport, EventTransport, TransportHandle};
pub use types::{BroadcastClass, CommSummary, CycleStats, ProtoClass};
pub use wire::{mac_to_device_id, WireValue};
