//! Transport abstraction — the opaque event source the pipeline drains
//!
//! The wire transport itself (native socket, browser websocket callback)
//! is an external collaborator. The pipeline only sees the non-blocking
//! [`EventTransport`] contract: poll whatever is buffered, never wait.
//!
//! [`ChannelTransport`] is the one bundled adapter: a crossbeam-channel
//! receive side whose [`TransportHandle`] sender half any feeder thread or
//! callback can hold. Both the native poller and the browser callback feed
//! the same contract, so there is exactly one decoder downstream.

use crate::wire::WireValue;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Topic carrying epoch-step events.
pub const TOPIC_EPOCH: &str = "netvis/epoch";

/// Topic carrying periodic producer statistics.
pub const TOPIC_STATS: &str = "netvis/stats";

/// One delivered pub/sub event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub topic: String,
    pub payload: WireValue,
}

impl EventEnvelope {
    pub fn new(topic: impl Into<String>, payload: WireValue) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}

/// A connection-level status notification from the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportStatus {
    pub is_error: bool,
    pub message: String,
}

/// Non-blocking event source the pipeline polls once per frame.
pub trait EventTransport {
    /// Drain every currently buffered event. Returns empty when idle;
    /// never blocks.
    fn poll_pending_events(&mut self) -> Vec<EventEnvelope>;

    /// Drain one pending status notification, if any. Never blocks.
    fn poll_status(&mut self) -> Option<TransportStatus>;
}

/// Channel-backed transport adapter: the receive side owned by the
/// pipeline.
#[derive(Debug)]
pub struct ChannelTransport {
    event_rx: Receiver<EventEnvelope>,
    status_rx: Receiver<TransportStatus>,
}

/// The feeder half of a [`ChannelTransport`]. Cheap to clone; one handle
/// per feeder thread or callback.
#[derive(Debug, Clone)]
pub struct TransportHandle {
    event_tx: Sender<EventEnvelope>,
    status_tx: Sender<TransportStatus>,
}

impl TransportHandle {
    /// Publish an event. Returns false if the pipeline side is gone.
    pub fn publish(&self, topic: impl Into<String>, payload: WireValue) -> bool {
        self.event_tx
            .send(EventEnvelope::new(topic, payload))
            .is_ok()
    }

    /// Report a connection-level status notification.
    pub fn report_status(&self, is_error: bool, message: impl Into<String>) -> bool {
        self.status_tx
            .send(TransportStatus {
                is_error,
                message: message.into(),
            })
            .is_ok()
    }
}

/// Create a connected handle/transport pair.
pub fn channel() -> (TransportHandle, ChannelTransport) {
    let (event_tx, event_rx) = unbounded();
    let (status_tx, status_rx) = unbounded();
    (
        TransportHandle {
            event_tx,
            status_tx,
        },
        ChannelTransport {
            event_rx,
            status_rx,
        },
    )
}

impl EventTransport for ChannelTransport {
    fn poll_pending_events(&mut self) -> Vec<EventEnvelope> {
        let mut events = Vec::new();
        while let Ok(env) = self.event_rx.try_recv() {
            events.push(env);
        }
        events
    }

    fn poll_status(&mut self) -> Option<TransportStatus> {
        self.status_rx.try_recv().ok()
    }
}
