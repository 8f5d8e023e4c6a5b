//! Signaling Relay
//!
//! Per-call fan-out of signaling frames to every connection subscribed to
//! the same call id. Each subscriber has a bounded outbound queue; one that
//! falls behind is disconnected instead of slowing the others down.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use super::messages::{Payload, SignalFrame, SignalKind};
use crate::infrastructure::metrics;

/// Serialized frame shared by all recipients
pub type OutboundFrame = Arc<str>;

struct Subscriber {
    user_id: i64,
    tx: mpsc::Sender<OutboundFrame>,
}

/// A live subscription. The receiver yields `None` once the relay has
/// dropped the subscriber.
pub struct Subscription {
    pub id: Uuid,
    pub call_id: String,
    pub receiver: mpsc::Receiver<OutboundFrame>,
}

/// Registry of call subscribers
pub struct SignalingRelay {
    calls: DashMap<String, HashMap<Uuid, Subscriber>>,
    queue_capacity: usize,
}

impl SignalingRelay {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            calls: DashMap::new(),
            queue_capacity: queue_capacity.max(1),
        }
    }

    /// Register a connection for a call id.
    pub fn subscribe(&self, call_id: &str, user_id: i64) -> Subscription {
        let id = Uuid::new_v4();
        let (tx, receiver) = mpsc::channel(self.queue_capacity);

        self.calls
            .entry(call_id.to_string())
            .or_default()
            .insert(id, Subscriber { user_id, tx });
        metrics::SIGNALING_SUBSCRIBERS.inc();

        tracing::info!(call_id = %call_id, user_id = user_id, subscriber = %id, "Signaling subscriber joined");
        Subscription {
            id,
            call_id: call_id.to_string(),
            receiver,
        }
    }

    /// Remove a subscription. No-op if the relay already dropped it.
    pub fn unsubscribe(&self, call_id: &str, id: Uuid) {
        let removed = self
            .calls
            .get_mut(call_id)
            .and_then(|mut subscribers| subscribers.remove(&id));
        self.calls.remove_if(call_id, |_, subscribers| subscribers.is_empty());

        if let Some(subscriber) = removed {
            metrics::SIGNALING_SUBSCRIBERS.dec();
            tracing::info!(
                call_id = %call_id,
                user_id = subscriber.user_id,
                subscriber = %id,
                "Signaling subscriber left"
            );
        }
    }

    /// Deliver a frame to every subscriber of `call_id`, the sender included.
    ///
    /// Frames relayed for one call are enqueued in the order `relay` is
    /// called. Returns the number of subscribers the frame was queued for.
    pub fn relay(&self, call_id: &str, from_user_id: i64, kind: SignalKind, payload: &Payload) -> usize {
        let frame = SignalFrame {
            kind,
            from: from_user_id.to_string(),
            payload,
        };
        let text: OutboundFrame = match serde_json::to_string(&frame) {
            Ok(text) => text.into(),
            Err(e) => {
                tracing::error!(call_id = %call_id, error = %e, "Failed to serialize signaling frame");
                return 0;
            }
        };

        let mut delivered = 0;
        if let Some(mut subscribers) = self.calls.get_mut(call_id) {
            subscribers.retain(|id, subscriber| match subscriber.tx.try_send(text.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(
                        call_id = %call_id,
                        user_id = subscriber.user_id,
                        subscriber = %id,
                        "Signaling subscriber too slow, disconnecting"
                    );
                    metrics::SIGNALING_DROPPED_TOTAL.inc();
                    metrics::SIGNALING_SUBSCRIBERS.dec();
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    metrics::SIGNALING_SUBSCRIBERS.dec();
                    false
                }
            });
        }
        self.calls.remove_if(call_id, |_, subscribers| subscribers.is_empty());

        metrics::record_signaling_frame(kind.as_str());
        tracing::debug!(call_id = %call_id, kind = kind.as_str(), delivered = delivered, "Signaling frame relayed");
        delivered
    }

    /// Number of live subscribers of a call
    pub fn subscriber_count(&self, call_id: &str) -> usize {
        self.calls.get(call_id).map(|s| s.len()).unwrap_or(0)
    }

    /// Number of calls with at least one subscriber
    pub fn active_calls(&self) -> usize {
        self.calls.len()
    }

    /// Subscribers across all calls
    pub fn total_subscribers(&self) -> usize {
        self.calls.iter().map(|entry| entry.value().len()).sum()
    }
}
