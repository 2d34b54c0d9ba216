//! Typed chain-event bus.
//!
//! Replaces ambient per-contract listener callbacks with an explicit
//! subscription abstraction: producers publish typed events, consumers
//! hold a cancellable `EventSubscription` (cancel by dropping it).
//!
//! ## Guarantees
//!
//! - **Non-blocking publish**: a slow subscriber never blocks the flow;
//!   it observes a lag warning and skips ahead instead.
//! - **Thread-safe**: `EventBus` is shared behind `Arc` and publishable
//!   from any task.

use std::sync::atomic::{AtomicU64, Ordering};

use futures::Stream;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::warn;

use crate::amount::Amount;
use crate::vote::VoteSupport;
use crate::types::{Address, ProjectId, ProposalId};

/// Default buffered capacity per subscriber.
const DEFAULT_CAPACITY: usize = 256;

// ════════════════════════════════════════════════════════════════════════════
// EVENTS
// ════════════════════════════════════════════════════════════════════════════

/// Events observable by presentation layers and background tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainEvent {
    /// A project entered the funding ledger.
    ProjectCreated {
        project_id: ProjectId,
        creator: Address,
        goal_amount: Amount,
    },
    /// A governance proposal entered the mirror.
    ProposalCreated {
        proposal_id: ProposalId,
        project_id: ProjectId,
    },
    /// A contribution was reconciled; carries the new running total.
    Funded {
        project_id: ProjectId,
        new_total: Amount,
    },
    /// A governance vote was reconciled.
    VoteCast {
        proposal_id: ProposalId,
        voter: Address,
        support: VoteSupport,
    },
}

// ════════════════════════════════════════════════════════════════════════════
// EVENT BUS
// ════════════════════════════════════════════════════════════════════════════

/// Broadcast hub for [`ChainEvent`].
pub struct EventBus {
    tx: broadcast::Sender<ChainEvent>,
    published: AtomicU64,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, published: AtomicU64::new(0) }
    }

    /// Publish an event. Returns the number of subscribers that will
    /// observe it (zero when nobody is listening, which is fine).
    pub fn publish(&self, event: ChainEvent) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        self.tx.send(event).unwrap_or(0)
    }

    /// Open a new subscription. Events published before this call are
    /// not observed.
    #[must_use]
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription { rx: self.tx.subscribe() }
    }

    /// Total events published since construction.
    #[must_use]
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SUBSCRIPTION
// ════════════════════════════════════════════════════════════════════════════

/// Handle to a live event feed. Dropping it cancels the subscription.
pub struct EventSubscription {
    rx: broadcast::Receiver<ChainEvent>,
}

impl EventSubscription {
    /// Receive the next event. Returns `None` once the bus is gone.
    /// A lagged subscriber skips the missed events and keeps going.
    pub async fn recv(&mut self) -> Option<ChainEvent> {
        loop {
            match self.rx.recv().await {
                Ok(ev) => return Some(ev),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "event subscriber lagged, skipping ahead");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking receive for synchronous contexts.
    pub fn try_recv(&mut self) -> Option<ChainEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(ev) => return Some(ev),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    warn!(missed, "event subscriber lagged, skipping ahead");
                }
                Err(_) => return None,
            }
        }
    }

    /// Adapt the subscription into a `futures::Stream`.
    pub fn into_stream(self) -> impl Stream<Item = ChainEvent> {
        futures::stream::unfold(self, |mut sub| async move {
            sub.recv().await.map(|ev| (ev, sub))
        })
    }
}

// Shared across tasks; must stay Send + Sync.
const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<EventBus>();
};

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::WEI_PER_TOKEN;

    fn funded(id: u64, total: u128) -> ChainEvent {
        ChainEvent::Funded {
            project_id: ProjectId(id),
            new_total: Amount(total),
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        assert_eq!(bus.publish(funded(1, WEI_PER_TOKEN)), 1);
        assert_eq!(sub.recv().await, Some(funded(1, WEI_PER_TOKEN)));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(funded(1, 1)), 0);
        assert_eq!(bus.published_count(), 1);
    }

    #[tokio::test]
    async fn test_subscription_sees_only_later_events() {
        let bus = EventBus::new();
        bus.publish(funded(1, 1));
        let mut sub = bus.subscribe();
        bus.publish(funded(2, 2));
        assert_eq!(sub.recv().await, Some(funded(2, 2)));
    }

    #[tokio::test]
    async fn test_recv_ends_when_bus_dropped() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe();
        drop(bus);
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_stream_adapter() {
        use futures::StreamExt;
        let bus = EventBus::new();
        let sub = bus.subscribe();
        bus.publish(funded(7, 3));
        drop(bus);
        let collected: Vec<_> = sub.into_stream().collect().await;
        assert_eq!(collected, vec![funded(7, 3)]);
    }
}
