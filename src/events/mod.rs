//! Domain events emitted after successful writes.
//!
//! Services publish onto a process-wide broadcast bus; a dispatcher task forwards
//! each event to a [`Notifier`], the seam where email or webhook delivery plugs in.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainEvent {
    #[serde(rename_all = "camelCase")]
    TenantInvited {
        invitation_id: Uuid,
        owner_id: Uuid,
        tenant_id: Uuid,
        email: String,
        invitation_url: String,
        expires_at: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    InvitationAccepted {
        invitation_id: Uuid,
        owner_id: Uuid,
        tenant_id: Option<Uuid>,
        user_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    PaymentRecorded {
        payment_id: Uuid,
        tenant_id: Uuid,
        lease_id: Uuid,
        amount: Decimal,
    },
    #[serde(rename_all = "camelCase")]
    LeaseCreated {
        lease_id: Uuid,
        unit_id: Uuid,
        tenant_id: Uuid,
    },
    #[serde(rename_all = "camelCase")]
    LeaseTerminated {
        lease_id: Uuid,
        unit_id: Uuid,
        end_date: NaiveDate,
    },
    #[serde(rename_all = "camelCase")]
    TenantMovedOut {
        tenant_id: Uuid,
        move_out_date: NaiveDate,
    },
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::TenantInvited { .. } => "TENANT_INVITED",
            DomainEvent::InvitationAccepted { .. } => "INVITATION_ACCEPTED",
            DomainEvent::PaymentRecorded { .. } => "PAYMENT_RECORDED",
            DomainEvent::LeaseCreated { .. } => "LEASE_CREATED",
            DomainEvent::LeaseTerminated { .. } => "LEASE_TERMINATED",
            DomainEvent::TenantMovedOut { .. } => "TENANT_MOVED_OUT",
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Never fails: an event with no subscribers is simply dropped
    pub fn publish(&self, event: DomainEvent) {
        let event_type = event.event_type();
        match self.tx.send(event) {
            Ok(receivers) => debug!(event_type, receivers, "Published event"),
            Err(_) => debug!(event_type, "No receivers for event"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

static BUS: Lazy<EventBus> = Lazy::new(|| EventBus::new(1024));

pub fn bus() -> &'static EventBus {
    &BUS
}

pub fn publish(event: DomainEvent) {
    bus().publish(event);
}

/// Outbound delivery of domain events
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &DomainEvent) -> anyhow::Result<()>;
}

/// Writes events to the log; invitation links are printed so they can be shared by hand
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &DomainEvent) -> anyhow::Result<()> {
        match event {
            DomainEvent::TenantInvited { email, invitation_url, expires_at, .. } => {
                info!(%email, %expires_at, "Invitation ready: {}", invitation_url);
            }
            other => {
                info!(event_type = other.event_type(), "{}", serde_json::to_string(other)?);
            }
        }
        Ok(())
    }
}

/// Forward events from `rx` to `notifier` until the bus closes
pub fn spawn_dispatcher(
    mut rx: broadcast::Receiver<DomainEvent>,
    notifier: Arc<dyn Notifier>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Err(e) = notifier.notify(&event).await {
                        warn!(event_type = event.event_type(), "Notifier failed: {}", e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event dispatcher lagged; events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, event: &DomainEvent) -> anyhow::Result<()> {
            self.seen.lock().await.push(event.event_type());
            Ok(())
        }
    }

    fn lease_created() -> DomainEvent {
        DomainEvent::LeaseCreated {
            lease_id: Uuid::new_v4(),
            unit_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::new(4);
        bus.publish(lease_created());
    }

    #[tokio::test]
    async fn subscribers_receive_events() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        bus.publish(lease_created());
        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "LEASE_CREATED");
    }

    #[tokio::test]
    async fn dispatcher_forwards_to_notifier() {
        let bus = EventBus::new(4);
        let notifier = Arc::new(RecordingNotifier::default());
        let handle = spawn_dispatcher(bus.subscribe(), notifier.clone());

        bus.publish(lease_created());
        bus.publish(DomainEvent::TenantMovedOut {
            tenant_id: Uuid::new_v4(),
            move_out_date: NaiveDate::from_ymd_opt(2026, 5, 31).unwrap(),
        });
        drop(bus);
        handle.await.unwrap();

        let seen = notifier.seen.lock().await;
        assert_eq!(*seen, vec!["LEASE_CREATED", "TENANT_MOVED_OUT"]);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let v = serde_json::to_value(lease_created()).unwrap();
        assert_eq!(v["type"], "LEASE_CREATED");
        assert!(v.get("leaseId").is_some());
    }
}
