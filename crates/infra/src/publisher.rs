//! Bus-backed integration-event publisher.

use ordering_application::{IntegrationEventPublisher, PublishError};
use ordering_events::{EventBus, IntegrationEvent};

/// Bridges the application's publisher port onto an `EventBus`.
///
/// The bus only ever sees envelopes for committed mutations; delivery is
/// fire-and-forget with at-least-once semantics.
#[derive(Debug)]
pub struct BusPublisher<B> {
    bus: B,
}

impl<B> BusPublisher<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }
}

impl<B> IntegrationEventPublisher for BusPublisher<B>
where
    B: EventBus<IntegrationEvent>,
{
    fn publish(&self, event: IntegrationEvent) -> Result<(), PublishError> {
        tracing::debug!(
            event_type = %event.event_type,
            aggregate_id = %event.aggregate_id,
            "publishing integration event"
        );
        self.bus
            .publish(event)
            .map_err(|e| PublishError(format!("{e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ordering_events::InMemoryEventBus;
    use serde_json::json;
    use uuid::Uuid;

    fn envelope() -> IntegrationEvent {
        IntegrationEvent {
            event_id: Uuid::now_v7(),
            aggregate_id: Uuid::now_v7(),
            aggregate_type: "ordering.order".to_string(),
            event_type: "ordering.order.started".to_string(),
            schema_version: 1,
            occurred_at: Utc::now(),
            payload: json!({ "ok": true }),
        }
    }

    #[test]
    fn published_envelopes_reach_subscribers() {
        let bus = InMemoryEventBus::new();
        let subscription = bus.subscribe();
        let publisher = BusPublisher::new(bus);

        let event = envelope();
        publisher.publish(event.clone()).unwrap();

        let received = subscription.try_recv().unwrap();
        assert_eq!(received, event);
    }
}
