use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::event::DomainEvent;

/// Envelope published to other bounded contexts after a commit.
///
/// This is the unit the integration-event publisher hands to the bus. The
/// payload is the serialized domain event; the surrounding metadata lets
/// consumers route and deserialize without knowing the concrete type.
/// Delivery is at-least-once, and only ever after the owning aggregate's
/// mutation has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationEvent {
    pub event_id: Uuid,
    pub aggregate_id: Uuid,
    pub aggregate_type: String,
    pub event_type: String,
    pub schema_version: u32,
    pub occurred_at: DateTime<Utc>,
    pub payload: JsonValue,
}

impl IntegrationEvent {
    /// Wrap a typed domain event for publication.
    pub fn from_domain<E>(
        aggregate_id: Uuid,
        aggregate_type: impl Into<String>,
        event: &E,
    ) -> Result<Self, serde_json::Error>
    where
        E: DomainEvent + Serialize,
    {
        Ok(Self {
            event_id: Uuid::now_v7(),
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            event_type: event.event_type().to_string(),
            schema_version: event.schema_version(),
            occurred_at: event.occurred_at(),
            payload: serde_json::to_value(event)?,
        })
    }
}
