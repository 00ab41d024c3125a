use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use orderdesk_core::EnterpriseId;

use crate::event::Event;

/// Envelope for a committed event, carrying routing metadata.
///
/// Notes:
/// - `enterprise_id` scopes the event to the catalog owner it concerns, so
///   consumers can partition by enterprise.
/// - `aggregate_id` is the order or product the event is about.
/// - `payload` is the serialized domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    enterprise_id: EnterpriseId,

    aggregate_id: Uuid,
    aggregate_type: String,

    event_type: String,
    event_version: u32,
    occurred_at: DateTime<Utc>,

    payload: E,
}

impl<E> EventEnvelope<E> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        event_id: Uuid,
        enterprise_id: EnterpriseId,
        aggregate_id: Uuid,
        aggregate_type: impl Into<String>,
        event_type: impl Into<String>,
        event_version: u32,
        occurred_at: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            enterprise_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            event_type: event_type.into(),
            event_version,
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn enterprise_id(&self) -> EnterpriseId {
        self.enterprise_id
    }

    pub fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> u32 {
        self.event_version
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl EventEnvelope<JsonValue> {
    /// Wrap a typed event, serializing it to JSON and capturing its metadata.
    pub fn from_typed<T>(
        enterprise_id: EnterpriseId,
        aggregate_id: Uuid,
        aggregate_type: impl Into<String>,
        event: &T,
    ) -> Result<Self, serde_json::Error>
    where
        T: Event + Serialize,
    {
        let payload = serde_json::to_value(event)?;
        Ok(Self::new(
            Uuid::now_v7(),
            enterprise_id,
            aggregate_id,
            aggregate_type,
            event.event_type(),
            event.version(),
            event.occurred_at(),
            payload,
        ))
    }
}
