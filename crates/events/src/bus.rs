//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` across the application; any
//! number of subscribers independently receive every published
//! [`GovernanceEvent`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use atrium_core::types::DbId;

/// Dot-separated event names published by the engine.
pub mod event_types {
    pub const APPLY_CREATED: &str = "apply.created";
    pub const APPLY_APPROVED: &str = "apply.approved";
    pub const APPLY_REJECTED: &str = "apply.rejected";
    pub const PERMISSION_GRANTED: &str = "permission.granted";
    pub const PERMISSION_REVOKED: &str = "permission.revoked";
    pub const PROPOSAL_SUBMITTED: &str = "proposal.submitted";
    pub const PROPOSAL_REVIEWED: &str = "proposal.reviewed";
    pub const VERSION_PUBLISHED: &str = "version.published";
}

// ---------------------------------------------------------------------------
// GovernanceEvent
// ---------------------------------------------------------------------------

/// A domain event emitted after a committed governance mutation.
///
/// Built via [`GovernanceEvent::new`] and the `with_*` builder methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceEvent {
    /// One of [`event_types`], e.g. `"apply.approved"`.
    pub event_type: String,

    /// Source entity kind (e.g. `"area_apply"`, `"layout_version"`).
    pub entity_type: Option<String>,

    /// Source entity database id.
    pub entity_id: Option<DbId>,

    /// Id of the user whose action produced the event.
    pub actor_id: Option<DbId>,

    /// Free-form JSON payload with event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl GovernanceEvent {
    /// Create an event with only the required `event_type`.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            entity_type: None,
            entity_id: None,
            actor_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the source entity.
    pub fn with_entity(mut self, entity_type: impl Into<String>, entity_id: DbId) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id);
        self
    }

    /// Attach the acting user.
    pub fn with_actor(mut self, actor_id: DbId) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Set the JSON payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// When the buffer fills, the oldest un-consumed events are dropped and
/// slow receivers observe `RecvError::Lagged` -- acceptable for
/// fire-and-forget notification delivery.
pub struct EventBus {
    sender: broadcast::Sender<GovernanceEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero subscribers the event is dropped; the audit trail, not
    /// the bus, is the durable record.
    pub fn publish(&self, event: GovernanceEvent) {
        // SendError only means there are no receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<GovernanceEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
