//! Atrium governance event infrastructure.
//!
//! The engine publishes a [`GovernanceEvent`] after every committed
//! state change (application created/approved/rejected, permission
//! revoked, version published). Delivery is fire-and-forget: the external
//! notification collaborator subscribes to the bus, and a failure to
//! notify never rolls back the governing transaction.

pub mod bus;

pub use bus::{event_types, EventBus, GovernanceEvent};
