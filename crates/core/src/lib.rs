//! Atrium governance domain core.
//!
//! Pure domain logic for the area permission and layout governance engine:
//! the error taxonomy, status state machines, role/ownership guard,
//! geometric boundary validation, and layout snapshot merging. This crate
//! has no I/O and no async -- everything here is deterministic and unit
//! testable, so both the repository layer and the API layer can depend on
//! it without dragging in a runtime.

pub mod audit;
pub mod error;
pub mod geometry;
pub mod guard;
pub mod hashing;
pub mod layout;
pub mod roles;
pub mod status;
pub mod types;
