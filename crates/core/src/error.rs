use crate::geometry::BoundaryViolation;
use crate::types::DbId;

/// Domain error taxonomy for the governance engine.
///
/// Every expected failure of a governance operation is one of these
/// variants; callers branch on the variant, never on message text. The
/// API layer maps each variant onto an HTTP status code.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The referenced area/apply/permission/version does not exist or is
    /// soft-deleted.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// The request payload is malformed (e.g. an empty rejection reason).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The requested transition is illegal from the entity's current
    /// status (e.g. approving a non-PENDING application).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A conflicting PENDING application or ACTIVE permission already
    /// exists.
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Optimistic-concurrency version mismatch between concurrent writers.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Proposed geometry escapes the authorized region.
    #[error(transparent)]
    Boundary(#[from] BoundaryViolation),

    /// No valid access token was presented.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The actor's role or ownership does not satisfy the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Unexpected failure; details are logged server-side only.
    #[error("Internal error: {0}")]
    Internal(String),
}
