//! Status constants and transition rules for every governed entity.
//!
//! Statuses are stored as TEXT in the database (backed by CHECK
//! constraints) and mirrored here as constants, with one transition
//! predicate per entity. Repositories re-check the predecessor status
//! inside their transactions; these predicates are the single place the
//! legal state graphs are written down.

// ---------------------------------------------------------------------------
// Area
// ---------------------------------------------------------------------------

/// Statuses of an area, the unit of permission granting.
pub mod area_status {
    /// No one holds or has requested editing rights.
    pub const LOCKED: &str = "LOCKED";
    /// An application is awaiting admin review.
    pub const PENDING: &str = "PENDING";
    /// Exactly one merchant holds an ACTIVE permission.
    pub const AUTHORIZED: &str = "AUTHORIZED";
    /// A store occupies the area.
    pub const OCCUPIED: &str = "OCCUPIED";

    pub const ALL: &[&str] = &[LOCKED, PENDING, AUTHORIZED, OCCUPIED];
}

/// Whether an area may move from `from` to `to`.
pub fn area_transition_allowed(from: &str, to: &str) -> bool {
    use area_status::*;
    matches!(
        (from, to),
        (LOCKED, PENDING)
            | (PENDING, AUTHORIZED)
            | (PENDING, LOCKED)
            | (AUTHORIZED, LOCKED)
            | (AUTHORIZED, OCCUPIED)
            | (OCCUPIED, LOCKED)
    )
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Statuses of a merchant's application for editing rights.
pub mod apply_status {
    pub const PENDING: &str = "PENDING";
    pub const APPROVED: &str = "APPROVED";
    pub const REJECTED: &str = "REJECTED";

    pub const ALL: &[&str] = &[PENDING, APPROVED, REJECTED];
}

/// Applications are strictly forward-only: PENDING resolves exactly once.
pub fn apply_transition_allowed(from: &str, to: &str) -> bool {
    use apply_status::*;
    matches!((from, to), (PENDING, APPROVED) | (PENDING, REJECTED))
}

// ---------------------------------------------------------------------------
// Permission
// ---------------------------------------------------------------------------

/// Statuses of a granted permission.
pub mod permission_status {
    pub const ACTIVE: &str = "ACTIVE";
    pub const FROZEN: &str = "FROZEN";
    pub const EXPIRED: &str = "EXPIRED";
    pub const REVOKED: &str = "REVOKED";

    pub const ALL: &[&str] = &[ACTIVE, FROZEN, EXPIRED, REVOKED];
}

/// EXPIRED and REVOKED are terminal; a frozen grant may thaw.
pub fn permission_transition_allowed(from: &str, to: &str) -> bool {
    use permission_status::*;
    matches!(
        (from, to),
        (ACTIVE, FROZEN)
            | (ACTIVE, EXPIRED)
            | (ACTIVE, REVOKED)
            | (FROZEN, ACTIVE)
            | (FROZEN, EXPIRED)
            | (FROZEN, REVOKED)
    )
}

// ---------------------------------------------------------------------------
// Layout version
// ---------------------------------------------------------------------------

/// Statuses of a published layout snapshot.
pub mod version_status {
    pub const DRAFT: &str = "DRAFT";
    pub const ACTIVE: &str = "ACTIVE";
    pub const ARCHIVED: &str = "ARCHIVED";

    pub const ALL: &[&str] = &[DRAFT, ACTIVE, ARCHIVED];
}

/// Only the publish operation promotes a draft; rollback republishes a
/// clone rather than resurrecting an archived row.
pub fn version_transition_allowed(from: &str, to: &str) -> bool {
    use version_status::*;
    matches!((from, to), (DRAFT, ACTIVE) | (ACTIVE, ARCHIVED))
}

// ---------------------------------------------------------------------------
// Layout change proposal
// ---------------------------------------------------------------------------

/// Statuses of a merchant's batched layout edit.
pub mod proposal_status {
    pub const PENDING_REVIEW: &str = "PENDING_REVIEW";
    pub const APPROVED: &str = "APPROVED";
    pub const REJECTED: &str = "REJECTED";
    /// Terminal; reached only when a publish incorporates the proposal.
    pub const MERGED: &str = "MERGED";

    pub const ALL: &[&str] = &[PENDING_REVIEW, APPROVED, REJECTED, MERGED];
}

pub fn proposal_transition_allowed(from: &str, to: &str) -> bool {
    use proposal_status::*;
    matches!(
        (from, to),
        (PENDING_REVIEW, APPROVED) | (PENDING_REVIEW, REJECTED) | (APPROVED, MERGED)
    )
}

// ---------------------------------------------------------------------------
// Grant types
// ---------------------------------------------------------------------------

/// How a permission came to exist.
pub mod grant_type {
    pub const ADMIN_APPROVAL: &str = "ADMIN_APPROVAL";
    pub const AUTO_RULE: &str = "AUTO_RULE";

    pub const ALL: &[&str] = &[ADMIN_APPROVAL, AUTO_RULE];
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_resolves_exactly_once() {
        assert!(apply_transition_allowed(
            apply_status::PENDING,
            apply_status::APPROVED
        ));
        assert!(apply_transition_allowed(
            apply_status::PENDING,
            apply_status::REJECTED
        ));
    }

    #[test]
    fn apply_has_no_backward_edges() {
        // No path ever leads back to PENDING, and resolved states are final.
        for from in [apply_status::APPROVED, apply_status::REJECTED] {
            for to in apply_status::ALL {
                assert!(
                    !apply_transition_allowed(from, to),
                    "{from} -> {to} must be illegal"
                );
            }
        }
    }

    #[test]
    fn expired_and_revoked_permissions_are_terminal() {
        for from in [permission_status::EXPIRED, permission_status::REVOKED] {
            for to in permission_status::ALL {
                assert!(
                    !permission_transition_allowed(from, to),
                    "{from} -> {to} must be illegal"
                );
            }
        }
    }

    #[test]
    fn active_permission_can_expire_or_be_revoked() {
        assert!(permission_transition_allowed(
            permission_status::ACTIVE,
            permission_status::EXPIRED
        ));
        assert!(permission_transition_allowed(
            permission_status::ACTIVE,
            permission_status::REVOKED
        ));
    }

    #[test]
    fn area_rejection_returns_to_locked() {
        assert!(area_transition_allowed(
            area_status::PENDING,
            area_status::LOCKED
        ));
    }

    #[test]
    fn area_cannot_skip_review() {
        assert!(!area_transition_allowed(
            area_status::LOCKED,
            area_status::AUTHORIZED
        ));
    }

    #[test]
    fn only_drafts_publish() {
        assert!(version_transition_allowed(
            version_status::DRAFT,
            version_status::ACTIVE
        ));
        assert!(!version_transition_allowed(
            version_status::ARCHIVED,
            version_status::ACTIVE
        ));
    }

    #[test]
    fn merged_is_terminal_and_only_follows_approval() {
        assert!(proposal_transition_allowed(
            proposal_status::APPROVED,
            proposal_status::MERGED
        ));
        assert!(!proposal_transition_allowed(
            proposal_status::PENDING_REVIEW,
            proposal_status::MERGED
        ));
        for to in proposal_status::ALL {
            assert!(!proposal_transition_allowed(proposal_status::MERGED, to));
        }
    }
}
