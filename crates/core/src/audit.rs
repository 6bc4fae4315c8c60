//! Audit trail constants and integrity hashing.
//!
//! Lives in `core` (zero internal deps) so both the repository layer and
//! any future CLI tooling can verify the chain without a server.

use crate::hashing;

/// Known action names for audit log entries.
pub mod actions {
    pub const APPLY_SUBMIT: &str = "apply_submit";
    pub const APPLY_APPROVE: &str = "apply_approve";
    pub const APPLY_REJECT: &str = "apply_reject";
    pub const PERMISSION_GRANT: &str = "permission_grant";
    pub const PERMISSION_REVOKE: &str = "permission_revoke";
    pub const PERMISSION_EXPIRE: &str = "permission_expire";
    pub const PROPOSAL_SUBMIT: &str = "proposal_submit";
    pub const PROPOSAL_REVIEW: &str = "proposal_review";
    pub const VERSION_DRAFT: &str = "version_draft";
    pub const VERSION_PUBLISH: &str = "version_publish";
    pub const VERSION_ROLLBACK: &str = "version_rollback";
}

/// Entity type names recorded in the `entity_type` column.
pub mod entities {
    pub const AREA: &str = "area";
    pub const AREA_APPLY: &str = "area_apply";
    pub const AREA_PERMISSION: &str = "area_permission";
    pub const LAYOUT_VERSION: &str = "layout_version";
    pub const LAYOUT_PROPOSAL: &str = "layout_proposal";
}

/// Known seed value for the first entry in the hash chain.
const CHAIN_SEED: &str = "ATRIUM_AUDIT_CHAIN_SEED_V1";

/// Compute the integrity hash for an audit entry.
///
/// `prev_hash` is the hash of the previous entry, or `None` for the first
/// entry (which chains off a fixed seed). `entry_data` is the canonical
/// string representation of the entry (its JSON-serialized fields).
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    hashing::sha256_hex(format!("{prev}|{entry_data}").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_entry_chains_off_the_seed() {
        let hash = compute_integrity_hash(None, "entry");
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn chain_links_differ_from_their_parent() {
        let first = compute_integrity_hash(None, "entry_1");
        let second = compute_integrity_hash(Some(&first), "entry_2");
        assert_ne!(first, second);
    }

    #[test]
    fn identical_inputs_hash_identically() {
        assert_eq!(
            compute_integrity_hash(Some("p"), "data"),
            compute_integrity_hash(Some("p"), "data")
        );
    }

    #[test]
    fn different_parents_break_the_chain() {
        assert_ne!(
            compute_integrity_hash(Some("a"), "data"),
            compute_integrity_hash(Some("b"), "data")
        );
    }
}
