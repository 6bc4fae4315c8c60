//! Layout snapshot types and pure merge logic.
//!
//! A layout version's `snapshot` column holds the full set of placed
//! objects; a proposal's `changes` column holds the delta a merchant
//! submitted (a frozen copy taken at submit time). Merging deltas into a
//! snapshot is pure data manipulation and lives here so the version
//! manager can be tested without a database.

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;
use crate::types::DbId;

/// A placed object inside an area (shelf, table, decoration, ...).
///
/// `object_id` is the builder's stable identifier; the engine treats it as
/// opaque and only cares about the bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub object_id: String,
    pub kind: String,
    pub area_id: DbId,
    pub bounds: BoundingBox,
}

/// The delta a merchant submits: objects added, objects replaced, and
/// object ids removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalChanges {
    #[serde(default)]
    pub added: Vec<SceneObject>,
    #[serde(default)]
    pub modified: Vec<SceneObject>,
    #[serde(default)]
    pub removed: Vec<String>,
}

impl ProposalChanges {
    /// All objects whose geometry must be boundary-checked.
    pub fn placed_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.added.iter().chain(self.modified.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }
}

/// Apply one delta to a snapshot, producing the next snapshot.
///
/// Removals and modifications match on `object_id`; a modification whose
/// id is not present behaves like an addition (the builder may have
/// created and edited the object within a single session).
pub fn apply_changes(base: &[SceneObject], changes: &ProposalChanges) -> Vec<SceneObject> {
    let mut next: Vec<SceneObject> = base
        .iter()
        .filter(|o| {
            !changes.removed.iter().any(|id| *id == o.object_id)
                && !changes.modified.iter().any(|m| m.object_id == o.object_id)
                && !changes.added.iter().any(|a| a.object_id == o.object_id)
        })
        .cloned()
        .collect();
    next.extend(changes.modified.iter().cloned());
    next.extend(changes.added.iter().cloned());
    next
}

/// Fold a sequence of deltas into a base snapshot, in submission order.
pub fn merge_snapshot(base: &[SceneObject], deltas: &[ProposalChanges]) -> Vec<SceneObject> {
    deltas
        .iter()
        .fold(base.to_vec(), |acc, delta| apply_changes(&acc, delta))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
