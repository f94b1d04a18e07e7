//! Relationship reconciliation.
//!
//! Works purely on instance identities. By the time a merge runs, every
//! imported record has already been upserted, so an instance matched by
//! primary key carries the same [`ObjectId`] in both sets.

use graft_model::{Cardinality, MergePolicy};
use graft_types::ObjectId;
use std::collections::HashSet;

/// The reconciled related set, plus the instances it no longer contains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub related: Vec<ObjectId>,
    /// Disassociated instances, deleted by the caller when the relationship owns them.
    pub removed: Vec<ObjectId>,
}

/// Computes the final related set of a relationship.
///
/// - to-one: every policy sets the single imported instance
/// - `Replace`: exactly the imported set, in import order
/// - `Merge`: the current set followed by newly imported instances
/// - `MergeAndPrune`: current instances that were imported again, in their
///   current order, followed by newly imported instances
///
/// Duplicate identities in `imported` collapse onto their first occurrence.
pub fn merge(
    current: &[ObjectId],
    imported: &[ObjectId],
    cardinality: Cardinality,
    policy: MergePolicy,
) -> MergeOutcome {
    let imported = dedup(imported);

    let related = match (cardinality, policy) {
        (Cardinality::ToOne, _) => match imported.last() {
            Some(id) => vec![*id],
            None => current.to_vec(),
        },
        (Cardinality::ToMany, MergePolicy::Replace) => imported,
        (Cardinality::ToMany, MergePolicy::Merge) => {
            let mut related = dedup(current);
            let seen: HashSet<ObjectId> = related.iter().copied().collect();
            related.extend(imported.into_iter().filter(|id| !seen.contains(id)));
            related
        }
        (Cardinality::ToMany, MergePolicy::MergeAndPrune) => {
            let wanted: HashSet<ObjectId> = imported.iter().copied().collect();
            let mut related: Vec<ObjectId> = dedup(current)
                .into_iter()
                .filter(|id| wanted.contains(id))
                .collect();
            let kept: HashSet<ObjectId> = related.iter().copied().collect();
            related.extend(imported.into_iter().filter(|id| !kept.contains(id)));
            related
        }
    };

    let remaining: HashSet<ObjectId> = related.iter().copied().collect();
    let removed = dedup(current)
        .into_iter()
        .filter(|id| !remaining.contains(id))
        .collect();

    MergeOutcome { related, removed }
}

fn dedup(ids: &[ObjectId]) -> Vec<ObjectId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
