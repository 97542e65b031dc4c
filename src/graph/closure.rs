//! Transitive ancestor closure over hypernym edges

use super::concept::ConceptId;
use std::collections::{BTreeSet, HashMap};

/// The full ancestor closure of every concept.
///
/// Computed once per batch by fixed-point relaxation and consulted by the
/// redundancy reducer. New edges invalidate the table; the only supported
/// refresh is a full recompute.
///
/// Cycles in the source data are tolerated: every member of a cycle ends
/// up with every other member, itself included, in its closure. Each node
/// can gain each ancestor only once, so the relaxation still terminates.
#[derive(Debug, Default, Clone)]
pub struct ClosureTable {
    ancestors: HashMap<ConceptId, BTreeSet<ConceptId>>,
}

impl ClosureTable {
    /// Compute the closure from a direct-parent map.
    pub fn compute(direct_parents: &HashMap<ConceptId, BTreeSet<ConceptId>>) -> Self {
        let mut ancestors = direct_parents.clone();
        let ids: Vec<ConceptId> = {
            let mut ids: Vec<ConceptId> = ancestors.keys().cloned().collect();
            ids.sort();
            ids
        };

        let mut changes = 1usize;
        while changes > 0 {
            changes = 0;
            for id in &ids {
                let current: Vec<ConceptId> =
                    ancestors.get(id).map(|s| s.iter().cloned().collect()).unwrap_or_default();
                let mut additions: Vec<ConceptId> = Vec::new();
                for parent in &current {
                    if let Some(grandparents) = ancestors.get(parent) {
                        for grandparent in grandparents {
                            if !ancestors[id].contains(grandparent) {
                                additions.push(grandparent.clone());
                            }
                        }
                    }
                }
                if !additions.is_empty() {
                    let set = ancestors.entry(id.clone()).or_default();
                    for ancestor in additions {
                        if set.insert(ancestor) {
                            changes += 1;
                        }
                    }
                }
            }
        }

        Self { ancestors }
    }

    /// All transitive ancestors of `id`. Unknown ids have no ancestors.
    pub fn ancestors(&self, id: &ConceptId) -> BTreeSet<ConceptId> {
        self.ancestors.get(id).cloned().unwrap_or_default()
    }

    /// True when `ancestor` is in the closure of `id`.
    pub fn is_ancestor(&self, id: &ConceptId, ancestor: &ConceptId) -> bool {
        self.ancestors
            .get(id)
            .map(|set| set.contains(ancestor))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.ancestors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ancestors.is_empty()
    }
}
