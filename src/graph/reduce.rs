//! Redundant-hypernym elimination

use super::closure::ClosureTable;
use super::concept::ConceptId;
use std::collections::BTreeSet;

/// Reduce a candidate ancestor set to its most specific members.
///
/// A candidate is dropped when another candidate already implies it, i.e.
/// when it appears in that candidate's ancestor closure. Incomparable
/// candidates are all kept (multiple hypernyms are permitted). Output is
/// sorted, so the result is deterministic for a fixed closure table.
pub fn most_specific(candidates: &BTreeSet<ConceptId>, closure: &ClosureTable) -> Vec<ConceptId> {
    candidates
        .iter()
        .filter(|candidate| {
            !candidates
                .iter()
                .any(|other| other != *candidate && closure.is_ancestor(other, candidate))
        })
        .cloned()
        .collect()
}
