//! In-memory taxonomy store with derived reverse indexes

use super::concept::{Concept, ConceptId, EntityId, RelKind};
use std::collections::{BTreeSet, HashMap};

/// The in-memory store for the whole taxonomy.
///
/// Holds every concept plus two derived indexes: children-by-relation
/// (hyponym/holonym traversal) and external-entity → concept. The indexes
/// are updated on every `put`; reads never create entries.
#[derive(Debug, Default)]
pub struct TaxonomyStore {
    concepts: HashMap<ConceptId, Concept>,
    children: HashMap<RelKind, HashMap<ConceptId, BTreeSet<ConceptId>>>,
    by_external: HashMap<EntityId, ConceptId>,
}

impl TaxonomyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ConceptId) -> Option<&Concept> {
        self.concepts.get(id)
    }

    pub fn contains(&self, id: &ConceptId) -> bool {
        self.concepts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Insert or replace a concept, keeping the derived indexes in sync.
    pub fn put(&mut self, concept: Concept) -> ConceptId {
        let id = concept.id.clone();
        if let Some(old) = self.concepts.remove(&id) {
            self.unindex(&old);
        }
        self.index(&concept);
        self.concepts.insert(id.clone(), concept);
        id
    }

    /// Concepts that point at `id` through `kind` (hyponyms for
    /// `Hypernym`, holonyms for `MeroMember`).
    pub fn children_by_relation(&self, id: &ConceptId, kind: RelKind) -> BTreeSet<ConceptId> {
        self.children
            .get(&kind)
            .and_then(|index| index.get(id))
            .cloned()
            .unwrap_or_default()
    }

    /// The concept linked to an external entity, if any.
    pub fn lookup_external(&self, entity: &EntityId) -> Option<&ConceptId> {
        self.by_external.get(entity)
    }

    /// Direct-parent map over hypernym and instance-hypernym edges,
    /// the input to closure computation.
    pub fn parent_map(&self) -> HashMap<ConceptId, BTreeSet<ConceptId>> {
        self.concepts
            .iter()
            .map(|(id, concept)| (id.clone(), concept.direct_parents()))
            .collect()
    }

    /// Iterate all concepts in id order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &Concept> {
        let mut ids: Vec<&ConceptId> = self.concepts.keys().collect();
        ids.sort();
        ids.into_iter().map(|id| &self.concepts[id])
    }

    fn index(&mut self, concept: &Concept) {
        for kind in [RelKind::Hypernym, RelKind::InstanceHypernym, RelKind::MeroMember] {
            for target in concept.relation(kind) {
                self.children
                    .entry(kind)
                    .or_default()
                    .entry(target.clone())
                    .or_default()
                    .insert(concept.id.clone());
            }
        }
        if let Some(link) = &concept.external {
            for entity in link.ids() {
                self.by_external.insert(entity.clone(), concept.id.clone());
            }
        }
    }

    fn unindex(&mut self, concept: &Concept) {
        for kind in [RelKind::Hypernym, RelKind::InstanceHypernym, RelKind::MeroMember] {
            if let Some(index) = self.children.get_mut(&kind) {
                for target in concept.relation(kind) {
                    if let Some(set) = index.get_mut(target) {
                        set.remove(&concept.id);
                        if set.is_empty() {
                            index.remove(target);
                        }
                    }
                }
            }
        }
        if let Some(link) = &concept.external {
            for entity in link.ids() {
                self.by_external.remove(entity);
            }
        }
    }
}
