//! Entry merge engine
//!
//! Folds observations about external entities into the taxonomy. An
//! entity already linked to a concept updates that concept in place; an
//! unlinked entity gets a freshly synthesized concept; an entity with no
//! label and no description is skipped. List-valued fields are unioned,
//! definitions are append-only, and a disagreeing external link is never
//! resolved here — it becomes a conflict record for manual review.

use crate::graph::{
    most_specific, ClosureTable, Concept, ConceptId, EntityId, ExternalLink, RelKind,
    TaxonomyStore,
};
use crate::sink::EmissionSink;
use crate::source::SourceResult;
use std::collections::BTreeSet;
use tracing::warn;

/// What one pass learned about an external entity.
#[derive(Debug, Clone)]
pub struct Observation {
    pub entity: EntityId,
    /// Labels from the knowledge base, used as members unless `lemmas`
    /// overrides them
    pub labels: Vec<String>,
    pub description: String,
    /// Curated lemmas that take precedence over raw labels
    pub lemmas: Vec<String>,
    /// Member taxa to record as part-whole children
    pub mero_members: Vec<ConceptId>,
}

impl Observation {
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            labels: Vec::new(),
            description: String::new(),
            lemmas: Vec::new(),
            mero_members: Vec::new(),
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_lemmas(mut self, lemmas: Vec<String>) -> Self {
        self.lemmas = lemmas;
        self
    }

    pub fn with_mero_members(mut self, mero_members: Vec<ConceptId>) -> Self {
        self.mero_members = mero_members;
        self
    }

    fn members(&self) -> &[String] {
        if self.lemmas.is_empty() {
            &self.labels
        } else {
            &self.lemmas
        }
    }

    /// Neither a usable label nor a non-empty description: nothing to merge.
    fn is_blank(&self) -> bool {
        self.members().iter().all(|m| m.is_empty()) && self.description.is_empty()
    }
}

/// The result of applying one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Data folded into an already-linked concept
    Merged(ConceptId),
    /// A new concept was synthesized
    Created(ConceptId),
    /// Empty observation, nothing done
    Skipped,
}

/// An external-link disagreement surfaced for manual review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictRecord {
    pub concept: ConceptId,
    pub existing: Vec<EntityId>,
    pub incoming: EntityId,
}

/// Applies observations against the store, emitting every mutation.
pub struct MergeEngine<'a> {
    store: &'a mut TaxonomyStore,
    closure: &'a ClosureTable,
    conflicts: Vec<ConflictRecord>,
}

impl<'a> MergeEngine<'a> {
    pub fn new(store: &'a mut TaxonomyStore, closure: &'a ClosureTable) -> Self {
        Self {
            store,
            closure,
            conflicts: Vec::new(),
        }
    }

    /// Merge an observation, attaching the redundancy-reduced candidate
    /// parents as `kind` edges. Candidates that would make the concept
    /// its own ancestor are dropped; the hypernym graph stays acyclic.
    pub fn apply(
        &mut self,
        observation: &Observation,
        candidates: &BTreeSet<ConceptId>,
        kind: RelKind,
        sink: &mut dyn EmissionSink,
    ) -> SourceResult<MergeOutcome> {
        if observation.is_blank() {
            return Ok(MergeOutcome::Skipped);
        }
        let reduced = most_specific(candidates, self.closure);

        if let Some(id) = self.store.lookup_external(&observation.entity).cloned() {
            let Some(existing) = self.store.get(&id) else {
                // The external index only holds ids of stored concepts
                debug_assert!(false, "external index points at a missing concept");
                return Ok(MergeOutcome::Skipped);
            };
            let mut concept = existing.clone();
            if !observation.description.is_empty() {
                // Append-only: duplicate definitions from multiple
                // sources are kept verbatim
                concept.definitions.push(observation.description.clone());
            }
            concept
                .relation_mut(kind)
                .extend(self.acyclic_parents(&id, reduced));
            for member in observation.members() {
                concept.members.insert(member.clone());
            }
            concept
                .mero_members
                .extend(observation.mero_members.iter().cloned());
            self.store.put(concept.clone());
            sink.emit(&concept)?;
            return Ok(MergeOutcome::Merged(id));
        }

        let id = ConceptId::from_entity(&observation.entity);
        let mut concept = Concept::new(id.clone());
        for member in observation.members() {
            concept.members.insert(member.clone());
        }
        if !observation.description.is_empty() {
            concept.definitions.push(observation.description.clone());
        }
        concept
            .relation_mut(kind)
            .extend(self.acyclic_parents(&id, reduced));
        concept
            .mero_members
            .extend(observation.mero_members.iter().cloned());
        concept.external = Some(ExternalLink::Single(observation.entity.clone()));
        self.store.put(concept.clone());
        sink.emit(&concept)?;
        Ok(MergeOutcome::Created(id))
    }

    /// Drop parents that would close a hypernym cycle: the concept
    /// itself, or a candidate the concept already sits above.
    fn acyclic_parents(&self, id: &ConceptId, reduced: Vec<ConceptId>) -> Vec<ConceptId> {
        reduced
            .into_iter()
            .filter(|candidate| {
                let cyclic = candidate == id || self.closure.is_ancestor(candidate, id);
                if cyclic {
                    warn!(concept = %id, parent = %candidate, "dropping parent that would close a hypernym cycle");
                }
                !cyclic
            })
            .collect()
    }

    /// Attach an external link to a concept. A pre-existing link to a
    /// different entity is never replaced; it becomes a conflict record.
    pub fn link_external(&mut self, concept_id: &ConceptId, entity: EntityId) {
        let Some(concept) = self.store.get(concept_id) else {
            warn!(concept = %concept_id, "link target concept not in store");
            return;
        };
        match &concept.external {
            None => {
                let mut updated = concept.clone();
                updated.external = Some(ExternalLink::Single(entity));
                self.store.put(updated);
            }
            Some(link) if link.contains(&entity) => {}
            Some(link) => {
                warn!(concept = %concept_id, incoming = %entity, "conflicting external link");
                self.conflicts.push(ConflictRecord {
                    concept: concept_id.clone(),
                    existing: link.ids().into_iter().cloned().collect(),
                    incoming: entity,
                });
            }
        }
    }

    /// Attach a reviewer-accepted link, widening an existing link instead
    /// of conflicting — accepted ledger rows are authoritative.
    pub fn link_reviewed(&mut self, concept_id: &ConceptId, entity: EntityId) {
        let Some(concept) = self.store.get(concept_id) else {
            warn!(concept = %concept_id, "link target concept not in store");
            return;
        };
        let mut updated = concept.clone();
        match &mut updated.external {
            None => updated.external = Some(ExternalLink::Single(entity)),
            Some(link) => link.insert(entity),
        }
        self.store.put(updated);
    }

    /// Read access to the underlying store while the engine holds it.
    pub fn store(&self) -> &TaxonomyStore {
        self.store
    }

    pub fn conflicts(&self) -> &[ConflictRecord] {
        &self.conflicts
    }

    pub fn take_conflicts(&mut self) -> Vec<ConflictRecord> {
        std::mem::take(&mut self.conflicts)
    }
}
