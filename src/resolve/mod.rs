//! External property resolver
//!
//! Maps an external entity to anchor concepts by walking a typed parent
//! relation (subclass-of, parent-taxon) upward through the knowledge base
//! until an anchored entity is found. External data is untrusted and may
//! contain cycles, so every top-level call carries its own visited set.

use crate::graph::{ConceptId, EntityId};
use crate::source::{KnowledgeService, SourceResult};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// A concept known to correspond to a class of external entities, with an
/// optional taxonomic rank tag used for filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub concept: ConceptId,
    pub rank: Option<String>,
}

impl Anchor {
    pub fn new(concept: ConceptId) -> Self {
        Self {
            concept,
            rank: None,
        }
    }

    pub fn with_rank(concept: ConceptId, rank: impl Into<String>) -> Self {
        Self {
            concept,
            rank: Some(rank.into()),
        }
    }
}

/// Entity → anchors lookup seeded from review ledgers.
#[derive(Debug, Default)]
pub struct AnchorMap {
    anchors: HashMap<EntityId, Vec<Anchor>>,
}

impl AnchorMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: EntityId, anchor: Anchor) {
        let anchors = self.anchors.entry(entity).or_default();
        if !anchors.contains(&anchor) {
            anchors.push(anchor);
        }
    }

    pub fn get(&self, entity: &EntityId) -> Option<&[Anchor]> {
        self.anchors.get(entity).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// Resolves entities to anchor concepts over a knowledge service.
pub struct Resolver<'a, K: KnowledgeService> {
    knowledge: &'a K,
    anchors: &'a AnchorMap,
}

impl<'a, K: KnowledgeService> Resolver<'a, K> {
    pub fn new(knowledge: &'a K, anchors: &'a AnchorMap) -> Self {
        Self { knowledge, anchors }
    }

    /// Resolve `entity` to anchor concepts via `relation_code`.
    pub fn resolve(&self, entity: &EntityId, relation_code: &str) -> SourceResult<Vec<ConceptId>> {
        self.resolve_ranked(entity, relation_code, None)
    }

    /// Like [`resolve`](Self::resolve), but an anchored entity only
    /// contributes anchors whose rank matches `rank` (case-insensitive).
    /// Without a rank every anchor counts.
    pub fn resolve_ranked(
        &self,
        entity: &EntityId,
        relation_code: &str,
        rank: Option<&str>,
    ) -> SourceResult<Vec<ConceptId>> {
        let mut visited = BTreeSet::new();
        let mut found = Vec::new();
        self.walk(entity, relation_code, rank, &mut visited, &mut found)?;

        // Anchors can be reached along several paths; keep first occurrence
        let mut seen = BTreeSet::new();
        found.retain(|concept| seen.insert(concept.clone()));
        Ok(found)
    }

    fn walk(
        &self,
        entity: &EntityId,
        relation_code: &str,
        rank: Option<&str>,
        visited: &mut BTreeSet<EntityId>,
        found: &mut Vec<ConceptId>,
    ) -> SourceResult<()> {
        if !visited.insert(entity.clone()) {
            return Ok(());
        }

        // Depth-0 anchor hit ends the walk: the most specific mapping wins
        if let Some(anchors) = self.anchors.get(entity) {
            for anchor in anchors {
                let keep = match (rank, &anchor.rank) {
                    (None, _) => true,
                    (Some(wanted), Some(tagged)) => wanted.eq_ignore_ascii_case(tagged),
                    (Some(_), None) => false,
                };
                if keep {
                    found.push(anchor.concept.clone());
                }
            }
            return Ok(());
        }

        let properties = self.knowledge.properties(entity)?;
        let Some(parents) = properties.get(relation_code) else {
            debug!(entity = %entity, relation_code, "no parent property, walk ends");
            return Ok(());
        };
        for parent in parents {
            if !visited.contains(parent) {
                self.walk(parent, relation_code, rank, visited, found)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryKnowledge;

    const PARENT: &str = "P171";

    fn entity(s: &str) -> EntityId {
        EntityId::new(s)
    }

    fn concept(s: &str) -> ConceptId {
        ConceptId::new(s)
    }

    #[test]
    fn test_direct_anchor_short_circuits() {
        let mut knowledge = MemoryKnowledge::new();
        // E has a parent, but E itself is anchored, so the parent's
        // anchor must not be reached.
        knowledge.add_property(entity("E"), PARENT, &[entity("P")]);
        let mut anchors = AnchorMap::new();
        anchors.insert(entity("E"), Anchor::new(concept("direct-n")));
        anchors.insert(entity("P"), Anchor::new(concept("parent-n")));

        let resolver = Resolver::new(&knowledge, &anchors);
        let resolved = resolver.resolve(&entity("E"), PARENT).unwrap();
        assert_eq!(resolved, vec![concept("direct-n")]);
    }

    #[test]
    fn test_walk_accumulates_over_branches() {
        let mut knowledge = MemoryKnowledge::new();
        knowledge.add_property(entity("E"), PARENT, &[entity("A"), entity("B")]);
        knowledge.add_property(entity("A"), PARENT, &[entity("A2")]);
        let mut anchors = AnchorMap::new();
        anchors.insert(entity("A2"), Anchor::new(concept("deep-n")));
        anchors.insert(entity("B"), Anchor::new(concept("shallow-n")));

        let resolver = Resolver::new(&knowledge, &anchors);
        let resolved = resolver.resolve(&entity("E"), PARENT).unwrap();
        assert_eq!(resolved, vec![concept("deep-n"), concept("shallow-n")]);
    }

    #[test]
    fn test_cycle_without_anchor_returns_empty() {
        let mut knowledge = MemoryKnowledge::new();
        knowledge.add_property(entity("A"), PARENT, &[entity("B")]);
        knowledge.add_property(entity("B"), PARENT, &[entity("C")]);
        knowledge.add_property(entity("C"), PARENT, &[entity("A")]);
        let anchors = AnchorMap::new();

        let resolver = Resolver::new(&knowledge, &anchors);
        let resolved = resolver.resolve(&entity("A"), PARENT).unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_missing_entity_resolves_empty() {
        let knowledge = MemoryKnowledge::new();
        let anchors = AnchorMap::new();
        let resolver = Resolver::new(&knowledge, &anchors);
        assert!(resolver.resolve(&entity("Q404"), PARENT).unwrap().is_empty());
    }

    #[test]
    fn test_rank_filter() {
        let knowledge = MemoryKnowledge::new();
        let mut anchors = AnchorMap::new();
        anchors.insert(entity("E"), Anchor::with_rank(concept("genus-n"), "genus"));
        anchors.insert(entity("E"), Anchor::with_rank(concept("family-n"), "family"));

        let resolver = Resolver::new(&knowledge, &anchors);
        assert_eq!(
            resolver
                .resolve_ranked(&entity("E"), PARENT, Some("Genus"))
                .unwrap(),
            vec![concept("genus-n")]
        );
        // No rank requested: all anchors count
        assert_eq!(
            resolver.resolve(&entity("E"), PARENT).unwrap().len(),
            2
        );
        // No anchor of the requested rank: empty, the walk does not continue
        assert!(resolver
            .resolve_ranked(&entity("E"), PARENT, Some("order"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_duplicate_anchors_deduplicated() {
        let mut knowledge = MemoryKnowledge::new();
        // Diamond: both paths end at the same anchored entity
        knowledge.add_property(entity("E"), PARENT, &[entity("L"), entity("R")]);
        knowledge.add_property(entity("L"), PARENT, &[entity("T")]);
        knowledge.add_property(entity("R"), PARENT, &[entity("T")]);
        let mut anchors = AnchorMap::new();
        anchors.insert(entity("T"), Anchor::new(concept("top-n")));

        let resolver = Resolver::new(&knowledge, &anchors);
        let resolved = resolver.resolve(&entity("E"), PARENT).unwrap();
        assert_eq!(resolved, vec![concept("top-n")]);
    }
}
