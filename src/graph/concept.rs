//! Concept (synset) representation in the taxonomy

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Identifier of a concept in the taxonomy.
///
/// Either a curated synset id (`02084071-n`) or a synthesized id derived
/// from an external entity (`Q140-n`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConceptId(String);

impl ConceptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Deterministic id for a concept synthesized from an external entity.
    pub fn from_entity(entity: &EntityId) -> Self {
        Self(format!("{}-n", entity.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConceptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an entity in the external knowledge base (e.g. `Q5`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relation kinds a concept participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelKind {
    /// Broader class ("dog" → "animal")
    Hypernym,
    /// Class membership of an individual ("Fido" is-an instance of "dog")
    InstanceHypernym,
    /// Member part-whole relation (taxon → member taxa)
    MeroMember,
}

impl RelKind {
    pub fn as_str(&self) -> &str {
        match self {
            RelKind::Hypernym => "hypernym",
            RelKind::InstanceHypernym => "instance_hypernym",
            RelKind::MeroMember => "mero_member",
        }
    }
}

impl std::fmt::Display for RelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Link from a concept to the external knowledge base.
///
/// A concept usually maps to one entity, but curation can record several
/// (e.g. a species and its original taxonomic combination).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalLink {
    Single(EntityId),
    Multiple(BTreeSet<EntityId>),
}

impl ExternalLink {
    pub fn contains(&self, entity: &EntityId) -> bool {
        match self {
            ExternalLink::Single(e) => e == entity,
            ExternalLink::Multiple(es) => es.contains(entity),
        }
    }

    /// All linked entity ids, in sorted order.
    pub fn ids(&self) -> Vec<&EntityId> {
        match self {
            ExternalLink::Single(e) => vec![e],
            ExternalLink::Multiple(es) => es.iter().collect(),
        }
    }

    /// Add an entity to the link, widening `Single` to `Multiple` as needed.
    pub fn insert(&mut self, entity: EntityId) {
        match self {
            ExternalLink::Single(e) if *e == entity => {}
            ExternalLink::Single(e) => {
                let mut set = BTreeSet::new();
                set.insert(e.clone());
                set.insert(entity);
                *self = ExternalLink::Multiple(set);
            }
            ExternalLink::Multiple(es) => {
                es.insert(entity);
            }
        }
    }
}

/// A concept (synset) in the taxonomy.
///
/// Lemma members and relation targets are kept in ordered sets so that
/// iteration order never depends on insertion history; definitions are an
/// append-only sequence and may repeat across sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    pub id: ConceptId,
    #[serde(default)]
    pub members: BTreeSet<String>,
    #[serde(default)]
    pub definitions: Vec<String>,
    #[serde(default)]
    pub hypernyms: BTreeSet<ConceptId>,
    #[serde(default)]
    pub instance_hypernyms: BTreeSet<ConceptId>,
    #[serde(default)]
    pub mero_members: BTreeSet<ConceptId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<ExternalLink>,
}

impl Concept {
    pub fn new(id: ConceptId) -> Self {
        Self {
            id,
            members: BTreeSet::new(),
            definitions: Vec::new(),
            hypernyms: BTreeSet::new(),
            instance_hypernyms: BTreeSet::new(),
            mero_members: BTreeSet::new(),
            external: None,
        }
    }

    pub fn with_member(mut self, lemma: impl Into<String>) -> Self {
        self.members.insert(lemma.into());
        self
    }

    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definitions.push(definition.into());
        self
    }

    pub fn with_parent(mut self, kind: RelKind, parent: ConceptId) -> Self {
        self.relation_mut(kind).insert(parent);
        self
    }

    pub fn with_external(mut self, entity: EntityId) -> Self {
        self.external = Some(ExternalLink::Single(entity));
        self
    }

    /// Direct targets of a relation kind.
    pub fn relation(&self, kind: RelKind) -> &BTreeSet<ConceptId> {
        match kind {
            RelKind::Hypernym => &self.hypernyms,
            RelKind::InstanceHypernym => &self.instance_hypernyms,
            RelKind::MeroMember => &self.mero_members,
        }
    }

    pub fn relation_mut(&mut self, kind: RelKind) -> &mut BTreeSet<ConceptId> {
        match kind {
            RelKind::Hypernym => &mut self.hypernyms,
            RelKind::InstanceHypernym => &mut self.instance_hypernyms,
            RelKind::MeroMember => &mut self.mero_members,
        }
    }

    /// Direct parents via both hypernym relations, the edge set the
    /// closure is computed over.
    pub fn direct_parents(&self) -> BTreeSet<ConceptId> {
        self.hypernyms
            .iter()
            .chain(self.instance_hypernyms.iter())
            .cloned()
            .collect()
    }

    /// True when the concept carries neither a lemma nor a definition.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.definitions.iter().all(|d| d.is_empty())
    }
}
