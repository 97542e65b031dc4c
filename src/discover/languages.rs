//! Language alignment candidate discovery
//!
//! Walks the hyponym subtree under the natural-language synset and looks
//! up each proper-noun member against the knowledge-base labels. Hits are
//! kept only when the entity is itself a language, so "Turkey" the
//! country never aligns with Turkish. Every language synset gets a row:
//! a single hit, one row per hit when several entities share the name,
//! or an explicit no-match row.

use crate::graph::{ConceptId, EntityId, RelKind, TaxonomyStore};
use crate::pipeline::INSTANCE_OF;
use crate::source::{KnowledgeService, SourceResult};
use std::collections::{BTreeSet, HashSet};
use std::io::Write;

/// Root of the language subtree in the curated taxonomy.
pub const NATURAL_LANGUAGE_SYNSET: &str = "06916947-n";

/// Knowledge-base classes that mark an entity as a language or a
/// language family/variety.
pub const LANGUAGE_CLASSES: &[&str] = &[
    "Q34770",
    "Q33742",
    "Q20162172",
    "Q1288568",
    "Q33384",
    "Q45762",
    "Q436240",
    "Q941501",
    "Q25295",
];

/// How many entities answered to a language name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageMatchKind {
    Exact,
    Multiple,
    Unmatched,
}

impl LanguageMatchKind {
    pub fn as_str(&self) -> &str {
        match self {
            LanguageMatchKind::Exact => "Exact",
            LanguageMatchKind::Multiple => "Multiple",
            LanguageMatchKind::Unmatched => "None",
        }
    }
}

/// One proposed alignment between a language synset and an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageCandidate {
    pub concept: ConceptId,
    pub name: String,
    pub entity: Option<EntityId>,
    pub definition: String,
    pub description: String,
    pub kind: LanguageMatchKind,
}

/// Match every language synset against knowledge-base labels, in
/// concept-id order. Members without an uppercase character are glosses
/// ("native language") rather than names and are not looked up.
pub fn align_languages<K: KnowledgeService>(
    store: &TaxonomyStore,
    knowledge: &K,
) -> SourceResult<Vec<LanguageCandidate>> {
    let subtree = language_subtree(store);

    let mut wanted = BTreeSet::new();
    for id in &subtree {
        if let Some(concept) = store.get(id) {
            wanted.extend(name_members(concept).map(|m| m.to_lowercase()));
        }
    }
    let by_label = knowledge.entities_with_label(&wanted)?;

    let mut candidates = Vec::new();
    for id in subtree {
        let Some(concept) = store.get(&id) else {
            continue;
        };
        let names: Vec<&str> = name_members(concept).collect();
        if names.is_empty() {
            continue;
        }
        let mut matches = BTreeSet::new();
        for name in &names {
            for entity in by_label.get(&name.to_lowercase()).into_iter().flatten() {
                if is_language(knowledge, entity)? {
                    matches.insert(entity.clone());
                }
            }
        }

        let name = names.join(", ");
        let definition = concept.definitions.first().cloned().unwrap_or_default();
        match matches.len() {
            0 => candidates.push(LanguageCandidate {
                concept: id,
                name,
                entity: None,
                definition,
                description: String::new(),
                kind: LanguageMatchKind::Unmatched,
            }),
            1 => {
                let entity = matches.into_iter().next();
                let description = match &entity {
                    Some(e) => knowledge.description(e)?,
                    None => String::new(),
                };
                candidates.push(LanguageCandidate {
                    concept: id,
                    name,
                    entity,
                    definition,
                    description,
                    kind: LanguageMatchKind::Exact,
                });
            }
            _ => {
                for entity in matches {
                    let description = knowledge.description(&entity)?;
                    candidates.push(LanguageCandidate {
                        concept: id.clone(),
                        name: name.clone(),
                        entity: Some(entity),
                        definition: definition.clone(),
                        description,
                        kind: LanguageMatchKind::Multiple,
                    });
                }
            }
        }
    }
    Ok(candidates)
}

/// All hyponyms below the natural-language root, sorted by id.
fn language_subtree(store: &TaxonomyStore) -> Vec<ConceptId> {
    let root = ConceptId::new(NATURAL_LANGUAGE_SYNSET);
    let mut visited = HashSet::new();
    let mut stack = vec![root];
    let mut subtree = Vec::new();
    while let Some(id) = stack.pop() {
        if !visited.insert(id.clone()) {
            continue;
        }
        for kind in [RelKind::Hypernym, RelKind::InstanceHypernym] {
            for child in store.children_by_relation(&id, kind) {
                if !visited.contains(&child) {
                    subtree.push(child.clone());
                    stack.push(child);
                }
            }
        }
    }
    subtree.sort();
    subtree.dedup();
    subtree
}

fn name_members(concept: &crate::graph::Concept) -> impl Iterator<Item = &str> {
    concept
        .members
        .iter()
        .map(String::as_str)
        .filter(|m| m.chars().any(|c| c.is_uppercase()))
}

fn is_language<K: KnowledgeService>(knowledge: &K, entity: &EntityId) -> SourceResult<bool> {
    let properties = knowledge.properties(entity)?;
    Ok(properties
        .get(INSTANCE_OF)
        .into_iter()
        .flatten()
        .any(|class| LANGUAGE_CLASSES.contains(&class.as_str())))
}

/// Write language candidates as a review CSV.
pub fn write_language_candidates(
    writer: impl Write,
    candidates: &[LanguageCandidate],
) -> SourceResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record([
        "Language",
        "WordNet SSID",
        "Wikidata QID",
        "WordNet Definition",
        "Wikidata Definition",
        "Type",
    ])?;
    for candidate in candidates {
        writer.write_record([
            candidate.name.as_str(),
            candidate.concept.as_str(),
            candidate.entity.as_ref().map(EntityId::as_str).unwrap_or(""),
            candidate.definition.as_str(),
            candidate.description.as_str(),
            candidate.kind.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
