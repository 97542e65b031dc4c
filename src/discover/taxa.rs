//! Taxon anchor discovery
//!
//! Proposes (synset, entity) alignment candidates for manual review by
//! matching rank-bearing wordnet lemmas ("genus Vulpes") against the
//! scientific names in the knowledge base. Exact name matches under the
//! same rank come first; the fuzzy index catches spelling variants; a
//! lemma with no match at all still gets a row so curators see the gap.

use crate::graph::{ConceptId, EntityId, TaxonomyStore};
use crate::index::NameIndex;
use crate::source::SourceResult;
use std::io::Write;

/// Ranks whose lemmas are harvested from the curated files.
pub const DISCOVERY_RANKS: &[&str] = &["genus", "family", "order", "class", "phylum", "kingdom"];

/// Split a lemma of the form "<rank> <Name>" into its parts. The name
/// must be a single capitalized word.
pub fn rank_lemma(lemma: &str) -> Option<(&'static str, &str)> {
    for rank in DISCOVERY_RANKS {
        let Some(name) = lemma.strip_prefix(rank).and_then(|rest| rest.strip_prefix(' ')) else {
            continue;
        };
        if !name.is_empty()
            && !name.contains(' ')
            && name.chars().next().is_some_and(|c| c.is_uppercase())
        {
            return Some((*rank, name));
        }
    }
    None
}

/// How a candidate row was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Single entity under the same rank and name
    Exact,
    /// Several entities share the rank and name
    Conflict,
    /// Found through the fuzzy index only
    Similar,
    /// Nothing in the knowledge base, surfaced for completeness
    NoMatch,
}

impl MatchKind {
    pub fn as_str(&self) -> &str {
        match self {
            MatchKind::Exact => "Exact",
            MatchKind::Conflict => "Conflict",
            MatchKind::Similar => "Similar",
            MatchKind::NoMatch => "No match",
        }
    }
}

/// One proposed alignment between a rank-bearing lemma and entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMatch {
    pub rank: String,
    pub name: String,
    pub concept: ConceptId,
    pub matched_name: String,
    pub entities: Vec<EntityId>,
    pub kind: MatchKind,
}

/// Match every rank-bearing lemma in the store against the indexed
/// scientific names, in concept-id order.
pub fn discover_anchors(store: &TaxonomyStore, index: &NameIndex) -> Vec<CandidateMatch> {
    let mut candidates = Vec::new();
    for concept in store.iter_sorted() {
        for member in &concept.members {
            let Some((rank, name)) = rank_lemma(member) else {
                continue;
            };
            let matches = index.lookup(name);
            let exact: Vec<_> = matches
                .iter()
                .filter(|entry| entry.category == rank && entry.name.eq_ignore_ascii_case(name))
                .collect();

            if !exact.is_empty() {
                let unique = exact.len() == 1 && exact[0].ids.len() == 1;
                for entry in exact {
                    candidates.push(CandidateMatch {
                        rank: rank.to_string(),
                        name: name.to_string(),
                        concept: concept.id.clone(),
                        matched_name: entry.name.clone(),
                        entities: entry.ids.clone(),
                        kind: if unique {
                            MatchKind::Exact
                        } else {
                            MatchKind::Conflict
                        },
                    });
                }
            } else if !matches.is_empty() {
                for entry in matches {
                    candidates.push(CandidateMatch {
                        rank: rank.to_string(),
                        name: name.to_string(),
                        concept: concept.id.clone(),
                        matched_name: entry.name.clone(),
                        entities: entry.ids.clone(),
                        kind: MatchKind::Similar,
                    });
                }
            } else {
                candidates.push(CandidateMatch {
                    rank: rank.to_string(),
                    name: name.to_string(),
                    concept: concept.id.clone(),
                    matched_name: String::new(),
                    entities: Vec::new(),
                    kind: MatchKind::NoMatch,
                });
            }
        }
    }
    candidates
}

/// Write candidate rows as a review CSV.
pub fn write_taxon_candidates(
    writer: impl Write,
    candidates: &[CandidateMatch],
) -> SourceResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["Rank", "Lemma", "SSID", "Matched Name", "Wikidata", "Type"])?;
    for candidate in candidates {
        let entities = candidate
            .entities
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        writer.write_record([
            candidate.rank.as_str(),
            candidate.name.as_str(),
            candidate.concept.as_str(),
            candidate.matched_name.as_str(),
            &entities,
            candidate.kind.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Concept;

    fn id(s: &str) -> ConceptId {
        ConceptId::new(s)
    }

    fn entity(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn test_rank_lemma() {
        assert_eq!(rank_lemma("genus Vulpes"), Some(("genus", "Vulpes")));
        assert_eq!(rank_lemma("family Canidae"), Some(("family", "Canidae")));
        assert_eq!(rank_lemma("genus vulpes"), None);
        assert_eq!(rank_lemma("genus Vulpes vulpes"), None);
        assert_eq!(rank_lemma("Vulpes"), None);
        assert_eq!(rank_lemma("genus"), None);
    }

    fn store_with_lemma(lemma: &str) -> TaxonomyStore {
        let mut store = TaxonomyStore::new();
        store.put(Concept::new(id("02083346-n")).with_member(lemma));
        store
    }

    #[test]
    fn test_exact_match() {
        let store = store_with_lemma("genus Vulpes");
        let mut index = NameIndex::new();
        index.insert("genus", "Vulpes", vec![entity("Q59495")]);

        let candidates = discover_anchors(&store, &index);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, MatchKind::Exact);
        assert_eq!(candidates[0].entities, vec![entity("Q59495")]);
    }

    #[test]
    fn test_shared_name_is_a_conflict() {
        let store = store_with_lemma("genus Vulpes");
        let mut index = NameIndex::new();
        index.insert("genus", "Vulpes", vec![entity("Q1"), entity("Q2")]);

        let candidates = discover_anchors(&store, &index);
        assert_eq!(candidates[0].kind, MatchKind::Conflict);
    }

    #[test]
    fn test_fuzzy_fallback_is_similar() {
        let store = store_with_lemma("genus Bombycila");
        let mut index = NameIndex::new();
        index.insert("genus", "Bombycilla", vec![entity("Q26617")]);

        let candidates = discover_anchors(&store, &index);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, MatchKind::Similar);
        assert_eq!(candidates[0].matched_name, "Bombycilla");
    }

    #[test]
    fn test_unmatched_lemma_still_gets_a_row() {
        let store = store_with_lemma("genus Orphanus");
        let candidates = discover_anchors(&store, &NameIndex::new());
        assert_eq!(candidates[0].kind, MatchKind::NoMatch);
        assert!(candidates[0].entities.is_empty());
    }

    #[test]
    fn test_candidate_csv_shape() {
        let candidates = vec![CandidateMatch {
            rank: "genus".into(),
            name: "Vulpes".into(),
            concept: id("02083346-n"),
            matched_name: "Vulpes".into(),
            entities: vec![entity("Q59495")],
            kind: MatchKind::Exact,
        }];
        let mut out = Vec::new();
        write_taxon_candidates(&mut out, &candidates).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Rank,Lemma,SSID,Matched Name,Wikidata,Type"));
        assert!(text.contains("genus,Vulpes,02083346-n,Vulpes,Q59495,Exact"));
    }
}
