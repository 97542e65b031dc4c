//! Class-overlap candidate discovery
//!
//! Finds knowledge-base classes whose instances keep landing under the
//! same synset: for every linked entity, each of its classes is paired
//! with the direct hypernyms of the linked synset, and pairs seen often
//! enough become (class, synset) review candidates. Hypernyms too close
//! to the root pair with everything and are skipped.

use crate::graph::{ConceptId, EntityId, TaxonomyStore};
use crate::pipeline::{INSTANCE_OF, SUBCLASS_OF};
use crate::source::{KnowledgeService, SourceResult};
use std::collections::BTreeMap;
use std::io::Write;

/// Hypernyms near the top of the taxonomy (entity, abstraction, object,
/// whole, ...). Pairs through them carry no signal.
pub const IGNORED_HYPERNYMS: &[&str] = &[
    "00001740-n",
    "00001930-n",
    "00002452-n",
    "00002684-n",
    "00007347-n",
    "00021007-n",
    "00029976-n",
    "00002137-n",
    "04431553-n",
];

/// One proposed class-to-synset overlap, with the evidence count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapCandidate {
    pub class_entity: EntityId,
    pub hypernym: ConceptId,
    pub lemmas: String,
    pub labels: String,
    pub count: usize,
}

/// Count (class, hypernym) co-occurrences over every linked synset and
/// keep the pairs seen at least `min_count` times, most frequent first.
pub fn count_overlaps<K: KnowledgeService>(
    store: &TaxonomyStore,
    knowledge: &K,
    min_count: usize,
) -> SourceResult<Vec<OverlapCandidate>> {
    let mut counts: BTreeMap<(EntityId, ConceptId), usize> = BTreeMap::new();
    for concept in store.iter_sorted() {
        let Some(link) = &concept.external else {
            continue;
        };
        let hypernyms: Vec<&ConceptId> = concept
            .hypernyms
            .iter()
            .chain(concept.instance_hypernyms.iter())
            .filter(|h| !IGNORED_HYPERNYMS.contains(&h.as_str()))
            .collect();
        for entity in link.ids() {
            let properties = knowledge.properties(entity)?;
            let classes = properties
                .get(INSTANCE_OF)
                .into_iter()
                .chain(properties.get(SUBCLASS_OF))
                .flatten();
            for class in classes {
                for hypernym in &hypernyms {
                    *counts
                        .entry((class.clone(), (*hypernym).clone()))
                        .or_default() += 1;
                }
            }
        }
    }

    let mut pairs: Vec<((EntityId, ConceptId), usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut candidates = Vec::with_capacity(pairs.len());
    for ((class_entity, hypernym), count) in pairs {
        let labels = knowledge.labels(&class_entity)?;
        let labels = if labels.is_empty() {
            "NO LABELS".to_string()
        } else {
            labels
                .iter()
                .take(3)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        let lemmas = store
            .get(&hypernym)
            .map(|c| c.members.iter().map(String::as_str).collect::<Vec<_>>().join(", "))
            .unwrap_or_default();
        candidates.push(OverlapCandidate {
            class_entity,
            hypernym,
            lemmas,
            labels,
            count,
        });
    }
    Ok(candidates)
}

/// Write overlap candidates as a review CSV.
pub fn write_overlap_candidates(
    writer: impl Write,
    candidates: &[OverlapCandidate],
) -> SourceResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["QID", "SSID", "Wordnet Lemmas", "Wikidata Labels", "Count"])?;
    for candidate in candidates {
        writer.write_record([
            candidate.class_entity.as_str(),
            candidate.hypernym.as_str(),
            candidate.lemmas.as_str(),
            candidate.labels.as_str(),
            &candidate.count.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Concept, RelKind};
    use crate::source::MemoryKnowledge;

    fn id(s: &str) -> ConceptId {
        ConceptId::new(s)
    }

    fn entity(s: &str) -> EntityId {
        EntityId::new(s)
    }

    /// Three dog-breed synsets under "dog", each linked to an entity that
    /// is an instance of the breed class Q39367.
    fn breed_fixture() -> (TaxonomyStore, MemoryKnowledge) {
        let mut store = TaxonomyStore::new();
        store.put(Concept::new(id("02084071-n")).with_member("dog"));
        for (i, (ssid, qid)) in [
            ("02085374-n", "Q100"),
            ("02086079-n", "Q200"),
            ("02086346-n", "Q300"),
        ]
        .into_iter()
        .enumerate()
        {
            store.put(
                Concept::new(id(ssid))
                    .with_member(format!("breed{i}"))
                    .with_parent(RelKind::Hypernym, id("02084071-n"))
                    .with_external(entity(qid)),
            );
        }
        let mut knowledge = MemoryKnowledge::new();
        for qid in ["Q100", "Q200", "Q300"] {
            knowledge.add_property(entity(qid), INSTANCE_OF, &[entity("Q39367")]);
        }
        knowledge.set_labels(entity("Q39367"), &["dog breed", "breed", "canine breed", "dog type"]);
        (store, knowledge)
    }

    #[test]
    fn test_repeated_pair_becomes_a_candidate() {
        let (store, knowledge) = breed_fixture();
        let candidates = count_overlaps(&store, &knowledge, 3).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].class_entity, entity("Q39367"));
        assert_eq!(candidates[0].hypernym, id("02084071-n"));
        assert_eq!(candidates[0].count, 3);
        assert_eq!(candidates[0].lemmas, "dog");
        // Labels are capped at three
        assert_eq!(candidates[0].labels, "dog breed, breed, canine breed");
    }

    #[test]
    fn test_min_count_filters_rare_pairs() {
        let (store, knowledge) = breed_fixture();
        assert!(count_overlaps(&store, &knowledge, 4).unwrap().is_empty());
    }

    #[test]
    fn test_root_hypernyms_are_ignored() {
        let mut store = TaxonomyStore::new();
        store.put(
            Concept::new(id("09999999-n"))
                .with_parent(RelKind::Hypernym, id("00001740-n"))
                .with_external(entity("Q100")),
        );
        let mut knowledge = MemoryKnowledge::new();
        knowledge.add_property(entity("Q100"), INSTANCE_OF, &[entity("Q39367")]);

        assert!(count_overlaps(&store, &knowledge, 1).unwrap().is_empty());
    }

    #[test]
    fn test_unlabeled_class_is_flagged() {
        let mut store = TaxonomyStore::new();
        store.put(Concept::new(id("02084071-n")).with_member("dog"));
        store.put(
            Concept::new(id("02085374-n"))
                .with_parent(RelKind::Hypernym, id("02084071-n"))
                .with_external(entity("Q100")),
        );
        let mut knowledge = MemoryKnowledge::new();
        knowledge.add_property(entity("Q100"), SUBCLASS_OF, &[entity("Q39367")]);

        let candidates = count_overlaps(&store, &knowledge, 1).unwrap();
        assert_eq!(candidates[0].labels, "NO LABELS");
    }

    #[test]
    fn test_candidates_sorted_by_count_desc() {
        let (mut store, mut knowledge) = breed_fixture();
        store.put(Concept::new(id("02120997-n")).with_member("feline"));
        store.put(
            Concept::new(id("02121620-n"))
                .with_parent(RelKind::Hypernym, id("02120997-n"))
                .with_external(entity("Q400")),
        );
        knowledge.add_property(entity("Q400"), INSTANCE_OF, &[entity("Q43577")]);

        let candidates = count_overlaps(&store, &knowledge, 1).unwrap();
        assert_eq!(candidates[0].count, 3);
        assert_eq!(candidates[1].count, 1);
    }

    #[test]
    fn test_overlap_csv_shape() {
        let candidates = vec![OverlapCandidate {
            class_entity: entity("Q39367"),
            hypernym: id("02084071-n"),
            lemmas: "dog".into(),
            labels: "dog breed".into(),
            count: 7,
        }];
        let mut out = Vec::new();
        write_overlap_candidates(&mut out, &candidates).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("QID,SSID,Wordnet Lemmas,Wikidata Labels,Count"));
        assert!(text.contains("Q39367,02084071-n,dog,dog breed,7"));
    }
}
