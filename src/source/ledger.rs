//! Manual-review ledgers
//!
//! Curators record alignment decisions in spreadsheets; accepted rows are
//! authoritative overrides to automatic alignment, rejected or absent
//! rows mean "no decision yet". Identifier validation happens here, at
//! the parsing boundary — the core assumes well-formed ids.

use super::{SourceError, SourceResult};
use crate::graph::{ConceptId, EntityId};
use crate::resolve::{Anchor, AnchorMap};
use std::collections::BTreeMap;
use std::io::Read;
use tracing::warn;

/// Extract a synset id from a reference string (bare id or URL suffix).
///
/// The shape is eight digits, a hyphen and a part-of-speech letter, e.g.
/// `02084071-n`. Anything else is rejected.
pub fn parse_synset_ref(s: &str) -> Option<ConceptId> {
    let s = s.trim();
    let chars: Vec<char> = s.chars().collect();
    if chars.len() < 10 {
        return None;
    }
    let tail = &chars[chars.len() - 10..];
    let digits_ok = tail[..8].iter().all(|c| c.is_ascii_digit());
    if digits_ok && tail[8] == '-' && matches!(tail[9], 'n' | 'v' | 'a' | 'r') {
        Some(ConceptId::new(tail.iter().collect::<String>()))
    } else {
        None
    }
}

/// Extract a knowledge-base entity id from a reference string (bare QID
/// or URL containing one).
pub fn parse_entity_ref(s: &str) -> Option<EntityId> {
    let (_, digits) = s.rsplit_once('Q')?;
    let digits = digits.trim();
    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(EntityId::new(format!("Q{digits}")))
    } else {
        None
    }
}

/// A loaded review ledger: accepted (entity, concept) decisions.
#[derive(Debug, Default)]
pub struct ReviewLedger {
    accepted: BTreeMap<EntityId, Vec<ConceptId>>,
}

impl ReviewLedger {
    /// Load a ledger from CSV. Rows are kept when the accept column reads
    /// `TRUE` (case-insensitive); when `accept_column` is `None` every
    /// parseable row counts as accepted. Rows with malformed identifiers
    /// are logged and dropped.
    pub fn from_reader(
        reader: impl Read,
        entity_column: &str,
        concept_column: &str,
        accept_column: Option<&str>,
    ) -> SourceResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader.headers()?.clone();
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| SourceError::MissingColumn(name.to_string()))
        };
        let entity_idx = find(entity_column)?;
        let concept_idx = find(concept_column)?;
        let accept_idx = accept_column.map(find).transpose()?;

        let mut accepted: BTreeMap<EntityId, Vec<ConceptId>> = BTreeMap::new();
        for record in csv_reader.records() {
            let record = record?;
            if let Some(idx) = accept_idx {
                let accept = record.get(idx).unwrap_or("");
                if !accept.trim().eq_ignore_ascii_case("true") {
                    continue;
                }
            }
            let entity_ref = record.get(entity_idx).unwrap_or("");
            let concept_ref = record.get(concept_idx).unwrap_or("");
            match (parse_entity_ref(entity_ref), parse_synset_ref(concept_ref)) {
                (Some(entity), Some(concept)) => {
                    let targets = accepted.entry(entity).or_default();
                    if !targets.contains(&concept) {
                        targets.push(concept);
                    }
                }
                _ => {
                    warn!(entity_ref, concept_ref, "malformed identifier in review ledger");
                }
            }
        }
        Ok(Self { accepted })
    }

    pub fn accepted(&self) -> &BTreeMap<EntityId, Vec<ConceptId>> {
        &self.accepted
    }

    pub fn targets(&self, entity: &EntityId) -> &[ConceptId] {
        self.accepted.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Load reviewed taxon anchors into an `AnchorMap`.
///
/// Expected columns: `Wikidata` (comma-separated entity refs), `SSID`,
/// `Lemma` (rank-bearing lemma, e.g. "genus Abies"; the first token is
/// taken as the anchor's rank).
pub fn load_taxon_anchors(reader: impl Read) -> SourceResult<AnchorMap> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SourceError::MissingColumn(name.to_string()))
    };
    let entity_idx = find("Wikidata")?;
    let concept_idx = find("SSID")?;
    let lemma_idx = find("Lemma")?;

    let mut anchors = AnchorMap::new();
    for record in csv_reader.records() {
        let record = record?;
        let Some(concept) = parse_synset_ref(record.get(concept_idx).unwrap_or("")) else {
            continue;
        };
        let rank = record
            .get(lemma_idx)
            .and_then(|lemma| lemma.split_whitespace().next())
            .map(|token| token.to_lowercase());
        for entity_ref in record.get(entity_idx).unwrap_or("").split(',') {
            if let Some(entity) = parse_entity_ref(entity_ref) {
                anchors.insert(
                    entity,
                    Anchor {
                        concept: concept.clone(),
                        rank: rank.clone(),
                    },
                );
            }
        }
    }
    Ok(anchors)
}

/// Load accepted concept pairs (e.g. taxon synset → common-name synset).
pub fn load_concept_pairs(
    reader: impl Read,
    left_column: &str,
    right_column: &str,
) -> SourceResult<Vec<(ConceptId, ConceptId)>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SourceError::MissingColumn(name.to_string()))
    };
    let left_idx = find(left_column)?;
    let right_idx = find(right_column)?;
    let accept_idx = headers.iter().position(|h| h == "Accept");

    let mut pairs = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        if let Some(idx) = accept_idx {
            if !record.get(idx).unwrap_or("").trim().eq_ignore_ascii_case("true") {
                continue;
            }
        }
        if let (Some(left), Some(right)) = (
            parse_synset_ref(record.get(left_idx).unwrap_or("")),
            parse_synset_ref(record.get(right_idx).unwrap_or("")),
        ) {
            pairs.push((left, right));
        }
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_synset_ref() {
        assert_eq!(
            parse_synset_ref("02084071-n"),
            Some(ConceptId::new("02084071-n"))
        );
        assert_eq!(
            parse_synset_ref("https://en-word.net/id/oewn-02084071-n"),
            Some(ConceptId::new("02084071-n"))
        );
        assert_eq!(parse_synset_ref("02084071-x"), None);
        assert_eq!(parse_synset_ref("0208-n"), None);
        assert_eq!(parse_synset_ref(""), None);
    }

    #[test]
    fn test_parse_entity_ref() {
        assert_eq!(parse_entity_ref("Q144"), Some(EntityId::new("Q144")));
        assert_eq!(
            parse_entity_ref("https://www.wikidata.org/entity/Q144"),
            Some(EntityId::new("Q144"))
        );
        assert_eq!(parse_entity_ref("P31"), None);
        assert_eq!(parse_entity_ref("Qabc"), None);
    }

    #[test]
    fn test_ledger_accept_filter() {
        let csv = "\
QID,SSID,Accept
https://www.wikidata.org/entity/Q144,02084071-n,TRUE
https://www.wikidata.org/entity/Q146,02121620-n,FALSE
not-an-id,02084071-n,TRUE
";
        let ledger =
            ReviewLedger::from_reader(csv.as_bytes(), "QID", "SSID", Some("Accept")).unwrap();
        assert_eq!(ledger.accepted().len(), 1);
        assert_eq!(
            ledger.targets(&EntityId::new("Q144")),
            &[ConceptId::new("02084071-n")]
        );
    }

    #[test]
    fn test_ledger_without_accept_column() {
        let csv = "\
QID,Linked
Q100,09647338-n
Q100,09642198-n
";
        let ledger = ReviewLedger::from_reader(csv.as_bytes(), "QID", "Linked", None).unwrap();
        assert_eq!(ledger.targets(&EntityId::new("Q100")).len(), 2);
    }

    #[test]
    fn test_load_taxon_anchors() {
        let csv = "\
SSID,Lemma,Wikidata
02083346-n,genus Canis,\"Q25324, Q149892\"
";
        let anchors = load_taxon_anchors(csv.as_bytes()).unwrap();
        let found = anchors.get(&EntityId::new("Q25324")).unwrap();
        assert_eq!(found[0].concept, ConceptId::new("02083346-n"));
        assert_eq!(found[0].rank.as_deref(), Some("genus"));
        assert!(anchors.get(&EntityId::new("Q149892")).is_some());
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let csv = "A,B\n1,2\n";
        let err = ReviewLedger::from_reader(csv.as_bytes(), "QID", "SSID", None).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn(_)));
    }
}
