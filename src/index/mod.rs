//! Fuzzy name index
//!
//! Approximate lookup over (category, name) pairs, e.g. taxonomic names
//! grouped by rank. Names are indexed under every lowercase 4-character
//! substring; lookup prefilters by shared 4-gram and then keeps entries
//! within edit distance 1 of the query. The prefilter keeps matching
//! near-linear in corpus size; exact label matching alone under-recalls
//! on spelling and transliteration variants.

use crate::graph::EntityId;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const GRAM_LEN: usize = 4;
const MAX_DISTANCE: usize = 1;

/// One indexed (category, name) pair with its associated entity ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub category: String,
    pub name: String,
    pub ids: Vec<EntityId>,
}

/// N-gram index over names.
#[derive(Debug, Default)]
pub struct NameIndex {
    entries: Vec<IndexEntry>,
    grams: HashMap<String, Vec<usize>>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a name. Names shorter than four characters are not indexed
    /// and can never be found.
    pub fn insert(&mut self, category: impl Into<String>, name: impl Into<String>, ids: Vec<EntityId>) {
        let name = name.into();
        let grams = ngrams(&name);
        if grams.is_empty() {
            return;
        }
        let idx = self.entries.len();
        self.entries.push(IndexEntry {
            category: category.into(),
            name,
            ids,
        });
        for gram in grams {
            self.grams.entry(gram).or_default().push(idx);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find indexed names within edit distance 1 of `query`,
    /// case-insensitive, deduplicated by matched name and sorted.
    pub fn lookup(&self, query: &str) -> Vec<&IndexEntry> {
        let query_lower = query.to_lowercase();
        let mut candidates = BTreeSet::new();
        for gram in ngrams(query) {
            if let Some(indexes) = self.grams.get(&gram) {
                candidates.extend(indexes.iter().copied());
            }
        }

        let mut by_name: BTreeMap<&str, &IndexEntry> = BTreeMap::new();
        for idx in candidates {
            let entry = &self.entries[idx];
            if strsim::levenshtein(&query_lower, &entry.name.to_lowercase()) <= MAX_DISTANCE {
                by_name.entry(entry.name.as_str()).or_insert(entry);
            }
        }
        by_name.into_values().collect()
    }
}

fn ngrams(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.to_lowercase().chars().collect();
    if chars.len() < GRAM_LEN {
        return Vec::new();
    }
    (0..=chars.len() - GRAM_LEN)
        .map(|i| chars[i..i + GRAM_LEN].iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_of(names: &[(&str, &str)]) -> NameIndex {
        let mut index = NameIndex::new();
        for (i, (category, name)) in names.iter().enumerate() {
            index.insert(*category, *name, vec![EntityId::new(format!("Q{i}"))]);
        }
        index
    }

    #[test]
    fn test_short_names_are_not_indexed() {
        let index = index_of(&[("genus", "cat")]);
        assert!(index.is_empty());
        assert!(index.lookup("cat").is_empty());
    }

    #[test]
    fn test_edit_distance_one_match() {
        let index = index_of(&[("genus", "sparrow")]);
        let matches = index.lookup("sparow");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "sparrow");

        let index = index_of(&[("genus", "sparow")]);
        let matches = index.lookup("sparrow");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "sparow");
    }

    #[test]
    fn test_distance_two_is_rejected() {
        let index = index_of(&[("genus", "sparrow")]);
        assert!(index.lookup("sparew").is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        let index = index_of(&[("genus", "Bombycilla")]);
        let matches = index.lookup("bombycilla");
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_deduplicated_by_matched_name() {
        // Same name indexed twice under different categories: one result
        let index = index_of(&[("genus", "lemmus"), ("subgenus", "lemmus")]);
        let matches = index.lookup("lemmus");
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_results_sorted_by_name() {
        let index = index_of(&[("genus", "lemmusb"), ("genus", "lemmusa")]);
        let names: Vec<&str> = index.lookup("lemmus").iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["lemmusa", "lemmusb"]);
    }

    #[test]
    fn test_no_shared_gram_no_match() {
        let index = index_of(&[("genus", "sparrow")]);
        assert!(index.lookup("warbler").is_empty());
    }
}
