//! Candidate discovery for the manual-review ledgers
//!
//! The alignment passes only act on reviewed links; these operations
//! generate the CSVs that reviewers fill in. Each submodule proposes one
//! kind of candidate: taxon anchors from rank-bearing lemmas, class
//! overlaps from instance counts, and language alignments from shared
//! names.

mod languages;
mod overlaps;
mod taxa;

pub use languages::{
    align_languages, write_language_candidates, LanguageCandidate, LanguageMatchKind,
    LANGUAGE_CLASSES, NATURAL_LANGUAGE_SYNSET,
};
pub use overlaps::{
    count_overlaps, write_overlap_candidates, OverlapCandidate, IGNORED_HYPERNYMS,
};
pub use taxa::{
    discover_anchors, rank_lemma, write_taxon_candidates, CandidateMatch, MatchKind,
    DISCOVERY_RANKS,
};
