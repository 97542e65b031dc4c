//! External source services: the curated lexicon, the knowledge base,
//! and the manual-review ledgers.
//!
//! The core consumes these through traits; concrete adapters live in the
//! submodules (`sqlite` for the knowledge base, `yaml` for the lexicon,
//! `ledger` for review spreadsheets). `MemoryKnowledge` backs tests.

mod ledger;
mod memory;
mod sqlite;
mod yaml;

pub use ledger::{
    load_concept_pairs, load_taxon_anchors, parse_entity_ref, parse_synset_ref, ReviewLedger,
};
pub use memory::MemoryKnowledge;
pub use sqlite::SqliteKnowledge;
pub use yaml::YamlLexicalSource;

use crate::graph::{Concept, EntityId};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Errors that can occur while reading external sources or writing sinks
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing column in review ledger: {0}")]
    MissingColumn(String),
}

/// Result type for source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Entity-valued properties of an external entity, keyed by property code.
pub type PropertyMap = BTreeMap<String, Vec<EntityId>>;

/// Literal-valued properties (scientific names, dates) keyed by property
/// code. Each value is a tuple of literal fields, matching the extractor's
/// output layout.
pub type DataPropertyMap = BTreeMap<String, Vec<Vec<String>>>;

/// Read access to the external knowledge base.
///
/// Absence of data is expected and common at this scale; lookups for
/// unknown entities return empty maps/strings, never an error.
pub trait KnowledgeService {
    /// Entity-valued properties of `entity` (e.g. "subclass of" targets).
    fn properties(&self, entity: &EntityId) -> SourceResult<PropertyMap>;

    /// Literal-valued properties of `entity` (e.g. scientific name).
    fn data_properties(&self, entity: &EntityId) -> SourceResult<DataPropertyMap>;

    /// Labels (preferred name plus aliases) of `entity`.
    fn labels(&self, entity: &EntityId) -> SourceResult<Vec<String>>;

    /// Short description of `entity`, empty when unknown.
    fn description(&self, entity: &EntityId) -> SourceResult<String>;

    /// Bulk reverse lookup: every entity holding `code` with one of
    /// `values`, grouped per value. Returns value → entity → full value
    /// list of that property. Used instead of per-entity scans.
    fn entities_with_value(
        &self,
        code: &str,
        values: &BTreeSet<EntityId>,
    ) -> SourceResult<BTreeMap<EntityId, BTreeMap<EntityId, Vec<EntityId>>>>;

    /// Bulk reverse label lookup: every entity whose label matches one of
    /// `labels` case-insensitively, grouped per label. Keys of `labels`
    /// and of the result are lowercase.
    fn entities_with_label(
        &self,
        labels: &BTreeSet<String>,
    ) -> SourceResult<BTreeMap<String, Vec<EntityId>>>;
}

/// One-shot bulk load of the curated taxonomy.
pub trait LexicalSource {
    fn load_all(&self) -> SourceResult<Vec<Concept>>;
}
