//! Lexweave: Taxonomy Alignment Engine
//!
//! Merges a curated lexical taxonomy with an external knowledge base.
//! Entities are placed under the most specific concepts they belong to,
//! guided by manual-review ledgers; everything the engine cannot decide
//! safely is surfaced as a conflict for curators instead of guessed at.
//!
//! # Core Concepts
//!
//! - **Concepts**: synsets with members, definitions and typed relations
//! - **Closure**: the transitive ancestor table used to prune redundant
//!   placements down to the most specific ones
//! - **Passes**: batch alignment sweeps (overlaps, humans, taxa) that
//!   fold knowledge-base entities into the store
//!
//! # Example
//!
//! ```
//! use lexweave::{Pipeline, TaxonomyStore};
//! use lexweave::source::MemoryKnowledge;
//!
//! let pipeline = Pipeline::new(TaxonomyStore::new(), MemoryKnowledge::new());
//! assert!(pipeline.store().is_empty());
//! ```

pub mod cache;
pub mod discover;
pub mod graph;
pub mod index;
pub mod merge;
pub mod pipeline;
pub mod resolve;
pub mod sink;
pub mod source;

pub use graph::{
    most_specific, ClosureTable, Concept, ConceptId, EntityId, ExternalLink, RelKind,
    TaxonomyStore,
};
pub use merge::{ConflictRecord, MergeEngine, MergeOutcome, Observation};
pub use pipeline::{Pipeline, RunReport};
pub use resolve::{Anchor, AnchorMap, Resolver};
pub use sink::{ConflictWriter, EmissionSink, MemorySink, YamlSink};
pub use source::{KnowledgeService, LexicalSource, SourceError, SourceResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
