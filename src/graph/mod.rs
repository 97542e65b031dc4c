//! Core taxonomy data structures

mod closure;
mod concept;
mod reduce;
mod store;

pub use closure::ClosureTable;
pub use concept::{Concept, ConceptId, EntityId, ExternalLink, RelKind};
pub use reduce::most_specific;
pub use store::TaxonomyStore;
