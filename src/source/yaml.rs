//! YAML lexical source
//!
//! Loads the curated taxonomy from a directory of lexicographer files,
//! one YAML mapping of synset id → entry per file.

use super::{LexicalSource, SourceResult};
use crate::graph::{Concept, ConceptId, ExternalLink};
use serde::Deserialize;
use std::fs::File;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RawSynset {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    definition: Vec<String>,
    #[serde(default)]
    hypernym: Vec<String>,
    #[serde(default)]
    instance_hypernym: Vec<String>,
    #[serde(default)]
    mero_member: Vec<String>,
    // String or list of strings in the curated files
    #[serde(default)]
    wikidata: Option<ExternalLink>,
}

impl RawSynset {
    fn into_concept(self, id: ConceptId) -> Concept {
        let mut concept = Concept::new(id);
        concept.members = self.members.into_iter().collect();
        concept.definitions = self.definition;
        concept.hypernyms = self.hypernym.into_iter().map(ConceptId::new).collect();
        concept.instance_hypernyms = self
            .instance_hypernym
            .into_iter()
            .map(ConceptId::new)
            .collect();
        concept.mero_members = self.mero_member.into_iter().map(ConceptId::new).collect();
        concept.external = self.wikidata;
        concept
    }
}

/// Lexical source over a directory of `*.yaml` lexicographer files.
pub struct YamlLexicalSource {
    root: PathBuf,
}

impl YamlLexicalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LexicalSource for YamlLexicalSource {
    fn load_all(&self) -> SourceResult<Vec<Concept>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(&self.root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "yaml"))
            .collect();
        paths.sort();

        let mut concepts = Vec::new();
        for path in paths {
            debug!(path = %path.display(), "loading lexicographer file");
            let file = File::open(&path)?;
            let entries: std::collections::BTreeMap<String, RawSynset> =
                serde_yaml::from_reader(file)?;
            for (id, raw) in entries {
                concepts.push(raw.into_concept(ConceptId::new(id)));
            }
        }
        Ok(concepts)
    }
}
