//! Emission sinks
//!
//! The merge engine pushes every synthesized or updated concept through a
//! sink, one record per mutation, in processing order. Sinks own the
//! serialization format; `YamlSink` writes the curated-file shape,
//! `MemorySink` collects records for tests. Conflict records bypass the
//! concept sink and go to a `ConflictWriter`.

use crate::graph::{Concept, ExternalLink};
use crate::merge::ConflictRecord;
use crate::source::SourceResult;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Where merged and synthesized concepts are emitted.
pub trait EmissionSink {
    fn emit(&mut self, concept: &Concept) -> SourceResult<()>;
}

/// Collects emitted concepts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<Concept>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EmissionSink for MemorySink {
    fn emit(&mut self, concept: &Concept) -> SourceResult<()> {
        self.records.push(concept.clone());
        Ok(())
    }
}

#[derive(Serialize)]
struct EmittedRecord<'a> {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    definition: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hypernym: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    instance_hypernym: Vec<&'a str>,
    members: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    mero_member: Vec<&'a str>,
    #[serde(rename = "partOfSpeech")]
    part_of_speech: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    wikidata: Option<&'a ExternalLink>,
}

/// Writes one YAML mapping per emitted concept, keyed by concept id.
/// Relation and member sets are already ordered, so output is stable.
pub struct YamlSink<W: Write> {
    writer: W,
}

impl<W: Write> YamlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EmissionSink for YamlSink<W> {
    fn emit(&mut self, concept: &Concept) -> SourceResult<()> {
        let record = EmittedRecord {
            definition: concept.definitions.iter().map(String::as_str).collect(),
            hypernym: concept.hypernyms.iter().map(|id| id.as_str()).collect(),
            instance_hypernym: concept
                .instance_hypernyms
                .iter()
                .map(|id| id.as_str())
                .collect(),
            members: concept.members.iter().map(String::as_str).collect(),
            mero_member: concept.mero_members.iter().map(|id| id.as_str()).collect(),
            part_of_speech: "n",
            wikidata: concept.external.as_ref(),
        };
        let document = BTreeMap::from([(concept.id.as_str(), record)]);
        serde_yaml::to_writer(&mut self.writer, &document)?;
        Ok(())
    }
}

/// CSV writer for external-link conflicts awaiting manual decision.
pub struct ConflictWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ConflictWriter<W> {
    pub fn new(writer: W) -> SourceResult<Self> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(["SSID", "Existing QID", "New QID"])?;
        Ok(Self { writer })
    }

    pub fn write(&mut self, conflict: &ConflictRecord) -> SourceResult<()> {
        let existing = conflict
            .existing
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        self.writer.write_record([
            conflict.concept.as_str(),
            &existing,
            conflict.incoming.as_str(),
        ])?;
        Ok(())
    }

    pub fn flush(&mut self) -> SourceResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
