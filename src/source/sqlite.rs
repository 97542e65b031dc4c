//! SQLite-backed knowledge service
//!
//! Reads the four-table layout produced by the dump extractor:
//! `properties` and `data_properties` hold JSON maps keyed by property
//! code, `labels_en` holds a JSON array of names, `descriptions_en` a
//! plain string. Missing rows are normal and yield empty results.

use super::{DataPropertyMap, KnowledgeService, PropertyMap, SourceResult};
use crate::graph::EntityId;
use rusqlite::{Connection, OptionalExtension};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;

pub struct SqliteKnowledge {
    conn: Connection,
}

impl SqliteKnowledge {
    pub fn open(path: impl AsRef<Path>) -> SourceResult<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> SourceResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    fn fetch_json_column(&self, table: &str, column: &str, entity: &EntityId) -> SourceResult<Option<String>> {
        let sql = format!("SELECT {column} FROM {table} WHERE qid = ?1");
        let row = self
            .conn
            .query_row(&sql, [entity.as_str()], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(row)
    }
}

impl KnowledgeService for SqliteKnowledge {
    fn properties(&self, entity: &EntityId) -> SourceResult<PropertyMap> {
        match self.fetch_json_column("properties", "properties", entity)? {
            Some(json) => {
                let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(&json)?;
                Ok(raw
                    .into_iter()
                    .map(|(code, targets)| {
                        (code, targets.into_iter().map(EntityId::new).collect())
                    })
                    .collect())
            }
            None => {
                debug!(entity = %entity, "no property record");
                Ok(PropertyMap::new())
            }
        }
    }

    fn data_properties(&self, entity: &EntityId) -> SourceResult<DataPropertyMap> {
        match self.fetch_json_column("data_properties", "data_properties", entity)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => {
                debug!(entity = %entity, "no data-property record");
                Ok(DataPropertyMap::new())
            }
        }
    }

    fn labels(&self, entity: &EntityId) -> SourceResult<Vec<String>> {
        match self.fetch_json_column("labels_en", "label", entity)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn description(&self, entity: &EntityId) -> SourceResult<String> {
        Ok(self
            .fetch_json_column("descriptions_en", "description", entity)?
            .unwrap_or_default())
    }

    fn entities_with_value(
        &self,
        code: &str,
        values: &BTreeSet<EntityId>,
    ) -> SourceResult<BTreeMap<EntityId, BTreeMap<EntityId, Vec<EntityId>>>> {
        // Single scan over the property table, grouping matches per
        // target value. Far cheaper than one query per entity.
        let mut results: BTreeMap<EntityId, BTreeMap<EntityId, Vec<EntityId>>> = BTreeMap::new();
        let mut stmt = self.conn.prepare("SELECT qid, properties FROM properties")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let qid: String = row.get(0)?;
            let json: String = row.get(1)?;
            let raw: BTreeMap<String, Vec<String>> = match serde_json::from_str(&json) {
                Ok(raw) => raw,
                Err(err) => {
                    debug!(%qid, %err, "unparseable property record");
                    continue;
                }
            };
            if let Some(targets) = raw.get(code) {
                let targets: Vec<EntityId> =
                    targets.iter().map(|t| EntityId::new(t.clone())).collect();
                for target in &targets {
                    if values.contains(target) {
                        results
                            .entry(target.clone())
                            .or_default()
                            .insert(EntityId::new(qid.clone()), targets.clone());
                    }
                }
            }
        }
        Ok(results)
    }

    fn entities_with_label(
        &self,
        labels: &BTreeSet<String>,
    ) -> SourceResult<BTreeMap<String, Vec<EntityId>>> {
        let mut results: BTreeMap<String, Vec<EntityId>> = BTreeMap::new();
        let mut stmt = self.conn.prepare("SELECT qid, label FROM labels_en")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let qid: String = row.get(0)?;
            let json: String = row.get(1)?;
            let names: Vec<String> = match serde_json::from_str(&json) {
                Ok(names) => names,
                Err(err) => {
                    debug!(%qid, %err, "unparseable label record");
                    continue;
                }
            };
            for name in names {
                let lowered = name.to_lowercase();
                if labels.contains(&lowered) {
                    results.entry(lowered).or_default().push(EntityId::new(qid.clone()));
                }
            }
        }
        for entities in results.values_mut() {
            entities.sort();
            entities.dedup();
        }
        Ok(results)
    }
}
