//! In-memory knowledge service for tests and small fixtures

use super::{DataPropertyMap, KnowledgeService, PropertyMap, SourceResult};
use crate::graph::EntityId;
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Default, Clone)]
struct MemoryEntity {
    labels: Vec<String>,
    description: String,
    properties: PropertyMap,
    data_properties: DataPropertyMap,
}

/// A `KnowledgeService` backed by plain maps.
#[derive(Debug, Default)]
pub struct MemoryKnowledge {
    entities: HashMap<EntityId, MemoryEntity>,
}

impl MemoryKnowledge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_labels(&mut self, entity: EntityId, labels: &[&str]) {
        self.entities.entry(entity).or_default().labels =
            labels.iter().map(|l| l.to_string()).collect();
    }

    pub fn set_description(&mut self, entity: EntityId, description: impl Into<String>) {
        self.entities.entry(entity).or_default().description = description.into();
    }

    pub fn add_property(&mut self, entity: EntityId, code: &str, targets: &[EntityId]) {
        self.entities
            .entry(entity)
            .or_default()
            .properties
            .entry(code.to_string())
            .or_default()
            .extend(targets.iter().cloned());
    }

    pub fn add_data_property(&mut self, entity: EntityId, code: &str, value: &[&str]) {
        self.entities
            .entry(entity)
            .or_default()
            .data_properties
            .entry(code.to_string())
            .or_default()
            .push(value.iter().map(|v| v.to_string()).collect());
    }
}

impl KnowledgeService for MemoryKnowledge {
    fn properties(&self, entity: &EntityId) -> SourceResult<PropertyMap> {
        Ok(self
            .entities
            .get(entity)
            .map(|e| e.properties.clone())
            .unwrap_or_default())
    }

    fn data_properties(&self, entity: &EntityId) -> SourceResult<DataPropertyMap> {
        Ok(self
            .entities
            .get(entity)
            .map(|e| e.data_properties.clone())
            .unwrap_or_default())
    }

    fn labels(&self, entity: &EntityId) -> SourceResult<Vec<String>> {
        Ok(self
            .entities
            .get(entity)
            .map(|e| e.labels.clone())
            .unwrap_or_default())
    }

    fn description(&self, entity: &EntityId) -> SourceResult<String> {
        Ok(self
            .entities
            .get(entity)
            .map(|e| e.description.clone())
            .unwrap_or_default())
    }

    fn entities_with_value(
        &self,
        code: &str,
        values: &BTreeSet<EntityId>,
    ) -> SourceResult<BTreeMap<EntityId, BTreeMap<EntityId, Vec<EntityId>>>> {
        let mut results: BTreeMap<EntityId, BTreeMap<EntityId, Vec<EntityId>>> = BTreeMap::new();
        for (id, entity) in &self.entities {
            if let Some(targets) = entity.properties.get(code) {
                for target in targets {
                    if values.contains(target) {
                        results
                            .entry(target.clone())
                            .or_default()
                            .insert(id.clone(), targets.clone());
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
        for (id, entity) in &self.entities {
            for label in &entity.labels {
                let lowered = label.to_lowercase();
                if labels.contains(&lowered) {
                    results.entry(lowered).or_default().push(id.clone());
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
