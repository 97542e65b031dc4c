//! Alignment pipeline
//!
//! Three batch passes fold the external knowledge base into the taxonomy:
//! overlap-linked classes, human individuals, and taxa. Each pass
//! recomputes the ancestor closure before mutating the store (new edges
//! invalidate any previously computed closure) and runs every entity
//! through the merge engine. Bad or missing source data is counted, not
//! fatal; a run completes and reports.

use crate::cache::RunCache;
use crate::graph::{ClosureTable, ConceptId, EntityId, RelKind, TaxonomyStore};
use crate::merge::{ConflictRecord, MergeEngine, MergeOutcome, Observation};
use crate::resolve::{Anchor, AnchorMap, Resolver};
use crate::sink::EmissionSink;
use crate::source::{KnowledgeService, ReviewLedger, SourceResult};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

/// "instance of"
pub const INSTANCE_OF: &str = "P31";
/// "subclass of"
pub const SUBCLASS_OF: &str = "P279";
/// "parent taxon"
pub const PARENT_TAXON: &str = "P171";
/// "taxon rank"
pub const TAXON_RANK: &str = "P105";
/// "taxon name" (scientific name literal)
pub const SCIENTIFIC_NAME: &str = "P225";
/// "occupation"
pub const OCCUPATION: &str = "P106";
/// "sex or gender"
pub const SEX_OR_GENDER: &str = "P21";

/// The "human" class entity
pub const HUMAN: &str = "Q5";
/// The "taxon" class entity
pub const TAXON: &str = "Q16521";
/// "male" sex value
pub const MALE: &str = "Q6581097";
/// "female" sex value
pub const FEMALE: &str = "Q6581072";

/// The "person" synset, base hypernym for every human individual
pub const PERSON_SYNSET: &str = "02474924-n";
/// The "man" synset
pub const MAN_SYNSET: &str = "09647338-n";
/// The "woman" synset
pub const WOMAN_SYNSET: &str = "09642198-n";
/// The "taxonomic group" synset, fallback parent for unplaced taxa
pub const TAXON_ROOT_SYNSET: &str = "08008892-n";

/// Per-run counters. Quality problems in the source data surface here
/// and in conflict files rather than aborting the run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub merged: usize,
    pub created: usize,
    pub skipped: usize,
    pub conflicts: usize,
    pub missing: usize,
}

impl RunReport {
    fn record(&mut self, outcome: &MergeOutcome) {
        match outcome {
            MergeOutcome::Merged(_) => self.merged += 1,
            MergeOutcome::Created(_) => self.created += 1,
            MergeOutcome::Skipped => self.skipped += 1,
        }
    }
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "merged={} created={} skipped={} conflicts={} missing={}",
            self.merged, self.created, self.skipped, self.conflicts, self.missing
        )
    }
}

type Instances = BTreeMap<EntityId, BTreeMap<EntityId, Vec<EntityId>>>;

/// A taxon entity with the facts needed to place it.
#[derive(Debug, Clone)]
struct TaxonFact {
    entity: EntityId,
    rank: String,
    scientific_name: String,
}

/// Orchestrates the alignment passes over one store and knowledge base.
pub struct Pipeline<K: KnowledgeService> {
    store: TaxonomyStore,
    knowledge: K,
    cache: RunCache<String, Instances>,
    report: RunReport,
    conflicts: Vec<ConflictRecord>,
}

impl<K: KnowledgeService> Pipeline<K> {
    pub fn new(store: TaxonomyStore, knowledge: K) -> Self {
        Self {
            store,
            knowledge,
            cache: RunCache::new(),
            report: RunReport::default(),
            conflicts: Vec::new(),
        }
    }

    pub fn store(&self) -> &TaxonomyStore {
        &self.store
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn conflicts(&self) -> &[ConflictRecord] {
        &self.conflicts
    }

    pub fn into_parts(self) -> (TaxonomyStore, RunReport, Vec<ConflictRecord>) {
        (self.store, self.report, self.conflicts)
    }

    /// Bulk fetch of entities holding `code` with one of `values`,
    /// memoized for the run.
    fn instances_of(&self, code: &str, values: &BTreeSet<EntityId>) -> SourceResult<Arc<Instances>> {
        let key = format!(
            "{code}:{}",
            values
                .iter()
                .map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(",")
        );
        self.cache
            .get_or_compute(key, || self.knowledge.entities_with_value(code, values))
    }

    /// Entities that are instances of overlap-linked classes become
    /// instance-hyponyms of the synsets those classes map to. Humans and
    /// taxa are left to their dedicated passes.
    pub fn run_overlaps(
        &mut self,
        overlaps: &ReviewLedger,
        sink: &mut dyn EmissionSink,
    ) -> SourceResult<()> {
        let class_entities: BTreeSet<EntityId> = overlaps.accepted().keys().cloned().collect();
        let instances = self.instances_of(INSTANCE_OF, &class_entities)?;

        let closure = ClosureTable::compute(&self.store.parent_map());
        let mut engine = MergeEngine::new(&mut self.store, &closure);
        let mut seen: BTreeSet<EntityId> = BTreeSet::new();
        let human = EntityId::new(HUMAN);
        let taxon = EntityId::new(TAXON);

        for (class_entity, members) in instances.iter() {
            debug!(class = %class_entity, count = members.len(), "overlap class");
            for (entity, classes) in members {
                if !seen.insert(entity.clone()) {
                    continue;
                }
                if classes.contains(&human) || classes.contains(&taxon) {
                    continue;
                }
                let candidates: BTreeSet<ConceptId> = classes
                    .iter()
                    .flat_map(|class| overlaps.targets(class).iter().cloned())
                    .collect();
                let observation = observe(&self.knowledge, entity)?;
                let outcome =
                    engine.apply(&observation, &candidates, RelKind::InstanceHypernym, sink)?;
                self.report.record(&outcome);
            }
        }
        let conflicts = engine.take_conflicts();
        self.record_conflicts(conflicts);
        info!(report = %self.report, "overlap pass done");
        Ok(())
    }

    /// Every human individual becomes an instance of "person", plus a
    /// sex-specific synset and any occupation-linked synsets.
    pub fn run_humans(
        &mut self,
        occupations: &ReviewLedger,
        sink: &mut dyn EmissionSink,
    ) -> SourceResult<()> {
        let human = EntityId::new(HUMAN);
        let humans = self.instances_of(INSTANCE_OF, &BTreeSet::from([human.clone()]))?;

        let closure = ClosureTable::compute(&self.store.parent_map());
        let occupation_anchors = ledger_anchors(occupations);
        let occupation_resolver = Resolver::new(&self.knowledge, &occupation_anchors);
        let mut engine = MergeEngine::new(&mut self.store, &closure);
        let male = EntityId::new(MALE);
        let female = EntityId::new(FEMALE);

        for entity in humans.get(&human).map(|m| m.keys()).into_iter().flatten() {
            let properties = self.knowledge.properties(entity)?;
            if properties.is_empty() {
                self.report.missing += 1;
                continue;
            }

            let mut candidates = BTreeSet::from([ConceptId::new(PERSON_SYNSET)]);
            if let Some(sexes) = properties.get(SEX_OR_GENDER) {
                if sexes.contains(&male) {
                    candidates.insert(ConceptId::new(MAN_SYNSET));
                } else if sexes.contains(&female) {
                    candidates.insert(ConceptId::new(WOMAN_SYNSET));
                }
            }
            for occupation in properties.get(OCCUPATION).into_iter().flatten() {
                let direct = occupations.targets(occupation);
                if direct.is_empty() {
                    // Unreviewed occupation: try its superclasses
                    candidates.extend(occupation_resolver.resolve(occupation, SUBCLASS_OF)?);
                } else {
                    candidates.extend(direct.iter().cloned());
                }
            }

            let observation = observe(&self.knowledge, entity)?;
            let outcome =
                engine.apply(&observation, &candidates, RelKind::InstanceHypernym, sink)?;
            self.report.record(&outcome);
        }
        let conflicts = engine.take_conflicts();
        self.record_conflicts(conflicts);
        info!(report = %self.report, "human pass done");
        Ok(())
    }

    /// Place every taxon entity. Higher taxa are anchored through the
    /// parent-taxon walk with a rank filter and carry their member taxa
    /// as meronyms; binomial/trinomial species resolve through the
    /// common-name anchors instead and become plain hyponyms.
    pub fn run_taxa(
        &mut self,
        anchors: &AnchorMap,
        common_anchors: &AnchorMap,
        sink: &mut dyn EmissionSink,
    ) -> SourceResult<()> {
        let taxon = EntityId::new(TAXON);
        let taxa = self.instances_of(INSTANCE_OF, &BTreeSet::from([taxon.clone()]))?;

        // First sweep: collect placement facts and the child-taxon map
        let mut facts: Vec<TaxonFact> = Vec::new();
        let mut children: BTreeMap<EntityId, Vec<EntityId>> = BTreeMap::new();
        for entity in taxa.get(&taxon).map(|m| m.keys()).into_iter().flatten() {
            let properties = self.knowledge.properties(entity)?;
            if properties.is_empty() {
                self.report.missing += 1;
                continue;
            }
            for parent in properties.get(PARENT_TAXON).into_iter().flatten() {
                children.entry(parent.clone()).or_default().push(entity.clone());
            }
            let Some(rank_entity) = properties.get(TAXON_RANK).and_then(|r| r.first()) else {
                debug!(entity = %entity, "taxon without rank");
                continue;
            };
            let Some(rank) = self.knowledge.labels(rank_entity)?.into_iter().next() else {
                debug!(entity = %entity, rank_entity = %rank_entity, "rank without label");
                continue;
            };
            let data = self.knowledge.data_properties(entity)?;
            let Some(scientific_name) = data
                .get(SCIENTIFIC_NAME)
                .and_then(|values| values.first())
                .and_then(|value| value.first())
                .cloned()
            else {
                debug!(entity = %entity, "taxon without scientific name");
                continue;
            };
            facts.push(TaxonFact {
                entity: entity.clone(),
                rank,
                scientific_name,
            });
        }

        // Second sweep: resolve and merge
        let closure = ClosureTable::compute(&self.store.parent_map());
        let resolver = Resolver::new(&self.knowledge, anchors);
        let common_resolver = Resolver::new(&self.knowledge, common_anchors);
        let mut engine = MergeEngine::new(&mut self.store, &closure);

        for fact in facts {
            let observation = observe(&self.knowledge, &fact.entity)?;
            let outcome = if is_species_name(&fact.scientific_name) {
                let candidates: BTreeSet<ConceptId> = common_resolver
                    .resolve(&fact.entity, PARENT_TAXON)?
                    .into_iter()
                    .collect();
                engine.apply(&observation, &candidates, RelKind::Hypernym, sink)?
            } else {
                let resolved =
                    resolver.resolve_ranked(&fact.entity, PARENT_TAXON, Some(&fact.rank))?;
                let candidates: BTreeSet<ConceptId> = if resolved.is_empty() {
                    BTreeSet::from([ConceptId::new(TAXON_ROOT_SYNSET)])
                } else {
                    resolved.into_iter().collect()
                };
                let member_taxa: Vec<ConceptId> = children
                    .get(&fact.entity)
                    .into_iter()
                    .flatten()
                    .map(|child| {
                        engine
                            .store()
                            .lookup_external(child)
                            .cloned()
                            .unwrap_or_else(|| ConceptId::from_entity(child))
                    })
                    .collect();
                let observation = observation
                    .with_lemmas(vec![
                        format!("{} {}", fact.rank, fact.scientific_name),
                        fact.scientific_name.clone(),
                    ])
                    .with_mero_members(member_taxa);
                engine.apply(&observation, &candidates, RelKind::Hypernym, sink)?
            };
            self.report.record(&outcome);
        }
        let conflicts = engine.take_conflicts();
        self.record_conflicts(conflicts);
        info!(report = %self.report, "taxon pass done");
        Ok(())
    }

    /// Apply accepted link decisions from a review ledger. Authoritative
    /// rows widen existing links; non-authoritative rows surface
    /// disagreements as conflicts instead.
    pub fn apply_review_links(&mut self, ledger: &ReviewLedger, authoritative: bool) {
        let closure = ClosureTable::compute(&self.store.parent_map());
        let mut engine = MergeEngine::new(&mut self.store, &closure);
        for (entity, targets) in ledger.accepted() {
            for target in targets {
                if authoritative {
                    engine.link_reviewed(target, entity.clone());
                } else {
                    engine.link_external(target, entity.clone());
                }
            }
        }
        let conflicts = engine.take_conflicts();
        self.record_conflicts(conflicts);
    }

    fn record_conflicts(&mut self, conflicts: Vec<ConflictRecord>) {
        self.report.conflicts += conflicts.len();
        self.conflicts.extend(conflicts);
    }
}

fn ledger_anchors(ledger: &ReviewLedger) -> AnchorMap {
    let mut anchors = AnchorMap::new();
    for (entity, targets) in ledger.accepted() {
        for target in targets {
            anchors.insert(entity.clone(), Anchor::new(target.clone()));
        }
    }
    anchors
}

fn observe<K: KnowledgeService>(knowledge: &K, entity: &EntityId) -> SourceResult<Observation> {
    Ok(Observation::new(entity.clone())
        .with_labels(knowledge.labels(entity)?)
        .with_description(knowledge.description(entity)?))
}

/// A binomial ("Panthera leo") or trinomial ("Canis lupus familiaris")
/// species name: capitalized genus followed by lowercase epithets.
fn is_species_name(name: &str) -> bool {
    let words: Vec<&str> = name.split_whitespace().collect();
    let starts_upper = |w: &str| w.chars().next().is_some_and(|c| c.is_uppercase());
    let starts_lower = |w: &str| w.chars().next().is_some_and(|c| c.is_lowercase());
    match words.as_slice() {
        [genus, epithet] => starts_upper(genus) && starts_lower(epithet),
        [genus, epithet, sub] => starts_upper(genus) && starts_lower(epithet) && starts_lower(sub),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Concept;
    use crate::resolve::Anchor;
    use crate::sink::MemorySink;
    use crate::source::MemoryKnowledge;

    fn id(s: &str) -> ConceptId {
        ConceptId::new(s)
    }

    fn entity(s: &str) -> EntityId {
        EntityId::new(s)
    }

    #[test]
    fn test_is_species_name() {
        assert!(is_species_name("Panthera leo"));
        assert!(is_species_name("Canis lupus familiaris"));
        assert!(!is_species_name("Panthera"));
        assert!(!is_species_name("panthera leo"));
        assert!(!is_species_name("Panthera Leo"));
        assert!(!is_species_name(""));
    }

    fn person_store() -> TaxonomyStore {
        let mut store = TaxonomyStore::new();
        store.put(Concept::new(id(PERSON_SYNSET)).with_member("person"));
        store.put(
            Concept::new(id(MAN_SYNSET))
                .with_member("man")
                .with_parent(RelKind::Hypernym, id(PERSON_SYNSET)),
        );
        store.put(
            Concept::new(id(WOMAN_SYNSET))
                .with_member("woman")
                .with_parent(RelKind::Hypernym, id(PERSON_SYNSET)),
        );
        store
    }

    #[test]
    fn test_human_pass_reduces_person_against_sex_synset() {
        let mut knowledge = MemoryKnowledge::new();
        let ada = entity("Q7259");
        knowledge.set_labels(ada.clone(), &["Ada Lovelace"]);
        knowledge.set_description(ada.clone(), "English mathematician");
        knowledge.add_property(ada.clone(), INSTANCE_OF, &[entity(HUMAN)]);
        knowledge.add_property(ada.clone(), SEX_OR_GENDER, &[entity(FEMALE)]);

        let mut pipeline = Pipeline::new(person_store(), knowledge);
        let mut sink = MemorySink::new();
        pipeline
            .run_humans(&ReviewLedger::default(), &mut sink)
            .unwrap();

        assert_eq!(pipeline.report().created, 1);
        let created = pipeline.store().get(&id("Q7259-n")).unwrap();
        // "woman" implies "person", so only the woman synset remains
        assert_eq!(
            created.instance_hypernyms,
            BTreeSet::from([id(WOMAN_SYNSET)])
        );
        assert!(created.members.contains("Ada Lovelace"));
    }

    #[test]
    fn test_human_pass_skips_blank_entities() {
        let mut knowledge = MemoryKnowledge::new();
        let ghost = entity("Q404");
        // Instance link but no labels and no description
        knowledge.add_property(ghost.clone(), INSTANCE_OF, &[entity(HUMAN)]);

        let mut pipeline = Pipeline::new(person_store(), knowledge);
        let mut sink = MemorySink::new();
        pipeline
            .run_humans(&ReviewLedger::default(), &mut sink)
            .unwrap();
        assert_eq!(pipeline.report().skipped, 1);
        assert!(pipeline.store().get(&id("Q404-n")).is_none());
    }

    #[test]
    fn test_human_pass_resolves_occupation_through_superclass() {
        let mut store = person_store();
        store.put(
            Concept::new(id("10605985-n"))
                .with_member("scientist")
                .with_parent(RelKind::Hypernym, id(PERSON_SYNSET)),
        );

        let mut knowledge = MemoryKnowledge::new();
        let marie = entity("Q7186");
        knowledge.set_labels(marie.clone(), &["Marie Curie"]);
        knowledge.set_description(marie.clone(), "Polish-French physicist");
        knowledge.add_property(marie.clone(), INSTANCE_OF, &[entity(HUMAN)]);
        // "physicist" is not in the ledger, but its superclass is
        let physicist = entity("Q169470");
        knowledge.add_property(marie.clone(), OCCUPATION, &[physicist.clone()]);
        knowledge.add_property(physicist, SUBCLASS_OF, &[entity("Q901")]);

        let csv = "QID,SSID,Accept\nQ901,10605985-n,TRUE\n";
        let occupations =
            ReviewLedger::from_reader(csv.as_bytes(), "QID", "SSID", Some("Accept")).unwrap();

        let mut pipeline = Pipeline::new(store, knowledge);
        let mut sink = MemorySink::new();
        pipeline.run_humans(&occupations, &mut sink).unwrap();

        let created = pipeline.store().get(&id("Q7186-n")).unwrap();
        // "scientist" implies "person", which absorbs the base candidate
        assert!(created.instance_hypernyms.contains(&id("10605985-n")));
        assert!(!created.instance_hypernyms.contains(&id(PERSON_SYNSET)));
    }

    #[test]
    fn test_taxon_pass_places_genus_and_species() {
        let mut store = TaxonomyStore::new();
        store.put(Concept::new(id(TAXON_ROOT_SYNSET)).with_member("taxonomic group"));
        store.put(
            Concept::new(id("02083346-n"))
                .with_member("genus Canis")
                .with_external(entity("Q26972265")),
        );
        store.put(Concept::new(id("02084071-n")).with_member("dog"));

        let mut knowledge = MemoryKnowledge::new();
        let rank_genus = entity("Q34740");
        let rank_species = entity("Q7432");
        knowledge.set_labels(rank_genus.clone(), &["genus"]);
        knowledge.set_labels(rank_species.clone(), &["species"]);

        // A genus under an anchored parent
        let vulpes = entity("Q59495");
        knowledge.set_labels(vulpes.clone(), &["Vulpes"]);
        knowledge.set_description(vulpes.clone(), "genus of canids");
        knowledge.add_property(vulpes.clone(), INSTANCE_OF, &[entity(TAXON)]);
        knowledge.add_property(vulpes.clone(), PARENT_TAXON, &[entity("Q25324")]);
        knowledge.add_property(vulpes.clone(), TAXON_RANK, &[rank_genus.clone()]);
        knowledge.add_data_property(vulpes.clone(), SCIENTIFIC_NAME, &["Vulpes"]);

        // A species whose parent walk reaches a common-name anchor
        let lion = entity("Q140");
        knowledge.set_labels(lion.clone(), &["lion"]);
        knowledge.set_description(lion.clone(), "species of big cat");
        knowledge.add_property(lion.clone(), INSTANCE_OF, &[entity(TAXON)]);
        knowledge.add_property(lion.clone(), PARENT_TAXON, &[entity("Q127960")]);
        knowledge.add_property(lion.clone(), TAXON_RANK, &[rank_species.clone()]);
        knowledge.add_data_property(lion.clone(), SCIENTIFIC_NAME, &["Panthera leo"]);

        let mut anchors = AnchorMap::new();
        anchors.insert(entity("Q25324"), Anchor::with_rank(id("02083346-n"), "genus"));
        let mut common_anchors = AnchorMap::new();
        common_anchors.insert(entity("Q127960"), Anchor::new(id("02084071-n")));

        let mut pipeline = Pipeline::new(store, knowledge);
        let mut sink = MemorySink::new();
        pipeline
            .run_taxa(&anchors, &common_anchors, &mut sink)
            .unwrap();

        assert_eq!(pipeline.report().created, 2);

        let genus = pipeline.store().get(&id("Q59495-n")).unwrap();
        assert_eq!(genus.hypernyms, BTreeSet::from([id("02083346-n")]));
        assert!(genus.members.contains("genus Vulpes"));
        assert!(genus.members.contains("Vulpes"));

        let species = pipeline.store().get(&id("Q140-n")).unwrap();
        assert_eq!(species.hypernyms, BTreeSet::from([id("02084071-n")]));
        assert!(species.members.contains("lion"));
        assert!(species.mero_members.is_empty());
    }

    #[test]
    fn test_taxon_pass_fallback_to_root() {
        let mut store = TaxonomyStore::new();
        store.put(Concept::new(id(TAXON_ROOT_SYNSET)).with_member("taxonomic group"));

        let mut knowledge = MemoryKnowledge::new();
        let rank_genus = entity("Q34740");
        knowledge.set_labels(rank_genus.clone(), &["genus"]);
        let orphan = entity("Q999");
        knowledge.set_labels(orphan.clone(), &["Orphanus"]);
        knowledge.set_description(orphan.clone(), "unplaced genus");
        knowledge.add_property(orphan.clone(), INSTANCE_OF, &[entity(TAXON)]);
        knowledge.add_property(orphan.clone(), TAXON_RANK, &[rank_genus]);
        knowledge.add_data_property(orphan.clone(), SCIENTIFIC_NAME, &["Orphanus"]);

        let mut pipeline = Pipeline::new(store, knowledge);
        let mut sink = MemorySink::new();
        pipeline
            .run_taxa(&AnchorMap::new(), &AnchorMap::new(), &mut sink)
            .unwrap();

        let created = pipeline.store().get(&id("Q999-n")).unwrap();
        assert_eq!(created.hypernyms, BTreeSet::from([id(TAXON_ROOT_SYNSET)]));
    }

    #[test]
    fn test_overlap_pass_skips_humans_and_taxa() {
        let mut store = TaxonomyStore::new();
        store.put(Concept::new(id("03001627-n")).with_member("chair"));

        let mut knowledge = MemoryKnowledge::new();
        let chair_class = entity("Q2742194");
        let chair = entity("Q100");
        knowledge.set_labels(chair.clone(), &["throne of X"]);
        knowledge.set_description(chair.clone(), "a famous chair");
        knowledge.add_property(chair.clone(), INSTANCE_OF, &[chair_class.clone()]);
        // A human also instance-of the overlap class must be skipped
        let someone = entity("Q200");
        knowledge.set_labels(someone.clone(), &["Someone"]);
        knowledge.add_property(
            someone.clone(),
            INSTANCE_OF,
            &[chair_class.clone(), entity(HUMAN)],
        );

        let csv = "QID,SSID,Accept\nQ2742194,03001627-n,TRUE\n";
        let overlaps =
            ReviewLedger::from_reader(csv.as_bytes(), "QID", "SSID", Some("Accept")).unwrap();

        let mut pipeline = Pipeline::new(store, knowledge);
        let mut sink = MemorySink::new();
        pipeline.run_overlaps(&overlaps, &mut sink).unwrap();

        assert_eq!(pipeline.report().created, 1);
        let created = pipeline.store().get(&id("Q100-n")).unwrap();
        assert_eq!(
            created.instance_hypernyms,
            BTreeSet::from([id("03001627-n")])
        );
        assert!(pipeline.store().get(&id("Q200-n")).is_none());
    }

    #[test]
    fn test_review_links_conflict_vs_authoritative() {
        let mut store = TaxonomyStore::new();
        store.put(
            Concept::new(id("01571533-n"))
                .with_member("oriole")
                .with_external(entity("Q100")),
        );
        let csv = "QID,SSID,Accept\nQ200,01571533-n,TRUE\n";
        let ledger =
            ReviewLedger::from_reader(csv.as_bytes(), "QID", "SSID", Some("Accept")).unwrap();

        let mut pipeline = Pipeline::new(store, MemoryKnowledge::new());
        pipeline.apply_review_links(&ledger, false);
        assert_eq!(pipeline.conflicts().len(), 1);
        assert_eq!(pipeline.report().conflicts, 1);

        // Authoritative application widens instead
        pipeline.apply_review_links(&ledger, true);
        let link = pipeline
            .store()
            .get(&id("01571533-n"))
            .unwrap()
            .external
            .clone()
            .unwrap();
        assert!(link.contains(&entity("Q100")));
        assert!(link.contains(&entity("Q200")));
    }
}
