//! Lexweave CLI — align a curated wordnet with a knowledge-base dump.
//!
//! Usage:
//!   lexweave align --db wikidata.db --wordnet yaml/ [--out out/] \
//!       [--overlaps overlaps.csv] [--occupations occupations.csv] \
//!       [--taxon-anchors taxa.csv] [--taxon-commons taxon2common.csv]
//!   lexweave discover taxa --db wikidata.db --wordnet yaml/
//!   lexweave discover overlaps --db wikidata.db --wordnet yaml/ [--min-count 5]
//!   lexweave discover languages --db wikidata.db --wordnet yaml/

use clap::{Args, Parser, Subcommand};
use lexweave::discover::{
    align_languages, count_overlaps, discover_anchors, write_language_candidates,
    write_overlap_candidates, write_taxon_candidates,
};
use lexweave::index::NameIndex;
use lexweave::pipeline::{INSTANCE_OF, SCIENTIFIC_NAME, TAXON, TAXON_RANK};
use lexweave::resolve::{Anchor, AnchorMap};
use lexweave::source::{
    load_concept_pairs, load_taxon_anchors, KnowledgeService, LexicalSource, ReviewLedger,
    SqliteKnowledge, SourceResult, YamlLexicalSource,
};
use lexweave::{ConflictWriter, EntityId, Pipeline, TaxonomyStore, YamlSink};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "lexweave",
    version,
    about = "Taxonomy alignment engine merging a curated wordnet with a knowledge base"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the alignment passes and write the generated YAML files
    Align(AlignArgs),
    /// Propose review-CSV candidates for the manual ledgers
    Discover {
        #[command(subcommand)]
        target: DiscoverTarget,
    },
}

#[derive(Subcommand)]
enum DiscoverTarget {
    /// Taxon anchors: rank-bearing lemmas matched to scientific names
    Taxa(DiscoverArgs),
    /// Class overlaps: knowledge-base classes co-occurring with synsets
    Overlaps(OverlapArgs),
    /// Language alignments: language synsets matched by label
    Languages(DiscoverArgs),
}

#[derive(Args)]
struct AlignArgs {
    /// Path to the knowledge-base SQLite dump
    #[arg(long)]
    db: PathBuf,

    /// Directory of curated wordnet YAML files
    #[arg(long)]
    wordnet: PathBuf,

    /// Output directory for generated YAML and conflict files
    #[arg(long, default_value = "out")]
    out: PathBuf,

    /// Reviewed class-overlap ledger (QID, SSID, Accept)
    #[arg(long)]
    overlaps: Option<PathBuf>,

    /// Reviewed occupation-link ledger (QID, Linked)
    #[arg(long)]
    occupations: Option<PathBuf>,

    /// Reviewed taxon-anchor ledger (SSID, Lemma, Wikidata)
    #[arg(long)]
    taxon_anchors: Option<PathBuf>,

    /// Reviewed taxon-to-common-name pairs (SSID 1, SSID 2, Accept)
    #[arg(long)]
    taxon_commons: Option<PathBuf>,

    /// Skip the overlap pass
    #[arg(long)]
    skip_overlaps: bool,

    /// Skip the human pass
    #[arg(long)]
    skip_humans: bool,

    /// Skip the taxon pass
    #[arg(long)]
    skip_taxa: bool,
}

#[derive(Args)]
struct DiscoverArgs {
    /// Path to the knowledge-base SQLite dump
    #[arg(long)]
    db: PathBuf,

    /// Directory of curated wordnet YAML files
    #[arg(long)]
    wordnet: PathBuf,

    /// Candidate CSV output path
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args)]
struct OverlapArgs {
    #[command(flatten)]
    common: DiscoverArgs,

    /// Drop (class, synset) pairs seen fewer times than this
    #[arg(long, default_value_t = 5)]
    min_count: usize,
}

fn load_store(wordnet: &Path) -> SourceResult<TaxonomyStore> {
    let mut store = TaxonomyStore::new();
    for concept in YamlLexicalSource::new(wordnet).load_all()? {
        store.put(concept);
    }
    info!(concepts = store.len(), "wordnet loaded");
    Ok(store)
}

fn load_ledger(
    path: &Option<PathBuf>,
    columns: (&str, &str, Option<&str>),
) -> SourceResult<ReviewLedger> {
    match path {
        Some(path) => {
            let file = File::open(path)?;
            ReviewLedger::from_reader(file, columns.0, columns.1, columns.2)
        }
        None => Ok(ReviewLedger::default()),
    }
}

/// Common-name anchors: accepted (taxon synset, common synset) pairs,
/// keyed by the entity the taxon synset is already linked to.
fn load_common_anchors(path: &Option<PathBuf>, store: &TaxonomyStore) -> SourceResult<AnchorMap> {
    let mut anchors = AnchorMap::new();
    let Some(path) = path else {
        return Ok(anchors);
    };
    let file = File::open(path)?;
    for (taxon, common) in load_concept_pairs(file, "SSID 1", "SSID 2")? {
        let Some(link) = store.get(&taxon).and_then(|concept| concept.external.as_ref()) else {
            continue;
        };
        for entity in link.ids() {
            anchors.insert(entity.clone(), Anchor::new(common.clone()));
        }
    }
    Ok(anchors)
}

fn open_sink(out: &Path, name: &str) -> SourceResult<YamlSink<File>> {
    Ok(YamlSink::new(File::create(out.join(name))?))
}

fn cmd_align(args: &AlignArgs) -> SourceResult<()> {
    let store = load_store(&args.wordnet)?;
    let knowledge = SqliteKnowledge::open(&args.db)?;
    let mut pipeline = Pipeline::new(store, knowledge);
    std::fs::create_dir_all(&args.out)?;

    if !args.skip_overlaps {
        let ledger = load_ledger(&args.overlaps, ("QID", "SSID", Some("Accept")))?;
        let mut sink = open_sink(&args.out, "noun.overlaps.yaml")?;
        pipeline.run_overlaps(&ledger, &mut sink)?;
    }
    if !args.skip_humans {
        let ledger = load_ledger(&args.occupations, ("QID", "Linked", None))?;
        let mut sink = open_sink(&args.out, "noun.human.yaml")?;
        pipeline.run_humans(&ledger, &mut sink)?;
    }
    if !args.skip_taxa {
        let anchors = match &args.taxon_anchors {
            Some(path) => load_taxon_anchors(File::open(path)?)?,
            None => AnchorMap::new(),
        };
        let common_anchors = load_common_anchors(&args.taxon_commons, pipeline.store())?;
        let mut sink = open_sink(&args.out, "noun.taxon.yaml")?;
        pipeline.run_taxa(&anchors, &common_anchors, &mut sink)?;
    }

    let (_, report, conflicts) = pipeline.into_parts();
    if !conflicts.is_empty() {
        let file = File::create(args.out.join("conflicts.csv"))?;
        let mut writer = ConflictWriter::new(file)?;
        for conflict in &conflicts {
            writer.write(conflict)?;
        }
        writer.flush()?;
    }
    println!("{}", report);
    Ok(())
}

fn out_path(args: &DiscoverArgs, default: &str) -> PathBuf {
    args.out.clone().unwrap_or_else(|| PathBuf::from(default))
}

fn cmd_discover_taxa(args: &DiscoverArgs) -> SourceResult<()> {
    let store = load_store(&args.wordnet)?;
    let knowledge = SqliteKnowledge::open(&args.db)?;

    // Group scientific names by (rank, name) before indexing so a shared
    // name yields one entry with every entity attached
    let taxon = EntityId::new(TAXON);
    let taxa = knowledge.entities_with_value(INSTANCE_OF, &BTreeSet::from([taxon.clone()]))?;
    let mut names: BTreeMap<(String, String), Vec<EntityId>> = BTreeMap::new();
    for entity in taxa.get(&taxon).map(|m| m.keys()).into_iter().flatten() {
        let properties = knowledge.properties(entity)?;
        let Some(rank_entity) = properties.get(TAXON_RANK).and_then(|r| r.first()) else {
            continue;
        };
        let Some(rank) = knowledge.labels(rank_entity)?.into_iter().next() else {
            continue;
        };
        let data = knowledge.data_properties(entity)?;
        for value in data.get(SCIENTIFIC_NAME).into_iter().flatten() {
            if let Some(name) = value.first() {
                names
                    .entry((rank.clone(), name.clone()))
                    .or_default()
                    .push(entity.clone());
            }
        }
    }

    let mut index = NameIndex::new();
    for ((rank, name), entities) in names {
        index.insert(rank, name, entities);
    }
    info!(indexed = index.len(), "scientific names indexed");

    let candidates = discover_anchors(&store, &index);
    info!(candidates = candidates.len(), "candidates found");
    write_taxon_candidates(File::create(out_path(args, "taxon_candidates.csv"))?, &candidates)?;
    Ok(())
}

fn cmd_discover_overlaps(args: &OverlapArgs) -> SourceResult<()> {
    let store = load_store(&args.common.wordnet)?;
    let knowledge = SqliteKnowledge::open(&args.common.db)?;

    let candidates = count_overlaps(&store, &knowledge, args.min_count)?;
    info!(candidates = candidates.len(), "overlap candidates found");
    write_overlap_candidates(
        File::create(out_path(&args.common, "overlap_candidates.csv"))?,
        &candidates,
    )?;
    Ok(())
}

fn cmd_discover_languages(args: &DiscoverArgs) -> SourceResult<()> {
    let store = load_store(&args.wordnet)?;
    let knowledge = SqliteKnowledge::open(&args.db)?;

    let candidates = align_languages(&store, &knowledge)?;
    info!(candidates = candidates.len(), "language candidates found");
    write_language_candidates(
        File::create(out_path(args, "language_candidates.csv"))?,
        &candidates,
    )?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Align(args) => cmd_align(args),
        Commands::Discover { target } => match target {
            DiscoverTarget::Taxa(args) => cmd_discover_taxa(args),
            DiscoverTarget::Overlaps(args) => cmd_discover_overlaps(args),
            DiscoverTarget::Languages(args) => cmd_discover_languages(args),
        },
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
