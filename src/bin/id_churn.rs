use clap::{Parser, Subcommand};
use sorted_ids::{BatchMode, SortedIdSet, SortedIdsConfig, SortedIdsError};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

const CONFIG_ENV: &str = "SORTED_IDS_CONFIG";

#[derive(Parser)]
#[command(name = "id_churn")]
#[command(about = "Drive a sorted id set with scene-like edit workloads", long_about = None)]
struct Cli {
    /// JSON tuning config (falls back to $SORTED_IDS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Check the final ids against a naive multiset
    #[arg(long, global = true)]
    verify: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rename one group of prims with interleaved remove/insert pairs
    Rename {
        #[arg(long, default_value_t = 10_000)]
        prims: usize,
        #[arg(long, default_value_t = 100)]
        groups: usize,
    },
    /// Alternate insert-heavy and remove-heavy bursts
    Churn {
        #[arg(long, default_value_t = 10_000)]
        prims: usize,
        #[arg(long, default_value_t = 20)]
        rounds: usize,
        #[arg(long, default_value_t = 500)]
        burst: usize,
    },
    /// Delete one group subtree with a single range removal
    Prune {
        #[arg(long, default_value_t = 10_000)]
        prims: usize,
        #[arg(long, default_value_t = 100)]
        groups: usize,
        #[arg(long, default_value_t = 0)]
        group: usize,
    },
}

/// The set under test plus an optional reference model.
struct Workload {
    set: SortedIdSet<String>,
    model: Option<BTreeMap<String, usize>>,
}

impl Workload {
    fn new(config: SortedIdsConfig, verify: bool) -> Result<Self, SortedIdsError> {
        Ok(Self {
            set: SortedIdSet::with_config(config)?,
            model: verify.then(BTreeMap::new),
        })
    }

    fn insert(&mut self, id: String) {
        if let Some(model) = &mut self.model {
            *model.entry(id.clone()).or_insert(0) += 1;
        }
        self.set.insert(id);
    }

    fn remove(&mut self, id: String) {
        if let Some(model) = &mut self.model {
            if let Some(count) = model.get_mut(&id) {
                *count -= 1;
                if *count == 0 {
                    model.remove(&id);
                }
            }
        }
        self.set.remove(id);
    }

    fn populate(&mut self, prims: usize, groups: usize) {
        for i in 0..prims {
            self.insert(prim_path("group", i % groups, i));
        }
        self.set.resolve();
    }

    fn verify(&mut self) -> Result<(), SortedIdsError> {
        let Some(model) = &self.model else {
            return Ok(());
        };
        let expected: Vec<String> = model
            .iter()
            .flat_map(|(id, count)| std::iter::repeat(id.clone()).take(*count))
            .collect();
        if self.set.ids() != expected.as_slice() {
            return Err(SortedIdsError::Other(format!(
                "verification failed: {} ids, expected {}",
                self.set.ids().len(),
                expected.len()
            )));
        }
        info!(ids = expected.len(), "verified against reference multiset");
        Ok(())
    }
}

fn prim_path(scope: &str, group: usize, prim: usize) -> String {
    format!("/World/{}_{:04}/prim_{:06}", scope, group, prim)
}

fn load_config(path: Option<PathBuf>) -> Result<SortedIdsConfig, SortedIdsError> {
    match path.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from)) {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            SortedIdsConfig::from_json_file(&path)
        }
        None => Ok(SortedIdsConfig::default()),
    }
}

fn run_rename(work: &mut Workload, prims: usize, groups: usize) {
    let groups = groups.max(1);
    work.populate(prims, groups);

    let start = Instant::now();
    let mut early_resolves = 0;
    for i in (0..prims).filter(|i| i % groups == 0) {
        work.remove(prim_path("group", 0, i));
        work.insert(prim_path("renamed", 0, i));
        if work.set.batch_mode() != BatchMode::MixedBatch {
            early_resolves += 1;
        }
    }
    let total = work.set.ids().len();
    info!(
        ids = total,
        early_resolves,
        elapsed_us = start.elapsed().as_micros() as u64,
        "rename finished"
    );
}

fn run_churn(work: &mut Workload, prims: usize, rounds: usize, burst: usize) {
    work.populate(prims, 100);

    let start = Instant::now();
    let mut next_new = prims;
    let mut next_old = 0;
    for round in 0..rounds {
        for k in 0..burst {
            let insert_heavy = round % 2 == 0;
            // one opposing edit in four keeps the batch mixed
            if insert_heavy != (k % 4 == 3) {
                work.insert(prim_path("churn", round, next_new));
                next_new += 1;
            } else {
                work.remove(prim_path("group", next_old % 100, next_old));
                next_old += 1;
            }
        }
        let total = work.set.ids().len();
        tracing::debug!(round, ids = total, "round synced");
    }
    info!(
        rounds,
        ids = work.set.ids().len(),
        elapsed_us = start.elapsed().as_micros() as u64,
        "churn finished"
    );
}

fn run_prune(
    work: &mut Workload,
    prims: usize,
    groups: usize,
    group: usize,
) -> Result<(), SortedIdsError> {
    let groups = groups.max(1);
    work.populate(prims, groups);

    let prefix = format!("/World/group_{:04}/", group);
    let last = format!("{}\u{10FFFF}", prefix);
    let start = Instant::now();
    match work.set.find_range(&prefix, &last) {
        Some((first, end)) => {
            work.set.remove_range(first, end)?;
            if let Some(model) = &mut work.model {
                model.retain(|id, _| !id.starts_with(&prefix));
            }
            info!(
                removed = end - first + 1,
                ids = work.set.ids().len(),
                elapsed_us = start.elapsed().as_micros() as u64,
                "prune finished"
            );
        }
        None => warn!(group, "group has no prims, nothing to prune"),
    }
    Ok(())
}

fn main() -> Result<(), SortedIdsError> {
    sorted_ids::init_tracing("id_churn");
    let cli = Cli::parse();

    let config = load_config(cli.config)?;
    info!(
        bloom_bits = config.bloom_bits,
        bloom_capacity = config.bloom_capacity,
        remove_search_ratio = config.remove_search_ratio,
        "config"
    );
    let mut work = Workload::new(config, cli.verify)?;

    match cli.command {
        Commands::Rename { prims, groups } => run_rename(&mut work, prims, groups),
        Commands::Churn {
            prims,
            rounds,
            burst,
        } => run_churn(&mut work, prims, rounds, burst),
        Commands::Prune {
            prims,
            groups,
            group,
        } => run_prune(&mut work, prims, groups, group)?,
    }

    let stats = work.set.stats();
    info!(
        resolves = stats.resolves,
        forced_resolves = stats.forced_resolves,
        bloom_false_positives = stats.bloom_false_positives,
        "stats"
    );
    work.verify()
}
