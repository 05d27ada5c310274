// pprl-cli/src/main.rs
//
// pprl — smoke-test harness for pprl-core.
//
// Loads two JSON record arrays, embeds both under a shared embedder built
// from `name`/`dob`/`sex` columns (whichever are present in the first
// file), compares them, and prints the matched pairs. This is a manual
// testing harness, not the full command-line driver described in the
// library's external-interfaces notes — there's no `.env` loading, no
// party handshake, no network transport here.
//
// Usage:
//   pprl --left left.json --right right.json
//   pprl --left left.json --right right.json --one-to-one=false

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pprl_core::{compare, ColumnKind, ColumnSpec, Embedder, MatchParams, RecordTable, Table, Value};

mod config;
use config::CoreConfig;

#[derive(Parser)]
#[command(
    name = "pprl",
    about = "Embed, compare, and match two local record tables",
    version = env!("CARGO_PKG_VERSION"),
)]
struct Cli {
    #[arg(long)]
    left: PathBuf,

    #[arg(long)]
    right: PathBuf,

    #[command(flatten)]
    config: CoreConfig,
}

/// Columns this harness knows how to embed, in a fixed priority order.
const KNOWN_COLUMNS: [(&str, ColumnKind); 3] =
    [("name", ColumnKind::Name), ("dob", ColumnKind::Dob), ("sex", ColumnKind::Sex)];

fn load_table(path: &PathBuf) -> Result<RecordTable> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let rows: Vec<serde_json::Map<String, serde_json::Value>> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {} as a JSON array of objects", path.display()))?;

    let mut table = RecordTable::new();
    for (name, _) in KNOWN_COLUMNS {
        let column: Vec<Value> = rows
            .iter()
            .map(|row| match row.get(name) {
                None | Some(serde_json::Value::Null) => Value::Null,
                Some(serde_json::Value::String(s)) => Value::from(s.as_str()),
                Some(serde_json::Value::Number(n)) => {
                    n.as_i64().map(Value::Int).unwrap_or_else(|| Value::Float(n.as_f64().unwrap_or_default()))
                }
                Some(other) => Value::from(other.to_string()),
            })
            .collect();
        table.set_column(name, column);
    }
    Ok(table)
}

fn build_embedder(config: &CoreConfig, table: &RecordTable) -> Result<Embedder> {
    let colspecs: Vec<ColumnSpec> = KNOWN_COLUMNS
        .iter()
        .filter(|(name, _)| table.column(name).is_some())
        .map(|&(name, kind)| ColumnSpec::new(name, kind))
        .collect();

    if colspecs.is_empty() {
        anyhow::bail!("neither table has any of the known columns: name, dob, sex");
    }

    Embedder::new(config.bf_size, config.num_hashes, config.offset, config.salt.clone().into_bytes(), colspecs)
        .context("constructing embedder")
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("pprl=info".parse()?))
        .compact()
        .init();

    let cli = Cli::parse();

    let left_table = load_table(&cli.left)?;
    let right_table = load_table(&cli.right)?;
    info!(left_rows = left_table.len(), right_rows = right_table.len(), "loaded tables");

    let embedder = build_embedder(&cli.config, &left_table)?;

    let mut left = embedder.embed(&left_table)?;
    let mut right = embedder.embed(&right_table)?;
    left.update_norms(&embedder)?;
    right.update_norms(&embedder)?;

    if cli.config.rel_cutoff.is_some() {
        left.update_thresholds(&embedder)?;
        right.update_thresholds(&embedder)?;
    }

    let similarity = compare(&embedder, &left, &right)?;
    let params = MatchParams {
        rel_cutoff: cli.config.rel_cutoff,
        abs_cutoff: cli.config.abs_cutoff,
        one_to_one: cli.config.one_to_one,
    };
    let pairs = similarity.match_pairs(&params)?;

    if pairs.is_empty() {
        warn!("no pairs survived the configured cutoffs");
    }
    for pair in &pairs {
        println!("{}\t{}\t{:.4}", pair.left, pair.right, pair.score);
    }

    Ok(())
}
