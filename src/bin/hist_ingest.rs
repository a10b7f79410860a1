use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use football_predictor::config;
use football_predictor::csv_dataset;
use football_predictor::historical_dataset;

const USAGE: &str = "usage: hist_ingest [--db FILE] [--group ID] FILE.csv [FILE.csv ...]";

fn main() -> Result<()> {
    config::load_dotenv();
    init_tracing();

    let (files, group, db) = parse_args()?;
    if files.is_empty() {
        return Err(anyhow!(USAGE));
    }

    let db_path = db
        .or_else(historical_dataset::default_db_path)
        .context("unable to resolve sqlite path")?;
    let mut conn = historical_dataset::open_db(&db_path)?;

    let mut total = 0usize;
    let mut failed = 0usize;
    for file in &files {
        let group_id = match &group {
            Some(g) => g.clone(),
            None => group_from_path(file)?,
        };
        match csv_dataset::read_matches_from_path(file) {
            Ok(rows) => {
                let written = historical_dataset::upsert_matches(&mut conn, &group_id, &rows)?;
                info!(file = %file.display(), group_id, written, "ingested");
                total += written;
            }
            Err(err) => {
                warn!(file = %file.display(), "skipping: {err:#}");
                failed += 1;
            }
        }
    }

    println!("Historical ingest complete");
    println!("DB: {}", db_path.display());
    println!("Files: {}/{}", files.len() - failed, files.len());
    println!("Matches upserted: {total}");
    for group_id in historical_dataset::list_groups(&conn)? {
        let table = historical_dataset::load_matches(&conn, &group_id)?;
        println!(
            "group {}: matches={} teams={} scheme={:?}",
            group_id,
            table.len(),
            table.teams().len(),
            table.scheme()
        );
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn parse_args() -> Result<(Vec<PathBuf>, Option<String>, Option<PathBuf>)> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut files = Vec::new();
    let mut group = None;
    let mut db = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if let Some(raw) = arg.strip_prefix("--db=") {
            db = Some(PathBuf::from(raw.trim()));
        } else if arg == "--db" {
            db = iter.next().map(PathBuf::from);
        } else if let Some(raw) = arg.strip_prefix("--group=") {
            group = Some(raw.trim().to_string());
        } else if arg == "--group" {
            group = iter.next().map(|s| s.trim().to_string());
        } else if arg.starts_with("--") {
            return Err(anyhow!("unknown flag {arg}\n{USAGE}"));
        } else {
            files.push(PathBuf::from(arg));
        }
    }
    Ok((files, group.filter(|g| !g.is_empty()), db))
}

/// `data/E0.csv` ingests into group `E0`.
fn group_from_path(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("cannot derive group id from {}", path.display()))
}
