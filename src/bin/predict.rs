use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use football_predictor::config::{self, EngineConfig};
use football_predictor::csv_dataset;
use football_predictor::elo::EloClassifier;
use football_predictor::historical_dataset::{self, MatchSource, MatchTable, SqliteSource};
use football_predictor::league_params::GoalsRegressor;
use football_predictor::model_adapter::ModelAdapter;
use football_predictor::Predictor;

const USAGE: &str = "usage: predict --home TEAM --away TEAM (--csv FILE | [--db FILE] --group ID) \
                     [--model elo|goals] [--config FILE]";

fn main() -> Result<()> {
    config::load_dotenv();
    init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let home = arg_value(&args, "home").ok_or_else(|| anyhow!(USAGE))?;
    let away = arg_value(&args, "away").ok_or_else(|| anyhow!(USAGE))?;

    let table = load_table(&args)?;
    let cfg = match arg_value(&args, "config") {
        Some(path) => EngineConfig::load_json(&PathBuf::from(path))?,
        None => EngineConfig::from_env(),
    };
    let model = build_model(arg_value(&args, "model").as_deref().unwrap_or("elo"), &table)?;

    let result = Predictor::new(cfg).predict(&home, &away, &table, &model)?;
    let json = serde_json::to_string_pretty(&result).context("serialize prediction")?;
    println!("{json}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_table(args: &[String]) -> Result<MatchTable> {
    if let Some(path) = arg_value(args, "csv") {
        return csv_dataset::load_table(&PathBuf::from(path));
    }
    let group = arg_value(args, "group").ok_or_else(|| anyhow!(USAGE))?;
    let db_path = arg_value(args, "db")
        .map(PathBuf::from)
        .or_else(historical_dataset::default_db_path)
        .context("unable to resolve sqlite path")?;
    SqliteSource::new(db_path).load_matches(&group)
}

fn build_model(kind: &str, table: &MatchTable) -> Result<ModelAdapter> {
    match kind {
        "elo" => Ok(ModelAdapter::classifier(EloClassifier::fit(table))),
        "goals" => Ok(ModelAdapter::regressor(GoalsRegressor::fit(table))),
        other => Err(anyhow!("unknown model {other:?}, expected elo or goals")),
    }
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    let flag = format!("--{name}");
    let prefix = format!("--{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if *arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
