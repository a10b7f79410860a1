use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use football_predictor::calibration::{self, Metrics};
use football_predictor::config::{self, EngineConfig};
use football_predictor::decision::{PredictionType, Rule};
use football_predictor::elo::EloClassifier;
use football_predictor::historical_dataset::{self, MatchSource, MatchTable, SqliteSource};
use football_predictor::league_params::GoalsRegressor;
use football_predictor::model_adapter::ModelAdapter;
use football_predictor::{Outcome, PredictionResult, Predictor, csv_dataset, synthetic};

const USAGE: &str = "usage: backtest (--csv FILE | [--db FILE] --group ID | --synthetic SEED) \
                     [--model elo|goals] [--min-history N] [--refit-every N]";

struct Scored {
    result: PredictionResult,
    actual: Outcome,
}

fn main() -> Result<()> {
    config::load_dotenv();
    init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    // Walk-forward history is a row prefix, so rows must be in date order.
    let table = load_table(&args)?.chronological();
    let model_kind = arg_value(&args, "model").unwrap_or_else(|| "elo".to_string());
    let min_history = arg_value(&args, "min-history")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(50);
    let refit_every = arg_value(&args, "refit-every")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(50)
        .max(1);

    if table.len() <= min_history {
        return Err(anyhow!(
            "need more than {min_history} matches, table has {}",
            table.len()
        ));
    }

    // Baseline models run in-process, so skip the per-call worker thread.
    let cfg = EngineConfig {
        model_timeout_ms: 0,
        ..EngineConfig::from_env()
    };
    let predictor = Predictor::new(cfg);

    let chunks: Vec<(usize, usize)> = (min_history..table.len())
        .step_by(refit_every)
        .map(|start| (start, (start + refit_every).min(table.len())))
        .collect();
    info!(
        matches = table.len(),
        chunks = chunks.len(),
        model = %model_kind,
        "walk-forward backtest"
    );

    let scored = chunks
        .par_iter()
        .map(|&(start, end)| score_chunk(&predictor, &table, &model_kind, start, end))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect::<Vec<_>>();

    report(&scored);
    Ok(())
}

/// Fits on everything before `start`, then predicts `start..end` using only
/// earlier rows for each fixture.
fn score_chunk(
    predictor: &Predictor,
    table: &MatchTable,
    model_kind: &str,
    start: usize,
    end: usize,
) -> Result<Vec<Scored>> {
    let model = build_model(model_kind, &table.prefix(start))?;
    let mut out = Vec::with_capacity(end - start);
    for i in start..end {
        let row = &table.rows()[i];
        let Some(actual) = table.outcome(row) else {
            continue;
        };
        let history = table.prefix(i);
        let Ok(result) = predictor.predict(&row.home_team, &row.away_team, &history, &model) else {
            continue;
        };
        out.push(Scored { result, actual });
    }
    Ok(out)
}

fn report(scored: &[Scored]) {
    let probs = scored.iter().map(|s| s.result.probabilities).collect::<Vec<_>>();
    let actual = scored.iter().map(|s| s.actual).collect::<Vec<_>>();
    let metrics: Metrics = calibration::evaluate_probs(&probs, &actual);
    let ece = calibration::expected_calibration_error(&probs, &actual, 10);
    let base = calibration::empirical_outcome_probs(&actual);

    println!("Backtest complete");
    println!("Samples: {}", metrics.samples);
    println!(
        "Brier: {:.4}  LogLoss: {:.4}  Argmax acc: {:.1}%  ECE: {:.4}",
        metrics.brier,
        metrics.log_loss,
        metrics.accuracy * 100.0,
        ece
    );
    println!(
        "Base rates: H {:.1}% D {:.1}% A {:.1}%",
        base.home * 100.0,
        base.draw * 100.0,
        base.away * 100.0
    );

    let mut per_rule: BTreeMap<Rule, (usize, usize)> = BTreeMap::new();
    let mut per_type: BTreeMap<&'static str, (usize, usize)> = BTreeMap::new();
    for s in scored {
        let hit = s.result.outcome.covers(s.actual) as usize;
        let entry = per_rule.entry(s.result.rule).or_default();
        entry.0 += 1;
        entry.1 += hit;
        let key = match s.result.prediction_type {
            PredictionType::Single => "single",
            PredictionType::DoubleChance => "double_chance",
            PredictionType::Adjusted => "adjusted",
        };
        let entry = per_type.entry(key).or_default();
        entry.0 += 1;
        entry.1 += hit;
    }

    for rule in Rule::ALL {
        let (n, hits) = per_rule.get(&rule).copied().unwrap_or_default();
        println!("rule {:?}: n={} hit={}", rule, n, pct(hits, n));
    }
    for (key, (n, hits)) in per_type {
        println!("type {key}: n={n} hit={}", pct(hits, n));
    }
}

fn pct(hits: usize, n: usize) -> String {
    if n == 0 {
        return "n/a".to_string();
    }
    format!("{:.1}%", hits as f64 * 100.0 / n as f64)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_table(args: &[String]) -> Result<MatchTable> {
    if let Some(seed) = arg_value(args, "synthetic") {
        let seed = seed.parse::<u64>().context("--synthetic expects a numeric seed")?;
        return Ok(synthetic::generate_league(seed, 20, 3));
    }
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
