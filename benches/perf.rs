use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use football_predictor::config::EngineConfig;
use football_predictor::decision::{DecisionThresholds, decide};
use football_predictor::elo::EloClassifier;
use football_predictor::form::recent_form;
use football_predictor::head_to_head::head_to_head;
use football_predictor::model_adapter::ModelAdapter;
use football_predictor::result_codes::detect_scheme;
use football_predictor::{Outcome, ProbabilityVector, Predictor, csv_dataset, synthetic};

fn bench_predict(c: &mut Criterion) {
    let table = synthetic::generate_league(7, 20, 4);
    let model = ModelAdapter::classifier(EloClassifier::fit(&table));
    let predictor = Predictor::new(EngineConfig {
        model_timeout_ms: 0,
        ..EngineConfig::default()
    });
    c.bench_function("predict_inline", |b| {
        b.iter(|| {
            let result = predictor
                .predict(black_box("Team 03"), black_box("Team 11"), &table, &model)
                .unwrap();
            black_box(result.confidence);
        })
    });

    let bounded = Predictor::default();
    c.bench_function("predict_bounded", |b| {
        b.iter(|| {
            let result = bounded
                .predict(black_box("Team 03"), black_box("Team 11"), &table, &model)
                .unwrap();
            black_box(result.confidence);
        })
    });
}

fn bench_history_scans(c: &mut Criterion) {
    let table = synthetic::generate_league(11, 20, 6);
    c.bench_function("recent_form", |b| {
        b.iter(|| {
            let form = recent_form(black_box("Team 05"), &table, 5);
            black_box(form.points);
        })
    });
    c.bench_function("head_to_head", |b| {
        b.iter(|| {
            let h2h = head_to_head(black_box("Team 05"), black_box("Team 09"), &table).unwrap();
            black_box(h2h.matches);
        })
    });
    c.bench_function("detect_scheme", |b| {
        b.iter(|| {
            let codes = table.rows().iter().map(|r| &r.result_code);
            black_box(detect_scheme(black_box(codes)).ok())
        })
    });
}

fn bench_elo_fit(c: &mut Criterion) {
    let table = synthetic::generate_league(13, 20, 6);
    c.bench_function("elo_fit", |b| {
        b.iter(|| {
            let model = EloClassifier::fit(black_box(&table));
            black_box(model.rating("Team 01"));
        })
    });
}

fn bench_csv_parse(c: &mut Criterion) {
    c.bench_function("csv_parse_season", |b| {
        b.iter(|| {
            let rows = csv_dataset::read_matches(black_box(SEASON_CSV.as_bytes())).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_decide(c: &mut Criterion) {
    let thresholds = DecisionThresholds::default();
    let grid: Vec<ProbabilityVector> = (0..=20)
        .flat_map(|h| {
            (0..=(20 - h)).map(move |d| {
                let home = h as f64 / 20.0;
                let draw = d as f64 / 20.0;
                ProbabilityVector::new(home, draw, 1.0 - home - draw)
            })
        })
        .collect();
    c.bench_function("decide_grid", |b| {
        b.iter(|| {
            for dist in &grid {
                for model in Outcome::ALL {
                    black_box(decide(black_box(dist), model, &thresholds));
                }
            }
        })
    });
}

criterion_group!(
    perf,
    bench_predict,
    bench_history_scans,
    bench_elo_fit,
    bench_csv_parse,
    bench_decide
);
criterion_main!(perf);

static SEASON_CSV: &str = include_str!("../tests/fixtures/season_v1.csv");
