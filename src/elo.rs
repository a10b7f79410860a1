use std::collections::HashMap;

use crate::features::MatchFeatures;
use crate::historical_dataset::MatchTable;
use crate::model_adapter::ProbabilityModel;
use crate::outcome::Outcome;

#[derive(Debug, Clone, Copy)]
pub struct EloConfig {
    pub k: f64,
    pub home_adv_pts: f64,
    pub initial: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            k: 20.0,
            home_adv_pts: 60.0,
            initial: 1500.0,
        }
    }
}

/// Replays the table in date order (undated rows keep table position after
/// dated ones) and returns final ratings per team.
pub fn compute_elo(table: &MatchTable, cfg: EloConfig) -> HashMap<String, f64> {
    let mut rows: Vec<(usize, _)> = table.rows().iter().enumerate().collect();
    rows.sort_by(|(ia, a), (ib, b)| match (a.date, b.date) {
        (Some(da), Some(db)) => da.cmp(&db).then(ia.cmp(ib)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => ia.cmp(ib),
    });

    let mut elo: HashMap<String, f64> = HashMap::new();
    for (_, m) in rows {
        let Some(outcome) = table.outcome(m) else {
            continue;
        };
        let eh = *elo.entry(m.home_team.clone()).or_insert(cfg.initial);
        let ea = *elo.entry(m.away_team.clone()).or_insert(cfg.initial);

        let expected_home = expected_score(eh + cfg.home_adv_pts, ea);
        let s_home = match outcome {
            Outcome::Home => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Away => 0.0,
        };

        let delta = cfg.k * (s_home - expected_home);
        elo.insert(m.home_team.clone(), eh + delta);
        elo.insert(m.away_team.clone(), ea - delta);
    }

    elo
}

pub fn expected_score(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf(-(r_a - r_b) / 400.0))
}

/// Empirical draw share, shrunk toward a typical league rate on small samples.
pub fn draw_rate(table: &MatchTable) -> f64 {
    const DEFAULT_DRAW_RATE: f64 = 0.26;
    const MIN_N: f64 = 200.0;
    let mut n = 0usize;
    let mut draws = 0usize;
    for row in table.rows() {
        match table.outcome(row) {
            Some(Outcome::Draw) => {
                draws += 1;
                n += 1;
            }
            Some(_) => n += 1,
            None => {}
        }
    }
    let raw = if n > 0 {
        draws as f64 / n as f64
    } else {
        DEFAULT_DRAW_RATE
    };
    let w = (n as f64 / MIN_N).clamp(0.0, 1.0);
    ((1.0 - w) * DEFAULT_DRAW_RATE + w * raw).clamp(0.05, 0.60)
}

/// Classifier-shaped baseline built from Elo ratings.
#[derive(Debug, Clone)]
pub struct EloClassifier {
    cfg: EloConfig,
    ratings: HashMap<String, f64>,
    draw_rate: f64,
}

impl EloClassifier {
    pub fn fit(table: &MatchTable) -> Self {
        Self::fit_with(table, EloConfig::default())
    }

    pub fn fit_with(table: &MatchTable, cfg: EloConfig) -> Self {
        Self {
            cfg,
            ratings: compute_elo(table, cfg),
            draw_rate: draw_rate(table),
        }
    }

    pub fn rating(&self, team: &str) -> f64 {
        self.ratings.get(team).copied().unwrap_or(self.cfg.initial)
    }

    /// `[p_away, p_draw, p_home]` for a fixture.
    pub fn class_probs(&self, home: &str, away: &str) -> [f64; 3] {
        let e = expected_score(self.rating(home) + self.cfg.home_adv_pts, self.rating(away));
        // Draws are most likely between evenly matched sides.
        let closeness = 1.0 - (2.0 * e - 1.0).abs();
        let p_draw = self.draw_rate * (0.5 + 0.5 * closeness);
        let p_home = (e - p_draw / 2.0).max(0.01);
        let p_away = (1.0 - e - p_draw / 2.0).max(0.01);
        let sum = p_home + p_draw + p_away;
        [p_away / sum, p_draw / sum, p_home / sum]
    }
}

impl ProbabilityModel for EloClassifier {
    fn name(&self) -> &str {
        "elo"
    }

    fn predict_proba(&self, features: &MatchFeatures) -> anyhow::Result<Vec<f64>> {
        Ok(self
            .class_probs(&features.home_team, &features.away_team)
            .to_vec())
    }
}
