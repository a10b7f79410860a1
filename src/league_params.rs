use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::features::MatchFeatures;
use crate::historical_dataset::MatchTable;
use crate::model_adapter::ScoreModel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeagueParams {
    pub sample_matches: usize,
    pub goals_total_base: f64,
    pub home_adv_goals: f64,
}

impl Default for LeagueParams {
    fn default() -> Self {
        Self {
            sample_matches: 0,
            goals_total_base: 2.60,
            home_adv_goals: 0.0,
        }
    }
}

/// Goal base and home edge from scored rows of the table.
pub fn compute_league_params(table: &MatchTable) -> LeagueParams {
    let mut total_goals = 0.0;
    let mut home_minus_away = 0.0;
    let mut n = 0usize;

    for m in table.rows() {
        let (Some(hg), Some(ag)) = (m.home_goals, m.away_goals) else {
            continue;
        };
        total_goals += (hg as f64) + (ag as f64);
        home_minus_away += (hg as f64) - (ag as f64);
        n += 1;
    }

    let mut out = LeagueParams {
        sample_matches: n,
        ..LeagueParams::default()
    };
    if n > 0 {
        out.goals_total_base = total_goals / (n as f64);
        out.home_adv_goals = home_minus_away / (n as f64);
    }

    // Shrink small samples toward defaults to avoid wild swings.
    const MIN_N: f64 = 200.0;
    let w = ((n as f64) / MIN_N).clamp(0.0, 1.0);
    let d = LeagueParams::default();
    out.goals_total_base = (1.0 - w) * d.goals_total_base + w * out.goals_total_base;
    out.home_adv_goals = (1.0 - w) * d.home_adv_goals + w * out.home_adv_goals;
    out
}

/// Attack and defence multipliers relative to the league average.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamRatios {
    pub matches: usize,
    pub attack: f64,
    pub defence: f64,
}

impl Default for TeamRatios {
    fn default() -> Self {
        Self {
            matches: 0,
            attack: 1.0,
            defence: 1.0,
        }
    }
}

/// Regressor-shaped baseline predicting expected goals for each side.
#[derive(Debug, Clone)]
pub struct GoalsRegressor {
    params: LeagueParams,
    teams: HashMap<String, TeamRatios>,
}

impl GoalsRegressor {
    pub fn fit(table: &MatchTable) -> Self {
        const TEAM_MIN_N: f64 = 10.0;
        let params = compute_league_params(table);
        let per_team_avg = (params.goals_total_base / 2.0).max(0.1);

        let mut totals: HashMap<&str, (usize, f64, f64)> = HashMap::new();
        for m in table.rows() {
            let (Some(hg), Some(ag)) = (m.home_goals, m.away_goals) else {
                continue;
            };
            let home = totals.entry(m.home_team.as_str()).or_default();
            home.0 += 1;
            home.1 += hg as f64;
            home.2 += ag as f64;
            let away = totals.entry(m.away_team.as_str()).or_default();
            away.0 += 1;
            away.1 += ag as f64;
            away.2 += hg as f64;
        }

        let teams = totals
            .into_iter()
            .map(|(team, (n, scored, conceded))| {
                let w = (n as f64 / TEAM_MIN_N).clamp(0.0, 1.0);
                let attack = scored / n as f64 / per_team_avg;
                let defence = conceded / n as f64 / per_team_avg;
                let ratios = TeamRatios {
                    matches: n,
                    attack: (1.0 - w) + w * attack,
                    defence: (1.0 - w) + w * defence,
                };
                (team.to_string(), ratios)
            })
            .collect();

        Self { params, teams }
    }

    pub fn params(&self) -> LeagueParams {
        self.params
    }

    pub fn ratios(&self, team: &str) -> TeamRatios {
        self.teams.get(team).copied().unwrap_or_default()
    }

    pub fn expected_goals(&self, home: &str, away: &str) -> (f64, f64) {
        let h = self.ratios(home);
        let a = self.ratios(away);
        let base_home = (self.params.goals_total_base + self.params.home_adv_goals) / 2.0;
        let base_away = (self.params.goals_total_base - self.params.home_adv_goals) / 2.0;
        let lambda_home = (base_home * h.attack * a.defence).clamp(0.20, 3.80);
        let lambda_away = (base_away * a.attack * h.defence).clamp(0.20, 3.80);
        (lambda_home, lambda_away)
    }
}

impl ScoreModel for GoalsRegressor {
    fn name(&self) -> &str {
        "goals"
    }

    fn predict(&self, features: &MatchFeatures) -> anyhow::Result<(f64, f64)> {
        Ok(self.expected_goals(&features.home_team, &features.away_team))
    }
}
