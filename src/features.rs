use crate::config::EngineConfig;
use crate::form::{FormSummary, recent_form};
use crate::head_to_head::{HeadToHead, head_to_head};
use crate::historical_dataset::MatchTable;
use crate::strength::{Venue, team_strength};

/// Positions in [`MatchFeatures::as_slice`]. The order is part of the model
/// contract and must not change.
pub mod idx {
    pub const HOME_STRENGTH: usize = 0;
    pub const AWAY_STRENGTH: usize = 1;
    pub const COMBINED_STRENGTH: usize = 2;
    pub const STRENGTH_DIFF: usize = 3;
    pub const HOME_FORM_POINTS: usize = 4;
    pub const AWAY_FORM_POINTS: usize = 5;
    pub const HOME_GOALS_FOR: usize = 6;
    pub const HOME_GOALS_AGAINST: usize = 7;
    pub const AWAY_GOALS_FOR: usize = 8;
    pub const AWAY_GOALS_AGAINST: usize = 9;
    pub const HOME_WINS: usize = 10;
    pub const AWAY_WINS: usize = 11;
    pub const FORM_GOAL_DIFF: usize = 12;
    pub const H2H_HOME_RATE: usize = 13;
    pub const H2H_DRAW_RATE: usize = 14;
    pub const H2H_AWAY_RATE: usize = 15;
    pub const H2H_MATCHES: usize = 16;
}

pub const FEATURE_COUNT: usize = 17;

/// Fixed-shape model input for one fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFeatures {
    pub home_team: String,
    pub away_team: String,
    values: [f64; FEATURE_COUNT],
}

impl MatchFeatures {
    pub fn build(home: &str, away: &str, table: &MatchTable, cfg: &EngineConfig) -> Self {
        let home_form = recent_form(home, table, cfg.form_window);
        let away_form = recent_form(away, table, cfg.form_window);
        let h2h = head_to_head(home, away, table).ok();
        Self::from_parts(home, away, &home_form, &away_form, h2h.as_ref(), cfg)
    }

    pub fn from_parts(
        home: &str,
        away: &str,
        home_form: &FormSummary,
        away_form: &FormSummary,
        h2h: Option<&HeadToHead>,
        cfg: &EngineConfig,
    ) -> Self {
        let home_strength =
            team_strength(home, home_form, Venue::Home, cfg.form_window, &cfg.strength);
        let away_strength =
            team_strength(away, away_form, Venue::Away, cfg.form_window, &cfg.strength);
        let rates = h2h.copied().unwrap_or_default().to_probabilities();

        let mut v = [0.0_f64; FEATURE_COUNT];
        v[idx::HOME_STRENGTH] = home_strength;
        v[idx::AWAY_STRENGTH] = away_strength;
        v[idx::COMBINED_STRENGTH] = (home_strength + away_strength) / 2.0;
        v[idx::STRENGTH_DIFF] = home_strength - away_strength;
        v[idx::HOME_FORM_POINTS] = home_form.points as f64;
        v[idx::AWAY_FORM_POINTS] = away_form.points as f64;
        v[idx::HOME_GOALS_FOR] = home_form.avg_goals_for();
        v[idx::HOME_GOALS_AGAINST] = home_form.avg_goals_against();
        v[idx::AWAY_GOALS_FOR] = away_form.avg_goals_for();
        v[idx::AWAY_GOALS_AGAINST] = away_form.avg_goals_against();
        v[idx::HOME_WINS] = home_form.wins() as f64;
        v[idx::AWAY_WINS] = away_form.wins() as f64;
        v[idx::FORM_GOAL_DIFF] = (home_form.avg_goals_for() - home_form.avg_goals_against())
            - (away_form.avg_goals_for() - away_form.avg_goals_against());
        v[idx::H2H_HOME_RATE] = rates.home;
        v[idx::H2H_DRAW_RATE] = rates.draw;
        v[idx::H2H_AWAY_RATE] = rates.away;
        v[idx::H2H_MATCHES] = h2h.map_or(0.0, |h| h.matches as f64);

        Self {
            home_team: home.to_string(),
            away_team: away.to_string(),
            values: v,
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, i: usize) -> f64 {
        self.values.get(i).copied().unwrap_or(0.0)
    }

    pub fn strength_gap(&self) -> f64 {
        self.values[idx::STRENGTH_DIFF]
    }
}
