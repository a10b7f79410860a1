use serde::{Deserialize, Serialize};

use crate::historical_dataset::{MatchRecord, MatchTable};
use crate::outcome::Outcome;

/// Default number of matches in a form window.
pub const FORM_WINDOW: usize = 5;

/// A match result seen from one team's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamResult {
    Win,
    Draw,
    Loss,
}

impl TeamResult {
    pub fn points(self) -> u32 {
        match self {
            TeamResult::Win => 3,
            TeamResult::Draw => 1,
            TeamResult::Loss => 0,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            TeamResult::Win => 'W',
            TeamResult::Draw => 'D',
            TeamResult::Loss => 'L',
        }
    }

    pub fn for_side(outcome: Outcome, played_home: bool) -> Self {
        match (outcome, played_home) {
            (Outcome::Draw, _) => TeamResult::Draw,
            (Outcome::Home, true) | (Outcome::Away, false) => TeamResult::Win,
            _ => TeamResult::Loss,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FormSummary {
    /// Most recent first.
    pub results: Vec<TeamResult>,
    pub points: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    /// Matches in the window that carried a score.
    pub goals_counted: usize,
}

impl FormSummary {
    pub fn form_string(&self) -> String {
        self.results.iter().map(|r| r.symbol()).collect()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn wins(&self) -> usize {
        self.results.iter().filter(|r| **r == TeamResult::Win).count()
    }

    pub fn avg_goals_for(&self) -> f64 {
        if self.goals_counted == 0 {
            return 0.0;
        }
        self.goals_for as f64 / self.goals_counted as f64
    }

    pub fn avg_goals_against(&self) -> f64 {
        if self.goals_counted == 0 {
            return 0.0;
        }
        self.goals_against as f64 / self.goals_counted as f64
    }
}

/// Last `window` results for `team` at either venue.
///
/// Undated and unclassifiable rows never enter the window. Rows sharing a
/// date keep table order, later rows counting as more recent.
pub fn recent_form(team: &str, table: &MatchTable, window: usize) -> FormSummary {
    let mut played: Vec<(usize, &MatchRecord, Outcome)> = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, r)| r.involves(team) && r.date.is_some())
        .filter_map(|(i, r)| table.outcome(r).map(|o| (i, r, o)))
        .collect();
    played.sort_by(|(ia, a, _), (ib, b, _)| b.date.cmp(&a.date).then(ib.cmp(ia)));

    let mut summary = FormSummary::default();
    for (_, row, outcome) in played.into_iter().take(window) {
        let at_home = row.home_team == team;
        let result = TeamResult::for_side(outcome, at_home);
        summary.points += result.points();
        summary.results.push(result);

        if let (Some(hg), Some(ag)) = (row.home_goals, row.away_goals) {
            let (scored, conceded) = if at_home { (hg, ag) } else { (ag, hg) };
            summary.goals_for += scored.max(0) as u32;
            summary.goals_against += conceded.max(0) as u32;
            summary.goals_counted += 1;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::result_codes::RawResult;

    fn row(day: Option<u32>, home: &str, away: &str, hg: i32, ag: i32) -> MatchRecord {
        MatchRecord {
            home_team: home.to_string(),
            away_team: away.to_string(),
            date: day.and_then(|d| NaiveDate::from_ymd_opt(2024, 3, d)),
            result_code: RawResult::encode(
                Outcome::from_goals(hg, ag),
                crate::result_codes::ResultScheme::Text,
            ),
            home_goals: Some(hg),
            away_goals: Some(ag),
        }
    }

    #[test]
    fn form_is_most_recent_first_at_either_venue() {
        let table = MatchTable::new(vec![
            row(Some(1), "Porto", "Braga", 2, 0),
            row(Some(8), "Benfica", "Porto", 1, 1),
            row(Some(15), "Porto", "Vitoria", 0, 1),
            row(Some(22), "Sporting", "Porto", 0, 3),
        ]);
        let form = recent_form("Porto", &table, FORM_WINDOW);
        assert_eq!(form.form_string(), "WLDW");
        assert_eq!(form.points, 7);
        assert_eq!(form.goals_for, 6);
        assert_eq!(form.goals_against, 2);
        assert_eq!(form.wins(), 2);
    }

    #[test]
    fn window_caps_length_and_short_history_is_fine() {
        let rows = (1..=9)
            .map(|d| row(Some(d), "Porto", "Braga", 1, 0))
            .collect::<Vec<_>>();
        let table = MatchTable::new(rows);
        assert_eq!(recent_form("Porto", &table, 5).len(), 5);
        assert_eq!(recent_form("Braga", &table, 3).form_string(), "LLL");
        assert!(recent_form("Chaves", &table, 5).is_empty());
    }

    #[test]
    fn undated_rows_are_excluded() {
        let table = MatchTable::new(vec![
            row(None, "Porto", "Braga", 5, 0),
            row(Some(2), "Porto", "Braga", 0, 0),
        ]);
        assert_eq!(recent_form("Porto", &table, 5).form_string(), "D");
    }

    #[test]
    fn same_day_rows_prefer_later_table_order() {
        let table = MatchTable::new(vec![
            row(Some(3), "Porto", "Braga", 1, 0),
            row(Some(3), "Porto", "Braga", 0, 1),
        ]);
        assert_eq!(recent_form("Porto", &table, 5).form_string(), "LW");
    }
}
