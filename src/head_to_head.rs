use serde::{Deserialize, Serialize};

use crate::error::PredictError;
use crate::historical_dataset::{MatchRecord, MatchTable};
use crate::outcome::{Outcome, ProbabilityVector};

/// Outcome counts for one fixture in a fixed venue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HeadToHead {
    pub matches: usize,
    pub home_wins: usize,
    pub draws: usize,
    pub away_wins: usize,
}

impl HeadToHead {
    fn record(&mut self, outcome: Outcome) {
        self.matches += 1;
        match outcome {
            Outcome::Home => self.home_wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Away => self.away_wins += 1,
        }
    }

    /// Frequencies on the 0-100 scale.
    pub fn percentages(&self) -> ProbabilityVector {
        if self.matches == 0 {
            return ProbabilityVector::uniform().map(|p| p * 100.0);
        }
        let n = self.matches as f64;
        ProbabilityVector::new(
            self.home_wins as f64 * 100.0 / n,
            self.draws as f64 * 100.0 / n,
            self.away_wins as f64 * 100.0 / n,
        )
    }

    pub fn to_probabilities(&self) -> ProbabilityVector {
        ProbabilityVector::from_percent_scale(self.percentages())
    }
}

/// Counts results of `home` hosting `away`. Reverse fixtures are not counted.
///
/// Rows whose result cannot be classified are skipped. When nothing is left,
/// `NoHistoricalData` is returned so callers can pick their own fallback.
pub fn head_to_head(home: &str, away: &str, table: &MatchTable) -> Result<HeadToHead, PredictError> {
    let mut h2h = HeadToHead::default();
    for row in table.rows() {
        if row.home_team != home || row.away_team != away {
            continue;
        }
        if let Some(outcome) = table.outcome(row) {
            h2h.record(outcome);
        }
    }

    if h2h.matches == 0 {
        return Err(PredictError::NoHistoricalData {
            home: home.to_string(),
            away: away.to_string(),
        });
    }
    Ok(h2h)
}

/// Latest meetings in either venue order, most recent first.
pub fn recent_meetings<'a>(
    home: &str,
    away: &str,
    table: &'a MatchTable,
    limit: usize,
) -> Vec<&'a MatchRecord> {
    let mut rows: Vec<(usize, &MatchRecord)> = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            (r.home_team == home && r.away_team == away)
                || (r.home_team == away && r.away_team == home)
        })
        .collect();
    rows.sort_by(|(ia, a), (ib, b)| b.date.cmp(&a.date).then(ib.cmp(ia)));
    rows.into_iter().take(limit).map(|(_, r)| r).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result_codes::RawResult;

    fn row(home: &str, away: &str, code: &str) -> MatchRecord {
        MatchRecord {
            home_team: home.to_string(),
            away_team: away.to_string(),
            date: None,
            result_code: RawResult::parse(code),
            home_goals: None,
            away_goals: None,
        }
    }

    #[test]
    fn counts_only_exact_venue_order() {
        let table = MatchTable::new(vec![
            row("Lyon", "Nice", "H"),
            row("Lyon", "Nice", "H"),
            row("Lyon", "Nice", "D"),
            row("Lyon", "Nice", "A"),
            row("Nice", "Lyon", "H"),
        ]);
        let h2h = head_to_head("Lyon", "Nice", &table).unwrap();
        assert_eq!(h2h.matches, 4);
        assert_eq!(h2h.home_wins, 2);
        let pct = h2h.percentages();
        assert!((pct.home - 50.0).abs() < 1e-9);
        assert!((pct.draw - 25.0).abs() < 1e-9);
        let p = h2h.to_probabilities();
        assert!((p.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn no_rows_is_a_sentinel_not_a_uniform_vector() {
        let table = MatchTable::new(vec![row("Nice", "Lyon", "H")]);
        let err = head_to_head("Lyon", "Nice", &table).unwrap_err();
        assert!(matches!(err, PredictError::NoHistoricalData { .. }));
    }

    #[test]
    fn unclassifiable_rows_are_ignored() {
        let table = MatchTable::new(vec![
            row("Lyon", "Nice", "H"),
            row("Lyon", "Nice", "?"),
            row("Lyon", "Nice", ""),
        ]);
        assert_eq!(head_to_head("Lyon", "Nice", &table).unwrap().matches, 1);
    }

    #[test]
    fn recent_meetings_cover_both_venues() {
        let table = MatchTable::new(vec![
            row("Lyon", "Nice", "H"),
            row("Nice", "Lyon", "D"),
            row("Lyon", "Metz", "A"),
        ]);
        let meetings = recent_meetings("Lyon", "Nice", &table, 5);
        assert_eq!(meetings.len(), 2);
        assert_eq!(meetings[0].home_team, "Nice");
    }
}
