//! Heuristic team strength on a `[0, 1]` scale.
//!
//! This is an internal rating used to decide whether recent form should nudge
//! a distribution. It is not a validated rating system. Teams with a short
//! history are padded with pseudo-results derived from a SHA-256 of the team
//! name, so the same name always yields the same baseline.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::form::{FormSummary, TeamResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Venue {
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrengthConfig {
    pub home_advantage: f64,
    /// Away penalty for teams rated above `strong_cutoff`.
    pub away_penalty_strong: f64,
    pub away_penalty_weak: f64,
    pub strong_cutoff: f64,
}

impl Default for StrengthConfig {
    fn default() -> Self {
        Self {
            home_advantage: 0.08,
            away_penalty_strong: 0.02,
            away_penalty_weak: 0.05,
            strong_cutoff: 0.6,
        }
    }
}

/// Pseudo-results for a team, most recent first. Pure in `team`.
pub fn identity_results(team: &str, window: usize) -> Vec<TeamResult> {
    let digest = Sha256::digest(team.as_bytes());
    let seed = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as u64;
    (0..window as u64)
        .map(|i| match (seed + i * 7919) % 100 {
            0..40 => TeamResult::Win,
            40..70 => TeamResult::Draw,
            _ => TeamResult::Loss,
        })
        .collect()
}

/// Recency-weighted points share over the window, before venue adjustment.
pub fn form_rating(team: &str, form: &FormSummary, window: usize) -> f64 {
    if window == 0 {
        return 0.5;
    }
    let identity = identity_results(team, window);
    let mut earned = 0.0_f64;
    let mut possible = 0.0_f64;
    for (i, fallback) in identity.iter().enumerate() {
        let result = form.results.get(i).copied().unwrap_or(*fallback);
        // Most recent match weighs 1.0 + 0.2 * (window - 1); the oldest 1.0.
        let weight = 1.0 + 0.2 * (window - 1 - i) as f64;
        earned += weight * result.points() as f64;
        possible += weight * 3.0;
    }
    earned / possible
}

pub fn team_strength(
    team: &str,
    form: &FormSummary,
    venue: Venue,
    window: usize,
    cfg: &StrengthConfig,
) -> f64 {
    let base = form_rating(team, form, window);
    let adjusted = match venue {
        Venue::Home => base + cfg.home_advantage,
        Venue::Away if base > cfg.strong_cutoff => base - cfg.away_penalty_strong,
        Venue::Away => base - cfg.away_penalty_weak,
    };
    adjusted.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(results: &[TeamResult]) -> FormSummary {
        FormSummary {
            results: results.to_vec(),
            points: results.iter().map(|r| r.points()).sum(),
            ..FormSummary::default()
        }
    }

    #[test]
    fn identity_is_deterministic_per_name() {
        assert_eq!(identity_results("Ajax", 5), identity_results("Ajax", 5));
        assert_eq!(identity_results("Ajax", 5).len(), 5);
        let empty = FormSummary::default();
        let cfg = StrengthConfig::default();
        assert_eq!(
            team_strength("Ajax", &empty, Venue::Home, 5, &cfg),
            team_strength("Ajax", &empty, Venue::Home, 5, &cfg)
        );
    }

    #[test]
    fn full_real_form_overrides_identity() {
        let wins = form(&[TeamResult::Win; 5]);
        assert!((form_rating("Ajax", &wins, 5) - 1.0).abs() < 1e-12);
        assert!((form_rating("PSV", &wins, 5) - 1.0).abs() < 1e-12);
        let losses = form(&[TeamResult::Loss; 5]);
        assert_eq!(form_rating("Ajax", &losses, 5), 0.0);
    }

    #[test]
    fn recent_results_weigh_more() {
        let recent_win = form(&[
            TeamResult::Win,
            TeamResult::Loss,
            TeamResult::Loss,
            TeamResult::Loss,
            TeamResult::Loss,
        ]);
        let old_win = form(&[
            TeamResult::Loss,
            TeamResult::Loss,
            TeamResult::Loss,
            TeamResult::Loss,
            TeamResult::Win,
        ]);
        assert!(form_rating("x", &recent_win, 5) > form_rating("x", &old_win, 5));
    }

    #[test]
    fn venue_adjustment_is_clamped() {
        let cfg = StrengthConfig::default();
        let wins = form(&[TeamResult::Win; 5]);
        assert_eq!(team_strength("Ajax", &wins, Venue::Home, 5, &cfg), 1.0);
        let away = team_strength("Ajax", &wins, Venue::Away, 5, &cfg);
        assert!((away - 0.98).abs() < 1e-12);
        let losses = form(&[TeamResult::Loss; 5]);
        assert_eq!(team_strength("Ajax", &losses, Venue::Away, 5, &cfg), 0.0);
    }
}
