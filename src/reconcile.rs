use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::guard;
use crate::head_to_head::HeadToHead;
use crate::model_adapter::ModelVote;
use crate::outcome::ProbabilityVector;

/// Where the provisional distribution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistributionSource {
    Model,
    HeadToHead,
    Uniform,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciled {
    pub distribution: ProbabilityVector,
    pub provisional: ProbabilityVector,
    pub source: DistributionSource,
    pub home_strength: f64,
    pub away_strength: f64,
    pub blended: bool,
}

/// Model vector if there is one, then head-to-head frequencies, then the
/// equal split.
pub fn provisional(
    vote: Option<&ModelVote>,
    h2h: Option<&HeadToHead>,
) -> (ProbabilityVector, DistributionSource) {
    if let Some(v) = vote.and_then(ModelVote::vector) {
        return (v, DistributionSource::Model);
    }
    match h2h {
        Some(h) if h.matches > 0 => (h.to_probabilities(), DistributionSource::HeadToHead),
        _ => (ProbabilityVector::uniform(), DistributionSource::Uniform),
    }
}

/// Gap above which the strong form split applies.
pub const STRONG_FORM_GAP: f64 = 0.12;
/// Default lower edge of the weak form split.
pub const WEAK_FORM_GAP: f64 = 0.08;

/// Outcome split implied by a home-minus-away strength gap. Gaps within
/// `weak_gap` (capped at [`STRONG_FORM_GAP`]) carry no signal.
pub fn form_distribution(diff: f64, weak_gap: f64) -> Option<ProbabilityVector> {
    let weak_gap = weak_gap.min(STRONG_FORM_GAP);
    if diff < -STRONG_FORM_GAP {
        Some(ProbabilityVector::new(0.22, 0.30, 0.48))
    } else if diff < -weak_gap {
        Some(ProbabilityVector::new(0.26, 0.32, 0.42))
    } else if diff > STRONG_FORM_GAP {
        Some(ProbabilityVector::new(0.48, 0.30, 0.22))
    } else if diff > weak_gap {
        Some(ProbabilityVector::new(0.42, 0.32, 0.26))
    } else {
        None
    }
}

/// Merges model, head-to-head and form signals into one validated
/// distribution.
pub fn reconcile(
    vote: Option<&ModelVote>,
    h2h: Option<&HeadToHead>,
    home_strength: f64,
    away_strength: f64,
    cfg: &EngineConfig,
) -> Reconciled {
    let (provisional, source) = provisional(vote, h2h);
    // Blend weights only mean something on the unit simplex.
    let provisional = guard::validate(provisional, cfg.guard_tolerance);
    let diff = home_strength - away_strength;

    let mut distribution = provisional;
    let mut blended = false;
    // A threshold below the default weak edge widens the weak band to match.
    let weak_gap = cfg.strength_threshold.min(WEAK_FORM_GAP);
    if diff.abs() > cfg.strength_threshold
        && let Some(form) = form_distribution(diff, weak_gap)
    {
        distribution = provisional.blend(&form, cfg.model_weight, cfg.form_weight);
        blended = true;
    }

    Reconciled {
        distribution: guard::validate(distribution, cfg.guard_tolerance),
        provisional,
        source,
        home_strength,
        away_strength,
        blended,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Outcome;

    fn h2h(home: usize, draw: usize, away: usize) -> HeadToHead {
        HeadToHead {
            matches: home + draw + away,
            home_wins: home,
            draws: draw,
            away_wins: away,
        }
    }

    #[test]
    fn model_vector_takes_precedence() {
        let vote = ModelVote::Vector(ProbabilityVector::new(0.5, 0.3, 0.2));
        let (v, src) = provisional(Some(&vote), Some(&h2h(0, 0, 4)));
        assert_eq!(src, DistributionSource::Model);
        assert_eq!(v.home, 0.5);
    }

    #[test]
    fn label_vote_substitutes_head_to_head() {
        let vote = ModelVote::Label(Outcome::Home);
        let (v, src) = provisional(Some(&vote), Some(&h2h(1, 1, 2)));
        assert_eq!(src, DistributionSource::HeadToHead);
        assert!((v.away - 0.5).abs() < 1e-12);
    }

    #[test]
    fn nothing_available_is_uniform() {
        let (v, src) = provisional(None, None);
        assert_eq!(src, DistributionSource::Uniform);
        assert_eq!(v, ProbabilityVector::uniform());
    }

    #[test]
    fn small_gap_leaves_distribution_unchanged() {
        let cfg = EngineConfig::default();
        let vote = ModelVote::Vector(ProbabilityVector::new(0.5, 0.3, 0.2));
        let r = reconcile(Some(&vote), None, 0.55, 0.50, &cfg);
        assert!(!r.blended);
        assert_eq!(r.distribution, ProbabilityVector::new(0.5, 0.3, 0.2));
    }

    #[test]
    fn large_gap_blends_sixty_forty() {
        let cfg = EngineConfig::default();
        let vote = ModelVote::Vector(ProbabilityVector::new(0.5, 0.3, 0.2));
        let r = reconcile(Some(&vote), None, 0.30, 0.60, &cfg);
        assert!(r.blended);
        let expected_home = 0.5 * 0.6 + 0.22 * 0.4;
        let expected_away = 0.2 * 0.6 + 0.48 * 0.4;
        assert!((r.distribution.home - expected_home).abs() < 1e-9);
        assert!((r.distribution.away - expected_away).abs() < 1e-9);
        assert!((r.distribution.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn percent_scale_vote_blends_like_unit_scale() {
        let cfg = EngineConfig::default();
        let percent = ModelVote::Vector(ProbabilityVector::new(50.0, 30.0, 20.0));
        let unit = ModelVote::Vector(ProbabilityVector::new(0.5, 0.3, 0.2));
        let a = reconcile(Some(&percent), None, 0.30, 0.60, &cfg);
        let b = reconcile(Some(&unit), None, 0.30, 0.60, &cfg);
        assert!(a.blended && b.blended);
        for o in Outcome::ALL {
            assert!((a.distribution.get(o) - b.distribution.get(o)).abs() < 1e-9);
        }
    }

    #[test]
    fn unnormalised_vote_keeps_form_weight() {
        let cfg = EngineConfig::default();
        let flat = ModelVote::Vector(ProbabilityVector::new(0.6, 0.6, 0.6));
        let r = reconcile(Some(&flat), None, 0.30, 0.60, &cfg);
        let expected_away = 0.6 / 1.8 * 0.6 + 0.48 * 0.4;
        assert!((r.distribution.away - expected_away).abs() < 1e-9);
    }

    #[test]
    fn form_bands() {
        let w = WEAK_FORM_GAP;
        assert_eq!(form_distribution(0.05, w), None);
        assert_eq!(form_distribution(0.10, w).map(|v| v.home), Some(0.42));
        assert_eq!(form_distribution(0.2, w).map(|v| v.home), Some(0.48));
        assert_eq!(form_distribution(-0.1, w).map(|v| v.away), Some(0.42));
        assert_eq!(form_distribution(-0.3, w).map(|v| v.away), Some(0.48));
        assert_eq!(form_distribution(0.05, 0.03).map(|v| v.home), Some(0.42));
    }

    #[test]
    fn low_threshold_blends_small_gaps() {
        let cfg = EngineConfig {
            strength_threshold: 0.03,
            ..EngineConfig::default()
        };
        let vote = ModelVote::Vector(ProbabilityVector::new(0.5, 0.3, 0.2));
        let r = reconcile(Some(&vote), None, 0.55, 0.50, &cfg);
        assert!(r.blended);
        assert!((r.distribution.home - (0.5 * 0.6 + 0.42 * 0.4)).abs() < 1e-9);

        let r = reconcile(Some(&vote), None, 0.55, 0.50, &EngineConfig::default());
        assert!(!r.blended);
    }
}
