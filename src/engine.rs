use serde::Serialize;
use tracing::{info, warn};

use crate::cache::FormCache;
use crate::config::EngineConfig;
use crate::decision::{Pick, PredictionType, Rule, decide};
use crate::error::PredictError;
use crate::features::{MatchFeatures, idx};
use crate::form::{FormSummary, recent_form};
use crate::head_to_head::{HeadToHead, head_to_head};
use crate::historical_dataset::MatchTable;
use crate::model_adapter::ModelAdapter;
use crate::outcome::{Outcome, ProbabilityVector};
use crate::reconcile::{DistributionSource, reconcile};

/// Representative scoreline shown next to a pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PredictedScore {
    pub home: u8,
    pub away: u8,
}

impl PredictedScore {
    pub fn for_pick(pick: Pick) -> Self {
        let (home, away) = match pick {
            Pick::Single(Outcome::Draw) => (1, 1),
            Pick::Single(Outcome::Away) | Pick::DoubleChance(Outcome::Draw, Outcome::Away) => (1, 2),
            _ => (2, 1),
        };
        Self { home, away }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub home_team: String,
    pub away_team: String,
    pub outcome: Pick,
    pub prediction_type: PredictionType,
    pub probabilities: ProbabilityVector,
    pub confidence: f64,
    pub reasoning: String,
    /// Adapter that voted, or `"unavailable"` when the fallback path ran.
    pub model_label: String,
    pub model_pick: Option<Outcome>,
    pub rule: Rule,
    pub source: DistributionSource,
    pub blended: bool,
    pub home_strength: f64,
    pub away_strength: f64,
    pub home_form: FormSummary,
    pub away_form: FormSummary,
    pub h2h: Option<HeadToHead>,
    pub predicted_score: PredictedScore,
}

/// Stateless prediction entry point. Holds only configuration, so one
/// instance can serve concurrent callers.
#[derive(Debug, Clone, Default)]
pub struct Predictor {
    config: EngineConfig,
}

impl Predictor {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn predict(
        &self,
        home: &str,
        away: &str,
        table: &MatchTable,
        model: &ModelAdapter,
    ) -> Result<PredictionResult, PredictError> {
        let (home, away) = validate_request(home, away)?;
        let window = self.config.form_window;
        let home_form = recent_form(home, table, window);
        let away_form = recent_form(away, table, window);
        Ok(self.run(home, away, table, model, home_form, away_form))
    }

    /// Like [`Predictor::predict`] but serves team form from `cache`.
    pub fn predict_with_cache(
        &self,
        home: &str,
        away: &str,
        table: &MatchTable,
        model: &ModelAdapter,
        cache: &mut FormCache,
    ) -> Result<PredictionResult, PredictError> {
        let (home, away) = validate_request(home, away)?;
        let window = self.config.form_window;
        let home_form = cached_form(cache, home, table, window);
        let away_form = cached_form(cache, away, table, window);
        Ok(self.run(home, away, table, model, home_form, away_form))
    }

    fn run(
        &self,
        home: &str,
        away: &str,
        table: &MatchTable,
        model: &ModelAdapter,
        home_form: FormSummary,
        away_form: FormSummary,
    ) -> PredictionResult {
        let cfg = &self.config;

        let h2h = match head_to_head(home, away, table) {
            Ok(h) => Some(h),
            Err(err) => {
                info!(%err, "head-to-head unavailable");
                None
            }
        };

        let features =
            MatchFeatures::from_parts(home, away, &home_form, &away_form, h2h.as_ref(), cfg);
        let adapter = self.bounded(model);
        let vote = match adapter.vote(&features) {
            Ok(v) => Some(v),
            Err(err) => {
                warn!(%err, model = %model.label(), "model vote failed, using fallback");
                None
            }
        };

        let reconciled = reconcile(
            vote.as_ref(),
            h2h.as_ref(),
            features.get(idx::HOME_STRENGTH),
            features.get(idx::AWAY_STRENGTH),
            cfg,
        );
        let model_pick = vote.as_ref().map(|v| v.label());
        let label = model_pick.unwrap_or_else(|| reconciled.provisional.argmax());
        let decision = decide(&reconciled.distribution, label, &cfg.rules);

        let mut reasoning = decision.reasoning;
        match reconciled.source {
            DistributionSource::Model => {}
            DistributionSource::HeadToHead => {
                reasoning.push_str(&format!(
                    "; probabilities from {} head-to-head matches",
                    h2h.map_or(0, |h| h.matches)
                ));
            }
            DistributionSource::Uniform => {
                reasoning.push_str("; no model probabilities or head-to-head history");
            }
        }
        if reconciled.blended {
            reasoning.push_str(&format!(
                "; adjusted for form (strength {:.2} vs {:.2})",
                reconciled.home_strength, reconciled.away_strength
            ));
        }

        let result = PredictionResult {
            home_team: home.to_string(),
            away_team: away.to_string(),
            outcome: decision.pick,
            prediction_type: decision.prediction_type,
            probabilities: reconciled.distribution,
            confidence: decision.confidence.clamp(0.0, 1.0),
            reasoning,
            model_label: if vote.is_some() {
                model.label()
            } else {
                "unavailable".to_string()
            },
            model_pick,
            rule: decision.rule,
            source: reconciled.source,
            blended: reconciled.blended,
            home_strength: reconciled.home_strength,
            away_strength: reconciled.away_strength,
            home_form,
            away_form,
            h2h,
            predicted_score: PredictedScore::for_pick(decision.pick),
        };

        info!(
            home,
            away,
            outcome = %result.outcome,
            prediction_type = ?result.prediction_type,
            confidence = result.confidence,
            "prediction"
        );
        result
    }

    /// Applies the configured timeout unless the adapter carries its own.
    fn bounded(&self, model: &ModelAdapter) -> ModelAdapter {
        if model.timeout().is_some() || self.config.model_timeout_ms == 0 {
            return model.clone();
        }
        model.clone().with_timeout(self.config.model_timeout())
    }
}

/// Predicts with the default configuration.
pub fn predict(
    home: &str,
    away: &str,
    table: &MatchTable,
    model: &ModelAdapter,
) -> Result<PredictionResult, PredictError> {
    Predictor::default().predict(home, away, table, model)
}

fn validate_request<'a>(home: &'a str, away: &'a str) -> Result<(&'a str, &'a str), PredictError> {
    let home = home.trim();
    let away = away.trim();
    if home.is_empty() || away.is_empty() {
        return Err(PredictError::InvalidRequest(
            "team names must not be empty".to_string(),
        ));
    }
    if home == away {
        return Err(PredictError::InvalidRequest(format!(
            "{home} cannot play itself"
        )));
    }
    Ok((home, away))
}

fn cached_form(cache: &mut FormCache, team: &str, table: &MatchTable, window: usize) -> FormSummary {
    let key = team.to_string();
    if let Some(form) = cache.get(&key) {
        return form.clone();
    }
    let form = recent_form(team, table, window);
    cache.insert(key, form.clone());
    form
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_identical_teams() {
        assert!(matches!(
            validate_request(" ", "B"),
            Err(PredictError::InvalidRequest(_))
        ));
        assert!(matches!(
            validate_request("Roma", " Roma "),
            Err(PredictError::InvalidRequest(_))
        ));
        assert_eq!(validate_request(" Roma", "Lazio "), Ok(("Roma", "Lazio")));
    }

    #[test]
    fn scorelines_follow_pick() {
        assert_eq!(
            PredictedScore::for_pick(Pick::Single(Outcome::Home)),
            PredictedScore { home: 2, away: 1 }
        );
        assert_eq!(
            PredictedScore::for_pick(Pick::double(Outcome::Away, Outcome::Draw)),
            PredictedScore { home: 1, away: 2 }
        );
        assert_eq!(
            PredictedScore::for_pick(Pick::double(Outcome::Home, Outcome::Away)),
            PredictedScore { home: 2, away: 1 }
        );
        assert_eq!(
            PredictedScore::for_pick(Pick::Single(Outcome::Draw)),
            PredictedScore { home: 1, away: 1 }
        );
    }
}
