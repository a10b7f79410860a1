use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::outcome::{Outcome, ProbabilityVector};

/// The outcome (or pair of outcomes) a prediction backs.
///
/// Serialized as `"Home"`, `"Draw"`, `"Away"`, `"1X"`, `"X2"` or `"12"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Pick {
    Single(Outcome),
    /// Always stored in canonical order, home side first.
    DoubleChance(Outcome, Outcome),
}

impl Pick {
    /// Pairs two distinct outcomes; returns a single pick if they are equal.
    pub fn double(a: Outcome, b: Outcome) -> Self {
        if a == b {
            return Pick::Single(a);
        }
        if a.rank() < b.rank() {
            Pick::DoubleChance(a, b)
        } else {
            Pick::DoubleChance(b, a)
        }
    }

    pub fn covers(&self, outcome: Outcome) -> bool {
        match self {
            Pick::Single(o) => *o == outcome,
            Pick::DoubleChance(a, b) => *a == outcome || *b == outcome,
        }
    }

    /// Probability mass behind the pick.
    pub fn mass(&self, dist: &ProbabilityVector) -> f64 {
        match self {
            Pick::Single(o) => dist.get(*o),
            Pick::DoubleChance(a, b) => dist.get(*a) + dist.get(*b),
        }
    }

    pub fn notation(&self) -> String {
        match self {
            Pick::Single(o) => o.label().to_string(),
            Pick::DoubleChance(a, b) => format!("{}{}", a.symbol(), b.symbol()),
        }
    }

    pub fn is_double_chance(&self) -> bool {
        matches!(self, Pick::DoubleChance(..))
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.notation())
    }
}

impl FromStr for Pick {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Home" | "1" => Ok(Pick::Single(Outcome::Home)),
            "Draw" | "X" => Ok(Pick::Single(Outcome::Draw)),
            "Away" | "2" => Ok(Pick::Single(Outcome::Away)),
            "1X" | "X1" => Ok(Pick::double(Outcome::Home, Outcome::Draw)),
            "X2" | "2X" => Ok(Pick::double(Outcome::Draw, Outcome::Away)),
            "12" | "21" => Ok(Pick::double(Outcome::Home, Outcome::Away)),
            other => Err(format!("unknown pick notation {other:?}")),
        }
    }
}

impl From<Pick> for String {
    fn from(pick: Pick) -> Self {
        pick.notation()
    }
}

impl TryFrom<String> for Pick {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredictionType {
    Single,
    DoubleChance,
    Adjusted,
}

/// Which decision rule produced a result, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rule {
    Agreement,
    DrawDominance,
    Uncertainty,
    HistoricalOverride,
    NearUniform,
}

impl Rule {
    pub const ALL: [Rule; 5] = [
        Rule::Agreement,
        Rule::DrawDominance,
        Rule::Uncertainty,
        Rule::HistoricalOverride,
        Rule::NearUniform,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    /// Arg-max probability needed to accept an agreeing model pick.
    pub agreement: f64,
    pub draw_dominance: f64,
    /// No outcome may exceed this for the two-way hedge.
    pub uncertainty: f64,
    /// Probability at which history overrides the model.
    pub dominance: f64,
    /// Max spread for a distribution to count as near-uniform.
    pub near_uniform_band: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            agreement: 0.40,
            draw_dominance: 0.50,
            uncertainty: 0.45,
            dominance: 0.50,
            near_uniform_band: 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub pick: Pick,
    pub prediction_type: PredictionType,
    pub confidence: f64,
    pub rule: Rule,
    pub reasoning: String,
}

/// Applies the first matching rule. Always returns a decision.
///
/// The hedge rule additionally needs a spread wider than the near-uniform
/// band, so an almost flat distribution falls through to the model's pick.
pub fn decide(dist: &ProbabilityVector, model_label: Outcome, t: &DecisionThresholds) -> Decision {
    let ranked = dist.ranked();
    let (top, p_top) = ranked[0];

    if model_label == top && p_top > t.agreement {
        return Decision {
            pick: Pick::Single(top),
            prediction_type: PredictionType::Single,
            confidence: p_top,
            rule: Rule::Agreement,
            reasoning: format!(
                "Model and blended probabilities agree on {} ({})",
                top,
                pct(p_top)
            ),
        };
    }

    if dist.draw > t.draw_dominance && model_label != Outcome::Draw {
        let pick = Pick::double(model_label, Outcome::Draw);
        return Decision {
            pick,
            prediction_type: PredictionType::DoubleChance,
            confidence: pick.mass(dist),
            rule: Rule::DrawDominance,
            reasoning: format!(
                "Draw is dominant at {} while the model favours {}; covering {}",
                pct(dist.draw),
                model_label,
                pick
            ),
        };
    }

    if model_label != top && p_top <= t.uncertainty && dist.spread() > t.near_uniform_band {
        let pick = Pick::double(ranked[0].0, ranked[1].0);
        return Decision {
            pick,
            prediction_type: PredictionType::DoubleChance,
            confidence: pick.mass(dist),
            rule: Rule::Uncertainty,
            reasoning: format!(
                "Model favours {} but probabilities lean {} with no outcome above {}; covering {}",
                model_label,
                top,
                pct(t.uncertainty),
                pick
            ),
        };
    }

    let dominant: Vec<Outcome> = Outcome::ALL
        .into_iter()
        .filter(|o| dist.get(*o) > t.dominance)
        .collect();
    if let &[only] = dominant.as_slice()
        && only != model_label
    {
        return Decision {
            pick: Pick::Single(only),
            prediction_type: PredictionType::Adjusted,
            confidence: dist.get(only),
            rule: Rule::HistoricalOverride,
            reasoning: format!(
                "Model pick {} overridden: {} holds {}",
                model_label,
                only,
                pct(dist.get(only))
            ),
        };
    }

    let p_label = dist.get(model_label);
    let reasoning = if dist.spread() <= t.near_uniform_band {
        format!(
            "Outcomes within {} of each other; keeping model pick {} with low confidence ({})",
            pct(t.near_uniform_band),
            model_label,
            pct(p_label)
        )
    } else {
        format!(
            "No strong signal; keeping model pick {} ({})",
            model_label,
            pct(p_label)
        )
    };
    Decision {
        pick: Pick::Single(model_label),
        prediction_type: PredictionType::Single,
        confidence: p_label,
        rule: Rule::NearUniform,
        reasoning,
    }
}

fn pct(p: f64) -> String {
    format!("{:.1}%", p * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(home: f64, draw: f64, away: f64, model: Outcome) -> Decision {
        decide(
            &ProbabilityVector::new(home, draw, away),
            model,
            &DecisionThresholds::default(),
        )
    }

    #[test]
    fn agreement() {
        let d = run(0.55, 0.25, 0.20, Outcome::Home);
        assert_eq!(d.pick, Pick::Single(Outcome::Home));
        assert_eq!(d.prediction_type, PredictionType::Single);
        assert_eq!(d.rule, Rule::Agreement);
        assert!((d.confidence - 0.55).abs() < 1e-9);
        assert!(d.reasoning.contains("55.0%"));
    }

    #[test]
    fn draw_dominance_pairs_model_pick_with_draw() {
        let d = run(0.20, 0.60, 0.20, Outcome::Home);
        assert_eq!(d.pick.notation(), "1X");
        assert_eq!(d.prediction_type, PredictionType::DoubleChance);
        assert!((d.confidence - 0.80).abs() < 1e-9);

        let d = run(0.15, 0.55, 0.30, Outcome::Away);
        assert_eq!(d.pick.notation(), "X2");
    }

    #[test]
    fn disagreement_hedges_on_top_two() {
        let d = run(0.20, 0.40, 0.40, Outcome::Home);
        assert_eq!(d.pick.notation(), "X2");
        assert_eq!(d.rule, Rule::Uncertainty);
        assert!((d.confidence - 0.80).abs() < 1e-9);

        let d = run(0.42, 0.16, 0.42, Outcome::Draw);
        assert_eq!(d.pick.notation(), "12");
    }

    #[test]
    fn historical_override() {
        let d = run(0.15, 0.20, 0.65, Outcome::Home);
        assert_eq!(d.pick, Pick::Single(Outcome::Away));
        assert_eq!(d.prediction_type, PredictionType::Adjusted);
        assert_eq!(d.rule, Rule::HistoricalOverride);
        assert!(d.reasoning.contains("overridden"));
    }

    #[test]
    fn near_uniform_keeps_model_pick() {
        let d = run(0.35, 0.33, 0.32, Outcome::Draw);
        assert_eq!(d.pick, Pick::Single(Outcome::Draw));
        assert_eq!(d.prediction_type, PredictionType::Single);
        assert_eq!(d.rule, Rule::NearUniform);
        assert!((d.confidence - 0.33).abs() < 1e-9);
    }

    #[test]
    fn agreement_wins_over_later_rules() {
        // Also satisfies draw dominance for any other label.
        let d = run(0.10, 0.70, 0.20, Outcome::Draw);
        assert_eq!(d.rule, Rule::Agreement);
        // Also satisfies the override condition's threshold.
        let d = run(0.60, 0.20, 0.20, Outcome::Home);
        assert_eq!(d.rule, Rule::Agreement);
    }

    #[test]
    fn catch_all_without_near_uniform_shape() {
        let d = run(0.48, 0.30, 0.22, Outcome::Away);
        assert_eq!(d.rule, Rule::NearUniform);
        assert_eq!(d.pick, Pick::Single(Outcome::Away));
        assert!((d.confidence - 0.22).abs() < 1e-9);
    }

    #[test]
    fn pick_notation_round_trips_through_serde() {
        for pick in [
            Pick::Single(Outcome::Home),
            Pick::double(Outcome::Draw, Outcome::Home),
            Pick::double(Outcome::Away, Outcome::Draw),
            Pick::double(Outcome::Away, Outcome::Home),
        ] {
            let json = serde_json::to_string(&pick).unwrap();
            assert_eq!(serde_json::from_str::<Pick>(&json).unwrap(), pick);
        }
        assert_eq!(Pick::double(Outcome::Draw, Outcome::Home).notation(), "1X");
        assert!("Z".parse::<Pick>().is_err());
    }
}
