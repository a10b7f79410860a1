use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PredictError;
use crate::outcome::Outcome;

/// Rows inspected when deciding how a table encodes its results.
const SAMPLE_SIZE: usize = 64;

/// A result cell exactly as it was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawResult {
    Text(String),
    Code(i64),
    Missing,
}

impl RawResult {
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("nan") || s == "-" {
            return RawResult::Missing;
        }
        if let Ok(code) = s.parse::<i64>() {
            return RawResult::Code(code);
        }
        // Some exports write integer classes as floats ("2.0").
        if let Ok(f) = s.parse::<f64>()
            && f.fract() == 0.0
            && f.is_finite()
        {
            return RawResult::Code(f as i64);
        }
        RawResult::Text(s.to_string())
    }

    /// Encodes a known outcome in the given scheme.
    pub fn encode(outcome: Outcome, scheme: ResultScheme) -> Self {
        match scheme {
            ResultScheme::Text => RawResult::Text(
                match outcome {
                    Outcome::Home => "H",
                    Outcome::Draw => "D",
                    Outcome::Away => "A",
                }
                .to_string(),
            ),
            ResultScheme::Integer => RawResult::Code(outcome.class_index() as i64),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RawResult::Missing)
    }
}

/// How a table encodes match results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultScheme {
    /// `H` / `D` / `A`.
    Text,
    /// `2` home, `1` draw, `0` away.
    Integer,
}

/// Inspects a sample of non-missing codes and picks the encoding by majority.
pub fn detect_scheme<'a>(
    codes: impl IntoIterator<Item = &'a RawResult>,
) -> Result<ResultScheme, PredictError> {
    let mut text_votes = 0usize;
    let mut int_votes = 0usize;
    let mut inspected = 0usize;

    for code in codes.into_iter().filter(|c| !c.is_missing()).take(SAMPLE_SIZE) {
        inspected += 1;
        match code {
            RawResult::Text(s) if text_outcome(s).is_some() => text_votes += 1,
            RawResult::Code(n) if int_outcome(*n).is_some() => int_votes += 1,
            _ => {}
        }
    }

    if text_votes > int_votes {
        Ok(ResultScheme::Text)
    } else if int_votes > text_votes {
        Ok(ResultScheme::Integer)
    } else {
        Err(PredictError::AmbiguousEncoding(format!(
            "{inspected} sampled codes, {text_votes} text / {int_votes} integer"
        )))
    }
}

/// Like [`detect_scheme`] but falls back to the integer scheme.
pub fn detect_or_default<'a>(codes: impl IntoIterator<Item = &'a RawResult>) -> ResultScheme {
    match detect_scheme(codes) {
        Ok(scheme) => scheme,
        Err(err) => {
            warn!(%err, "defaulting to integer result scheme");
            ResultScheme::Integer
        }
    }
}

/// Classifies one cell under an already-detected scheme. Cells that do not
/// belong to the scheme are unclassifiable rather than re-detected.
pub fn classify(raw: &RawResult, scheme: ResultScheme) -> Option<Outcome> {
    match (scheme, raw) {
        (ResultScheme::Text, RawResult::Text(s)) => text_outcome(s),
        (ResultScheme::Integer, RawResult::Code(n)) => int_outcome(*n),
        _ => None,
    }
}

fn text_outcome(s: &str) -> Option<Outcome> {
    match s.trim().to_ascii_uppercase().as_str() {
        "H" | "HOME" => Some(Outcome::Home),
        "D" | "DRAW" => Some(Outcome::Draw),
        "A" | "AWAY" => Some(Outcome::Away),
        _ => None,
    }
}

fn int_outcome(n: i64) -> Option<Outcome> {
    usize::try_from(n).ok().and_then(Outcome::from_class_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawResult {
        RawResult::Text(s.to_string())
    }

    #[test]
    fn parse_distinguishes_codes_and_text() {
        assert_eq!(RawResult::parse(" H "), text("H"));
        assert_eq!(RawResult::parse("2"), RawResult::Code(2));
        assert_eq!(RawResult::parse("1.0"), RawResult::Code(1));
        assert_eq!(RawResult::parse(""), RawResult::Missing);
        assert_eq!(RawResult::parse("NaN"), RawResult::Missing);
    }

    #[test]
    fn detects_text_scheme() {
        let codes = vec![text("H"), RawResult::Missing, text("D"), text("A")];
        assert_eq!(detect_scheme(&codes), Ok(ResultScheme::Text));
    }

    #[test]
    fn detects_integer_scheme() {
        let codes = vec![RawResult::Code(2), RawResult::Code(0), RawResult::Code(1)];
        assert_eq!(detect_scheme(&codes), Ok(ResultScheme::Integer));
    }

    #[test]
    fn empty_sample_is_ambiguous_and_defaults_to_integer() {
        let codes: Vec<RawResult> = vec![RawResult::Missing];
        assert!(matches!(
            detect_scheme(&codes),
            Err(PredictError::AmbiguousEncoding(_))
        ));
        assert_eq!(detect_or_default(&codes), ResultScheme::Integer);
    }

    #[test]
    fn integer_convention_is_zero_away_two_home() {
        let s = ResultScheme::Integer;
        assert_eq!(classify(&RawResult::Code(0), s), Some(Outcome::Away));
        assert_eq!(classify(&RawResult::Code(1), s), Some(Outcome::Draw));
        assert_eq!(classify(&RawResult::Code(2), s), Some(Outcome::Home));
        assert_eq!(classify(&RawResult::Code(3), s), None);
    }

    #[test]
    fn classification_does_not_switch_scheme_per_row() {
        assert_eq!(classify(&text("H"), ResultScheme::Integer), None);
        assert_eq!(classify(&RawResult::Code(2), ResultScheme::Text), None);
    }

    #[test]
    fn encode_matches_classify() {
        for scheme in [ResultScheme::Text, ResultScheme::Integer] {
            for outcome in Outcome::ALL {
                assert_eq!(classify(&RawResult::encode(outcome, scheme), scheme), Some(outcome));
            }
        }
    }
}
