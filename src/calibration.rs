use serde::Serialize;

use crate::outcome::{Outcome, ProbabilityVector};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    pub accuracy: f64,
}

impl Metrics {
    fn empty() -> Self {
        Self {
            samples: 0,
            brier: 0.0,
            log_loss: 0.0,
            accuracy: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationBin {
    pub bucket_start: f64,
    pub bucket_end: f64,
    pub count: usize,
    pub avg_pred: f64,
    pub actual_rate: f64,
}

pub fn empirical_outcome_probs(outcomes: &[Outcome]) -> ProbabilityVector {
    if outcomes.is_empty() {
        return ProbabilityVector::uniform();
    }

    let mut home = 0usize;
    let mut draw = 0usize;
    let mut away = 0usize;
    for outcome in outcomes {
        match outcome {
            Outcome::Home => home += 1,
            Outcome::Draw => draw += 1,
            Outcome::Away => away += 1,
        }
    }
    let n = outcomes.len() as f64;
    ProbabilityVector::new(home as f64 / n, draw as f64 / n, away as f64 / n)
}

pub fn evaluate_probs(predictions: &[ProbabilityVector], outcomes: &[Outcome]) -> Metrics {
    if predictions.is_empty() || outcomes.is_empty() || predictions.len() != outcomes.len() {
        return Metrics::empty();
    }

    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;

    for (p, outcome) in predictions.iter().zip(outcomes) {
        let y = one_hot(*outcome);
        brier_sum +=
            (p.home - y.home).powi(2) + (p.draw - y.draw).powi(2) + (p.away - y.away).powi(2);

        let actual_prob = p.get(*outcome).clamp(1e-12, 1.0);
        log_loss_sum += -actual_prob.ln();

        if p.argmax() == *outcome {
            correct += 1;
        }
    }

    let n = predictions.len() as f64;
    Metrics {
        samples: predictions.len(),
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        accuracy: correct as f64 / n,
    }
}

pub fn calibration_bins(
    predictions: &[ProbabilityVector],
    outcomes: &[Outcome],
    class: Outcome,
    bins: usize,
) -> Vec<CalibrationBin> {
    let bins = bins.max(2);
    let mut counts = vec![0usize; bins];
    let mut pred_sum = vec![0.0_f64; bins];
    let mut actual_sum = vec![0.0_f64; bins];

    for (p, outcome) in predictions.iter().zip(outcomes) {
        let class_prob = p.get(class).clamp(0.0, 1.0);
        let idx = ((class_prob * bins as f64).floor() as usize).min(bins - 1);
        counts[idx] += 1;
        pred_sum[idx] += class_prob;
        if *outcome == class {
            actual_sum[idx] += 1.0;
        }
    }

    let mut out = Vec::with_capacity(bins);
    for i in 0..bins {
        let count = counts[i];
        let (avg_pred, actual_rate) = if count > 0 {
            (pred_sum[i] / count as f64, actual_sum[i] / count as f64)
        } else {
            (0.0, 0.0)
        };
        out.push(CalibrationBin {
            bucket_start: i as f64 / bins as f64,
            bucket_end: (i + 1) as f64 / bins as f64,
            count,
            avg_pred,
            actual_rate,
        });
    }
    out
}

/// Count-weighted gap between predicted and observed rates, averaged over the
/// three outcome classes.
pub fn expected_calibration_error(
    predictions: &[ProbabilityVector],
    outcomes: &[Outcome],
    bins: usize,
) -> f64 {
    let n = predictions.len().min(outcomes.len());
    if n == 0 {
        return 0.0;
    }
    let mut total = 0.0_f64;
    for class in Outcome::ALL {
        let gap: f64 = calibration_bins(predictions, outcomes, class, bins)
            .iter()
            .map(|b| b.count as f64 * (b.avg_pred - b.actual_rate).abs())
            .sum();
        total += gap / n as f64;
    }
    total / Outcome::ALL.len() as f64
}

fn one_hot(outcome: Outcome) -> ProbabilityVector {
    match outcome {
        Outcome::Home => ProbabilityVector::new(1.0, 0.0, 0.0),
        Outcome::Draw => ProbabilityVector::new(0.0, 1.0, 0.0),
        Outcome::Away => ProbabilityVector::new(0.0, 0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions_have_zero_brier() {
        let preds = vec![
            ProbabilityVector::new(1.0, 0.0, 0.0),
            ProbabilityVector::new(0.0, 1.0, 0.0),
            ProbabilityVector::new(0.0, 0.0, 1.0),
        ];
        let outcomes = vec![Outcome::Home, Outcome::Draw, Outcome::Away];
        let m = evaluate_probs(&preds, &outcomes);
        assert_eq!(m.samples, 3);
        assert!(m.brier < 1e-12);
        assert_eq!(m.accuracy, 1.0);
        assert!(expected_calibration_error(&preds, &outcomes, 10) < 1e-12);
    }

    #[test]
    fn uniform_predictions_score_log_three() {
        let preds = vec![ProbabilityVector::uniform(); 4];
        let outcomes = vec![Outcome::Home, Outcome::Away, Outcome::Draw, Outcome::Home];
        let m = evaluate_probs(&preds, &outcomes);
        assert!((m.log_loss - 3.0_f64.ln()).abs() < 1e-9);
        assert!((m.brier - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_lengths_yield_empty_metrics() {
        let m = evaluate_probs(&[ProbabilityVector::uniform()], &[]);
        assert_eq!(m.samples, 0);
    }

    #[test]
    fn empirical_rates() {
        let p = empirical_outcome_probs(&[Outcome::Home, Outcome::Home, Outcome::Away, Outcome::Draw]);
        assert_eq!(p.home, 0.5);
        assert_eq!(p.away, 0.25);
    }
}
