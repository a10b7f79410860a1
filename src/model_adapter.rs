use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PredictError;
use crate::features::MatchFeatures;
use crate::outcome::{Outcome, ProbabilityVector};

/// A trained model exposing class probabilities as `[p_away, p_draw, p_home]`.
pub trait ProbabilityModel: Send + Sync {
    fn name(&self) -> &str;
    fn predict_proba(&self, features: &MatchFeatures) -> anyhow::Result<Vec<f64>>;
}

/// A trained model predicting `(home_score, away_score)`.
pub trait ScoreModel: Send + Sync {
    fn name(&self) -> &str;
    fn predict(&self, features: &MatchFeatures) -> anyhow::Result<(f64, f64)>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelShape {
    Classifier,
    Regressor,
}

/// What a model said about one fixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelVote {
    Vector(ProbabilityVector),
    Label(Outcome),
}

impl ModelVote {
    /// The single outcome the model prefers.
    pub fn label(&self) -> Outcome {
        match self {
            ModelVote::Vector(v) => v.argmax(),
            ModelVote::Label(o) => *o,
        }
    }

    pub fn vector(&self) -> Option<ProbabilityVector> {
        match self {
            ModelVote::Vector(v) => Some(*v),
            ModelVote::Label(_) => None,
        }
    }
}

#[derive(Clone)]
enum Provider {
    Classifier(Arc<dyn ProbabilityModel>),
    Regressor(Arc<dyn ScoreModel>),
}

enum RawOutput {
    Proba(Vec<f64>),
    Scores(f64, f64),
}

impl Provider {
    fn run(&self, features: &MatchFeatures) -> anyhow::Result<RawOutput> {
        match self {
            Provider::Classifier(m) => m.predict_proba(features).map(RawOutput::Proba),
            Provider::Regressor(m) => m.predict(features).map(|(h, a)| RawOutput::Scores(h, a)),
        }
    }

    fn name(&self) -> &str {
        match self {
            Provider::Classifier(m) => m.name(),
            Provider::Regressor(m) => m.name(),
        }
    }
}

/// Uniform front for both model shapes. The shape is fixed when the adapter
/// is built, never probed per call.
#[derive(Clone)]
pub struct ModelAdapter {
    provider: Provider,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for ModelAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAdapter")
            .field("name", &self.provider.name())
            .field("shape", &self.shape())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ModelAdapter {
    pub fn classifier(model: impl ProbabilityModel + 'static) -> Self {
        Self::from_classifier(Arc::new(model))
    }

    pub fn regressor(model: impl ScoreModel + 'static) -> Self {
        Self::from_regressor(Arc::new(model))
    }

    pub fn from_classifier(model: Arc<dyn ProbabilityModel>) -> Self {
        Self {
            provider: Provider::Classifier(model),
            timeout: None,
        }
    }

    pub fn from_regressor(model: Arc<dyn ScoreModel>) -> Self {
        Self {
            provider: Provider::Regressor(model),
            timeout: None,
        }
    }

    /// Bounds each call; a late answer is reported as unavailable. The
    /// worker thread of a timed-out call keeps running in the background.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn shape(&self) -> ModelShape {
        match self.provider {
            Provider::Classifier(_) => ModelShape::Classifier,
            Provider::Regressor(_) => ModelShape::Regressor,
        }
    }

    /// Name reported in results, e.g. `"elo:classifier"`.
    pub fn label(&self) -> String {
        let shape = match self.shape() {
            ModelShape::Classifier => "classifier",
            ModelShape::Regressor => "regressor",
        };
        format!("{}:{shape}", self.provider.name())
    }

    pub fn vote(&self, features: &MatchFeatures) -> Result<ModelVote, PredictError> {
        let raw = match self.timeout {
            Some(limit) => self.run_bounded(features, limit)?,
            None => self
                .provider
                .run(features)
                .map_err(|err| PredictError::ModelUnavailable(format!("{err:#}")))?,
        };
        match raw {
            RawOutput::Proba(probs) => probability_vote(&probs),
            RawOutput::Scores(home, away) => score_vote(home, away),
        }
    }

    /// Runs the provider on a worker thread and waits at most `limit`. A
    /// worker that misses the deadline is left running detached; its late
    /// answer is dropped.
    fn run_bounded(&self, features: &MatchFeatures, limit: Duration) -> Result<RawOutput, PredictError> {
        let (tx, rx) = mpsc::channel();
        let provider = self.provider.clone();
        let features = features.clone();
        thread::Builder::new()
            .name(format!("model-{}", self.provider.name()))
            .spawn(move || {
                let _ = tx.send(provider.run(&features));
            })
            .map_err(|err| PredictError::ModelUnavailable(format!("spawn model worker: {err}")))?;
        match rx.recv_timeout(limit) {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(err)) => Err(PredictError::ModelUnavailable(format!("{err:#}"))),
            Err(RecvTimeoutError::Timeout) => {
                debug!(model = self.provider.name(), ?limit, "model call timed out");
                Err(PredictError::ModelUnavailable(format!(
                    "no answer within {} ms",
                    limit.as_millis()
                )))
            }
            Err(RecvTimeoutError::Disconnected) => Err(PredictError::ModelUnavailable(
                "model worker exited without an answer".to_string(),
            )),
        }
    }
}

fn probability_vote(probs: &[f64]) -> Result<ModelVote, PredictError> {
    let [away, draw, home] = probs else {
        return Err(PredictError::ModelUnavailable(format!(
            "expected 3 class probabilities, got {}",
            probs.len()
        )));
    };
    let class_probs = [*away, *draw, *home];
    if class_probs.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(PredictError::ModelUnavailable(format!(
            "non-finite or negative probabilities {class_probs:?}"
        )));
    }
    let sum = class_probs.iter().sum::<f64>();
    if sum <= 0.0 {
        return Err(PredictError::ModelUnavailable(
            "probabilities sum to zero".to_string(),
        ));
    }
    let vector = ProbabilityVector::from_class_probs(class_probs).map(|p| p / sum);
    Ok(ModelVote::Vector(vector))
}

fn score_vote(home: f64, away: f64) -> Result<ModelVote, PredictError> {
    if !home.is_finite() || !away.is_finite() {
        return Err(PredictError::ModelUnavailable(format!(
            "non-finite scores ({home}, {away})"
        )));
    }
    let outcome = if home > away {
        Outcome::Home
    } else if away > home {
        Outcome::Away
    } else {
        Outcome::Draw
    };
    Ok(ModelVote::Label(outcome))
}
