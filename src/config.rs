use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::decision::DecisionThresholds;
use crate::form::FORM_WINDOW;
use crate::strength::StrengthConfig;

/// Tunable constants of the prediction pipeline.
///
/// The blend weights and the strength threshold were picked empirically and
/// have no derivation behind them; they are exposed so they can be tuned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub form_window: usize,
    /// Weight of the provisional distribution when form is blended in.
    pub model_weight: f64,
    /// Always `1 - model_weight` once loaded.
    pub form_weight: f64,
    /// Minimum home/away strength gap that triggers the form blend. Values
    /// below 0.08 also widen the weak form band down to this gap.
    pub strength_threshold: f64,
    pub rules: DecisionThresholds,
    /// Sum drift tolerated by the guard before it logs a rescale.
    pub guard_tolerance: f64,
    pub strength: StrengthConfig,
    /// Per-call model budget; 0 runs the model inline on the caller's thread.
    pub model_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            form_window: FORM_WINDOW,
            model_weight: 0.6,
            form_weight: 0.4,
            strength_threshold: 0.1,
            rules: DecisionThresholds::default(),
            guard_tolerance: 0.01,
            strength: StrengthConfig::default(),
            model_timeout_ms: 2_000,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with any `PREDICTOR_*` variables that parse.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(n) = env_parse::<usize>("PREDICTOR_FORM_WINDOW") {
            cfg.form_window = n;
        }
        if let Some(w) = env_parse::<f64>("PREDICTOR_MODEL_WEIGHT") {
            cfg.model_weight = w;
        }
        if let Some(t) = env_parse::<f64>("PREDICTOR_STRENGTH_THRESHOLD") {
            cfg.strength_threshold = t;
        }
        if let Some(t) = env_parse::<f64>("PREDICTOR_GUARD_TOLERANCE") {
            cfg.guard_tolerance = t;
        }
        if let Some(ms) = env_parse::<u64>("PREDICTOR_MODEL_TIMEOUT_MS") {
            cfg.model_timeout_ms = ms;
        }
        if let Some(t) = env_parse::<f64>("PREDICTOR_AGREEMENT_THRESHOLD") {
            cfg.rules.agreement = t;
        }
        if let Some(t) = env_parse::<f64>("PREDICTOR_NEAR_UNIFORM_BAND") {
            cfg.rules.near_uniform_band = t;
        }
        if let Some(a) = env_parse::<f64>("PREDICTOR_HOME_ADVANTAGE") {
            cfg.strength.home_advantage = a;
        }
        cfg.sanitized()
    }

    /// Reads a JSON file; missing keys keep their defaults. Values are
    /// clamped the same way as environment overrides.
    pub fn load_json(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read engine config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parse engine config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// Clamps every constant into its usable range and derives the form
    /// weight from the model weight.
    pub fn sanitized(mut self) -> Self {
        let unit = |v: f64, fallback: f64| if v.is_finite() { v.clamp(0.0, 1.0) } else { fallback };
        let d = Self::default();
        self.form_window = self.form_window.clamp(1, 20);
        self.model_weight = unit(self.model_weight, d.model_weight);
        self.form_weight = 1.0 - self.model_weight;
        self.strength_threshold = unit(self.strength_threshold, d.strength_threshold);
        self.guard_tolerance = if self.guard_tolerance.is_finite() {
            self.guard_tolerance.clamp(1e-9, 0.5)
        } else {
            d.guard_tolerance
        };
        self.model_timeout_ms = self.model_timeout_ms.min(60_000);

        let r = &mut self.rules;
        let dr = d.rules;
        r.agreement = unit(r.agreement, dr.agreement);
        r.draw_dominance = unit(r.draw_dominance, dr.draw_dominance);
        r.uncertainty = unit(r.uncertainty, dr.uncertainty);
        r.dominance = unit(r.dominance, dr.dominance);
        r.near_uniform_band = unit(r.near_uniform_band, dr.near_uniform_band);

        self.strength.home_advantage = if self.strength.home_advantage.is_finite() {
            self.strength.home_advantage.clamp(0.0, 0.5)
        } else {
            d.strength.home_advantage
        };
        self
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_millis(self.model_timeout_ms)
    }
}

/// Lifetimes for caller-owned caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dataset_ttl_secs: u64,
    pub form_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dataset_ttl_secs: 3_600,
            form_ttl_secs: 300,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            dataset_ttl_secs: env_parse::<u64>("PREDICTOR_DATASET_TTL_SECS")
                .unwrap_or(d.dataset_ttl_secs),
            form_ttl_secs: env_parse::<u64>("PREDICTOR_FORM_TTL_SECS").unwrap_or(d.form_ttl_secs),
        }
    }

    pub fn dataset_ttl(&self) -> Duration {
        Duration::from_secs(self.dataset_ttl_secs)
    }

    pub fn form_ttl(&self) -> Duration {
        Duration::from_secs(self.form_ttl_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|val| val.trim().parse::<T>().ok())
}

/// Loads `.env` then `.env.local` if present.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env");
    let _ = dotenvy::from_filename(".env.local");
}
