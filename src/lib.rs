//! Pre-match outcome prediction for two-team fixtures.
//!
//! The engine blends a trained model's vote, head-to-head history and recent
//! form into one probability distribution, then picks a single outcome or a
//! double-chance pairing through a fixed set of decision rules.

pub mod cache;
pub mod calibration;
pub mod config;
pub mod csv_dataset;
pub mod decision;
pub mod elo;
pub mod engine;
pub mod error;
pub mod features;
pub mod form;
pub mod guard;
pub mod head_to_head;
pub mod historical_dataset;
pub mod league_params;
pub mod model_adapter;
pub mod outcome;
pub mod reconcile;
pub mod result_codes;
pub mod strength;
pub mod synthetic;

pub use engine::{PredictionResult, Predictor, predict};
pub use error::PredictError;
pub use outcome::{Outcome, ProbabilityVector};
