//! Emotion monitor core.
//!
//! Ties the classification oracle to the telemetry store: page renders and
//! successful analyses are recorded, and the dashboard reads them back.

pub mod dashboard;
pub mod exit_codes;
pub mod inference;
pub mod logging;
pub mod monitor;

pub use dashboard::Dashboard;
pub use exit_codes::ExitCode;
pub use inference::{
    ClassDistribution, ClassProbability, ClassificationOracle, InferenceError, LexiconOracle,
    Prediction,
};
pub use monitor::{Analysis, EmotionMonitor};
