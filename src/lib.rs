//! Blood Panel Screening Service Library
//!
//! Accepts clinical lab measurements over HTTP, runs a pre-trained
//! gradient-boosted-tree classifier, and returns per-condition
//! probability scores.

pub mod config;
pub mod features;
pub mod metrics;
pub mod models;
pub mod report;
pub mod server;

pub use config::AppConfig;
pub use features::FeatureExtractor;
pub use metrics::RequestMetrics;
pub use models::inference::{InferenceEngine, Predictor};
pub use report::{ScreeningReport, CONDITIONS};
