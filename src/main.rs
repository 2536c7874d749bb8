//! Blood Panel Screening Service - Main Entry Point
//!
//! Loads the classifier once at startup and serves per-condition
//! probability predictions over HTTP.

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use bloodscreen::{
    config::AppConfig,
    features::FeatureExtractor,
    metrics::{MetricsReporter, RequestMetrics},
    models::inference::{InferenceEngine, Predictor},
    server::{routes, AppState},
};
use std::sync::Arc;
use tracing::info;

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; RUST_LOG takes precedence over the config level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "bloodscreen={}",
                    config.logging.level
                ))
            }),
        )
        .init();

    info!("Starting blood panel screening service");

    // Initialize metrics
    let metrics = Arc::new(RequestMetrics::new());

    // Initialize components
    let extractor = FeatureExtractor::new();
    info!(
        features = extractor.feature_count(),
        "Feature schema initialized"
    );

    // Load the classifier; this also verifies output cardinality
    let predictor: Arc<dyn Predictor> = Arc::new(
        InferenceEngine::new(&config).context("failed to initialize inference engine")?,
    );

    // Start metrics reporter (logs a summary every 60 seconds)
    let reporter = MetricsReporter::new(metrics.clone(), 60);
    actix_web::rt::spawn(reporter.start());

    info!(
        host = %config.server.host,
        port = config.server.port,
        workers = config.server.workers,
        "Binding HTTP server"
    );

    let state_metrics = metrics.clone();
    HttpServer::new(move || {
        let state = AppState {
            extractor: FeatureExtractor::new(),
            predictor: predictor.clone(),
            metrics: state_metrics.clone(),
        };

        App::new()
            .wrap(Cors::permissive())
            .app_data(web::Data::new(state))
            .configure(routes)
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    info!("Screening service shutting down");
    metrics.print_summary();

    Ok(())
}
