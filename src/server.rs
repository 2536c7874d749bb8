//! HTTP adapter for the screening pipeline.
//!
//! Maps request bodies into the extract → predict → label pipeline and
//! pattern-matches the outcome into response codes. All failure detail is
//! logged server-side; callers only see the message text.

use crate::features::FeatureExtractor;
use crate::metrics::RequestMetrics;
use crate::models::inference::Predictor;
use crate::report::ScreeningReport;
use actix_web::{web, HttpResponse};
use anyhow::Result;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Shared per-process state handed to every request.
pub struct AppState {
    pub extractor: FeatureExtractor,
    pub predictor: Arc<dyn Predictor>,
    pub metrics: Arc<RequestMetrics>,
}

/// Register the service routes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/health").route(web::get().to(health)));
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({"status": "ok"}))
}

/// POST /predict: lab panel JSON in, condition probabilities out.
async fn predict(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let Some(data) = parse_payload(&body) else {
        return HttpResponse::BadRequest().json(json!({"error": "No data provided"}));
    };

    let start = Instant::now();
    match screen(&state, &data) {
        Ok(report) => {
            state.metrics.record_success(start.elapsed(), report.top_condition());
            HttpResponse::Ok().json(report)
        }
        Err(e) => {
            state.metrics.record_failure();
            error!(error = ?e, payload = ?data, "Screening request failed");
            HttpResponse::InternalServerError().json(json!({"error": e.to_string()}))
        }
    }
}

/// Accept only a non-empty JSON object as a usable payload.
fn parse_payload(body: &[u8]) -> Option<Map<String, Value>> {
    match serde_json::from_slice::<Value>(body).ok()? {
        Value::Object(map) if !map.is_empty() => Some(map),
        _ => None,
    }
}

/// Extraction and inference, kept separate from HTTP status mapping.
fn screen(state: &AppState, data: &Map<String, Value>) -> Result<ScreeningReport> {
    let features = state.extractor.extract(data)?;
    debug!(features = ?features, "Features");

    let probabilities = state.predictor.predict(&features)?;

    ScreeningReport::from_probabilities(&probabilities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_payload_rejects_non_objects() {
        assert!(parse_payload(b"").is_none());
        assert!(parse_payload(b"not json").is_none());
        assert!(parse_payload(b"null").is_none());
        assert!(parse_payload(b"[1, 2]").is_none());
        assert!(parse_payload(b"{}").is_none());
    }

    #[test]
    fn test_parse_payload_accepts_objects() {
        let map = parse_payload(br#"{"Glucose": 90}"#).unwrap();
        assert_eq!(map.get("Glucose"), Some(&json!(90)));
    }
}
