//! HTTP request handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::response::Html;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::encoder::{self, FeatureEncoder};
use crate::error::RequestError;
use crate::metrics::{MetricsSnapshot, ScoringMetrics};
use crate::model::inference::InferenceEngine;
use crate::schema::FeatureSchema;
use crate::types::{TransactionRecord, Verdict};

/// Shared application state.
///
/// The artifacts are loaded once at startup and injected here; after that
/// everything except the metrics counters is read-only, so handlers share
/// it behind an `Arc` with no further locking.
pub struct AppState {
    pub encoder: FeatureEncoder,
    pub schema: FeatureSchema,
    pub engine: InferenceEngine,
    pub metrics: ScoringMetrics,
    pub started_at: DateTime<Utc>,
    start_time: Instant,
}

impl AppState {
    pub fn new(schema: FeatureSchema, engine: InferenceEngine) -> Self {
        Self {
            encoder: FeatureEncoder::new(),
            schema,
            engine,
            metrics: ScoringMetrics::new(),
            started_at: Utc::now(),
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Serve the form page. The markup is embedded at compile time so the
/// binary stays self-contained.
pub async fn index() -> Html<&'static str> {
    Html(include_str!("../assets/index.html"))
}

/// Select options for the form, served from the same catalogs the encoder
/// validates against so the page cannot drift from the backend.
#[derive(Debug, Serialize)]
pub struct FormOptions {
    pub countries: Vec<&'static str>,
    pub channels: Vec<&'static str>,
    pub merchant_categories: Vec<&'static str>,
    pub flags: Vec<&'static str>,
}

pub async fn options() -> Json<FormOptions> {
    Json(FormOptions {
        countries: encoder::country_options(),
        channels: encoder::CHANNELS.to_vec(),
        merchant_categories: encoder::MERCHANT_CATEGORIES.to_vec(),
        flags: encoder::FLAG_VALUES.to_vec(),
    })
}

/// Response for one scored submission.
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub request_id: String,
    pub verdict: Verdict,
    pub probability: f64,
    pub summary: String,
}

/// Score one submitted transaction.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(record): Json<TransactionRecord>,
) -> Result<Json<PredictionResponse>, RequestError> {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let row = state.encoder.encode(&record, &state.schema).map_err(|e| {
        state.metrics.record_rejection();
        warn!(request_id = %request_id, error = %e, "Submission rejected");
        RequestError::from(e)
    })?;

    let prediction = state.engine.predict(&row).map_err(|e| {
        state.metrics.record_failure();
        error!(request_id = %request_id, error = %e, "Inference failed");
        RequestError::from(e)
    })?;

    let processing_time = start.elapsed();
    let fraud_probability = if prediction.verdict.is_fraud() {
        prediction.probability
    } else {
        1.0 - prediction.probability
    };
    state
        .metrics
        .record_scored(processing_time, fraud_probability, prediction.verdict.is_fraud());

    info!(
        request_id = %request_id,
        verdict = %prediction.verdict,
        probability = format!("{:.2}", prediction.probability),
        processing_time_us = processing_time.as_micros() as u64,
        "Submission scored"
    );

    Ok(Json(PredictionResponse {
        request_id,
        verdict: prediction.verdict,
        probability: prediction.probability,
        summary: prediction.summary(),
    }))
}

/// Health response with artifact details.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
    pub schema_columns: usize,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: u64,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        model: state.engine.model_name().to_string(),
        schema_columns: state.schema.len(),
        started_at: state.started_at,
        uptime_seconds: state.uptime_seconds(),
    })
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Exercising predict end to end needs the model artifact; the
    // score-sample binary covers that path against real files.

    #[tokio::test]
    async fn test_options_mirror_encoder_catalogs() {
        let Json(options) = options().await;

        assert_eq!(options.countries.len(), 10);
        assert_eq!(options.channels, vec!["App", "Web"]);
        assert_eq!(options.merchant_categories.len(), 5);
        assert_eq!(options.flags, vec!["No", "Yes"]);
        assert_eq!(options.countries[0], "Germany");
    }

    #[tokio::test]
    async fn test_index_serves_embedded_page() {
        let Html(page) = index().await;
        assert!(page.contains("Transaction Details"));
        assert!(page.contains("/api/predict"));
    }
}
