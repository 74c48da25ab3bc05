//! HTTP routes over a bound accessibility engine

use axum::error_handling::HandleErrorLayer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{BoxError, Json, Router};
use reachgrid_core::engine::AccessibilityEngine;
use reachgrid_core::metrics::{CoverageStats, DistanceSummary, NearestResult, PerCapitaMetrics};
use reachgrid_core::model::Category;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerSection;
use crate::error::{ApiError, ErrorBody};
use crate::state::AppState;

fn default_metric() -> String {
    "euclidean".to_string()
}

#[derive(Debug, Deserialize)]
pub struct AccessibilityRequest {
    pub category: String,
    #[serde(default = "default_metric")]
    pub metric: String,
    /// `null` means no distance limit
    #[serde(with = "reachgrid_core::metrics::infinity")]
    pub threshold: f64,
    /// Include the per-point nearest results in the response
    #[serde(default)]
    pub include_points: bool,
}

#[derive(Debug, Serialize)]
pub struct AccessibilityResponse {
    pub category: Category,
    pub metric: String,
    #[serde(with = "reachgrid_core::metrics::infinity")]
    pub threshold: f64,
    pub coverage: CoverageStats,
    pub summary: DistanceSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<NearestResult>>,
}

#[derive(Debug, Deserialize)]
pub struct PerCapitaRequest {
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct CoverageCurveRequest {
    pub category: String,
    #[serde(default = "default_metric")]
    pub metric: String,
    pub thresholds: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct CurvePoint {
    #[serde(with = "reachgrid_core::metrics::infinity")]
    pub threshold: f64,
    #[serde(flatten)]
    pub coverage: CoverageStats,
}

#[derive(Debug, Serialize)]
pub struct CoverageCurveResponse {
    pub category: String,
    pub metric: String,
    pub curve: Vec<CurvePoint>,
}

/// Run engine work off the async executor
async fn run_blocking<T, F>(state: &AppState, work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&AccessibilityEngine) -> Result<T, reachgrid_core::Error> + Send + 'static,
{
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || work(&engine)).await?;
    Ok(result?)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "population_points": state.engine.population().len(),
        "total_population": state.engine.population().total_weight(),
        "categories": state.engine.categories().count(),
    }))
}

async fn categories(State(state): State<AppState>) -> impl IntoResponse {
    let engine = &state.engine;
    let categories: Vec<_> = engine
        .categories()
        .filter_map(|category| engine.services(category.as_str()).ok())
        .map(|services| json!({ "name": services.category(), "services": services.len() }))
        .collect();
    let modes: Vec<_> = engine
        .modes()
        .iter()
        .map(|mode| json!({ "mode": mode, "network": engine.network(mode).is_some() }))
        .collect();
    Json(json!({ "categories": categories, "modes": modes }))
}

#[tracing::instrument(skip_all, fields(category = %request.category, metric = %request.metric))]
async fn accessibility(
    State(state): State<AppState>,
    Json(request): Json<AccessibilityRequest>,
) -> Result<Json<AccessibilityResponse>, ApiError> {
    let response = run_blocking(&state, move |engine| {
        let metric = engine.resolve_metric(&request.metric)?;
        let report =
            engine.calculate_accessibility_metrics(&request.category, request.threshold, &metric)?;
        Ok(AccessibilityResponse {
            category: report.category,
            metric: metric.to_string(),
            threshold: report.threshold,
            coverage: report.coverage,
            summary: report.summary,
            points: request.include_points.then_some(report.nearest),
        })
    })
    .await?;
    Ok(Json(response))
}

#[tracing::instrument(skip_all, fields(category = %request.category))]
async fn per_capita(
    State(state): State<AppState>,
    Json(request): Json<PerCapitaRequest>,
) -> Result<Json<PerCapitaMetrics>, ApiError> {
    let metrics = run_blocking(&state, move |engine| {
        engine.calculate_per_capita_metrics(&request.category)
    })
    .await?;
    Ok(Json(metrics))
}

#[tracing::instrument(skip_all, fields(category = %request.category, metric = %request.metric))]
async fn coverage_curve(
    State(state): State<AppState>,
    Json(request): Json<CoverageCurveRequest>,
) -> Result<Json<CoverageCurveResponse>, ApiError> {
    let response = run_blocking(&state, move |engine| {
        let metric = engine.resolve_metric(&request.metric)?;
        let curve = engine.coverage_curve(&request.category, &metric, &request.thresholds)?;
        Ok(CoverageCurveResponse {
            category: request.category,
            metric: metric.to_string(),
            curve: request
                .thresholds
                .iter()
                .zip(curve)
                .map(|(&threshold, coverage)| CurvePoint { threshold, coverage })
                .collect(),
        })
    })
    .await?;
    Ok(Json(response))
}

async fn handle_layer_error(err: BoxError) -> (StatusCode, Json<ErrorBody>) {
    if err.is::<Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(ErrorBody {
                error: "Analysis timed out".to_string(),
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorBody {
                error: format!("Service unavailable: {err}"),
            }),
        )
    }
}

/// Build the application router.
///
/// Analysis routes share one concurrency limit and a per-request timeout;
/// metadata routes are not limited.
pub fn router(state: AppState, settings: &ServerSection) -> Router {
    let analysis = Router::new()
        .route("/accessibility", post(accessibility))
        .route("/per-capita", post(per_capita))
        .route("/coverage-curve", post(coverage_curve))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_layer_error))
                .layer(TimeoutLayer::new(settings.request_timeout()))
                .layer(GlobalConcurrencyLimitLayer::new(settings.concurrency_limit)),
        );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/categories", get(categories))
        .merge(analysis)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
