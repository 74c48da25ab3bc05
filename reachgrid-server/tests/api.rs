use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use reachgrid_core::prelude::*;
use reachgrid_server::config::ServerSection;
use reachgrid_server::{AppState, router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn node(id: NodeId, x: f64) -> StreetNode {
    StreetNode {
        id,
        geometry: geo::Point::new(x, 0.0),
    }
}

fn app() -> Router {
    let population = WeightedPointSet::new(vec![
        WeightedPoint::new(0.0, 0.0, 100.0),
        WeightedPoint::new(2000.0, 0.0, 50.0),
    ])
    .unwrap();
    let clinics =
        ServiceSet::new("healthcare", vec![ServicePoint::new("clinic", 0.0, 0.0)]).unwrap();
    let nodes = vec![node(1, 0.0), node(2, 2000.0)];
    let edges = vec![EdgeRecord::new(1, 2, 900.0), EdgeRecord::new(2, 1, 900.0)];
    let walk = RoutableGraph::new(TransportMode::Walk, CostKind::TravelTime, nodes, edges).unwrap();

    let engine = AccessibilityEngine::builder(EngineConfig::default())
        .population(population)
        .services(clinics)
        .services(ServiceSet::empty("food"))
        .network(walk)
        .build()
        .unwrap();
    router(AppState::new(engine), &ServerSection::default())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_request(path: &str, body: &Value) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn post(path: &str, body: Value) -> (StatusCode, Value) {
    send(app(), post_request(path, &body)).await
}

#[tokio::test]
async fn health_reports_population() {
    let (status, body) = send(app(), Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["population_points"], 2);
    assert_eq!(body["total_population"], 150.0);
}

#[tokio::test]
async fn categories_and_modes() {
    let (status, body) =
        send(app(), Request::get("/categories").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["categories"][0]["name"], "food");
    assert_eq!(body["categories"][1]["services"], 1);
    assert_eq!(body["modes"][0], json!({ "mode": "walk", "network": true }));
    assert_eq!(body["modes"][2], json!({ "mode": "drive", "network": false }));
}

#[tokio::test]
async fn euclidean_accessibility() {
    let (status, body) = post(
        "/accessibility",
        json!({ "category": "healthcare", "threshold": 1000.0 }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["metric"], "euclidean");
    assert_eq!(body["coverage"]["covered_population"], 100.0);
    assert_eq!(body["coverage"]["total_population"], 150.0);
    assert!(body.get("points").is_none());
}

#[tokio::test]
async fn network_accessibility_with_points() {
    let (status, body) = post(
        "/accessibility",
        json!({
            "category": "healthcare",
            "metric": "walk",
            "threshold": 15.0,
            "include_points": true
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["coverage"]["coverage_ratio"], 1.0);
    assert_eq!(body["points"][1]["distance"], 15.0);
    assert_eq!(body["points"][1]["source_service_id"], "clinic");
}

#[tokio::test]
async fn lookup_failures_are_404() {
    let (status, body) = post(
        "/accessibility",
        json!({ "category": "schools", "threshold": 1000.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("schools"));

    let (status, _) = post(
        "/accessibility",
        json!({ "category": "healthcare", "metric": "drive", "threshold": 10.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(
        "/accessibility",
        json!({ "category": "healthcare", "metric": "teleport", "threshold": 10.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn validation_failures_are_422() {
    let (status, _) = post(
        "/accessibility",
        json!({ "category": "healthcare", "threshold": -5.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = post("/per-capita", json!({ "category": "food" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Service set is empty");
}

#[tokio::test]
async fn per_capita_metrics() {
    let (status, body) = post("/per-capita", json!({ "category": "healthcare" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service_count"], 1);
    assert_eq!(body["people_per_service"], 150.0);
}

#[tokio::test]
async fn coverage_curve_pairs_thresholds() {
    let (status, body) = post(
        "/coverage-curve",
        json!({ "category": "healthcare", "thresholds": [0.0, 1000.0, 2000.0] }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let curve = body["curve"].as_array().unwrap();
    assert_eq!(curve.len(), 3);
    assert_eq!(curve[2]["threshold"], 2000.0);
    assert_eq!(curve[2]["coverage_ratio"], 1.0);
    assert_eq!(curve[0]["covered_population"], 100.0);
}

#[tokio::test]
async fn unreachable_points_are_null_and_read_back_as_infinite() {
    // two street nodes with no edge between them
    let walk = RoutableGraph::new(
        TransportMode::Walk,
        CostKind::TravelTime,
        vec![node(1, 0.0), node(2, 9000.0)],
        Vec::new(),
    )
    .unwrap();
    let population = WeightedPointSet::new(vec![
        WeightedPoint::new(0.0, 0.0, 10.0),
        WeightedPoint::new(9000.0, 0.0, 5.0),
    ])
    .unwrap();
    let clinics =
        ServiceSet::new("healthcare", vec![ServicePoint::new("clinic", 0.0, 0.0)]).unwrap();
    let engine = AccessibilityEngine::builder(EngineConfig::default())
        .population(population)
        .services(clinics)
        .network(walk)
        .build()
        .unwrap();
    let app = router(AppState::new(engine), &ServerSection::default());

    let body = json!({
        "category": "healthcare",
        "metric": "walk",
        "threshold": null,
        "include_points": true
    });
    let (status, body) = send(app, post_request("/accessibility", &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["threshold"], Value::Null);
    assert_eq!(body["points"][1], json!({ "distance": null, "source_service_id": null }));
    assert_eq!(body["coverage"]["covered_population"], 10.0);

    let points: Vec<NearestResult> = serde_json::from_value(body["points"].clone()).unwrap();
    assert_eq!(points[0].distance, 0.0);
    assert_eq!(points[1], NearestResult::unreachable());
}
