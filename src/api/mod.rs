//! Read-only HTTP view of the last published analysis.

pub mod error;

use axum::{extract::State, routing::get, Json, Router};
use serde_json::Value;
use std::{path::PathBuf, sync::Arc};
use tracing::warn;

use crate::storage::load_latest;
pub use error::ApiError;

pub const RESULTS_ROUTE: &str = "/Internal/arbitrage";

#[derive(Debug, Clone)]
pub struct ApiState {
    pub results_path: Arc<PathBuf>,
    pub exchange_name: Arc<str>,
}

pub fn router(results_path: PathBuf, exchange_name: &str) -> Router {
    let state = ApiState {
        results_path: Arc::new(results_path),
        exchange_name: Arc::from(exchange_name),
    };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route(RESULTS_ROUTE, get(latest_results))
        .with_state(state)
}

async fn index(State(state): State<ApiState>) -> String {
    format!(
        "Welcome to {} Arbitrage API. Access results at {}",
        state.exchange_name, RESULTS_ROUTE
    )
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn latest_results(State(state): State<ApiState>) -> Result<Json<Value>, ApiError> {
    match load_latest(&state.results_path).await {
        Ok(Some(document)) => Ok(Json(document)),
        Ok(None) => Err(ApiError::NotFound(
            "Results not found. The calculator may not have run yet.".to_string(),
        )),
        Err(e) => {
            warn!("Serving 500 for results request: {}", e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn get_results(path: PathBuf) -> (StatusCode, Value) {
        let response = router(path, "Wallex")
            .oneshot(Request::get(RESULTS_ROUTE).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_missing_results_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_results(dir.path().join("results.json")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("Results not found"));
    }

    #[tokio::test]
    async fn test_corrupt_results_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, b"not json").unwrap();

        let (status, body) = get_results(path).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("error").is_some());
    }

    #[tokio::test]
    async fn test_results_served_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(
            &path,
            br#"{"last_updated": "2026-10-18T12:00:00Z", "bridge_rate": "60000", "opportunities_found": 0, "opportunities": []}"#,
        )
        .unwrap();

        let (status, body) = get_results(path).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bridge_rate"], "60000");
        assert_eq!(body["opportunities_found"], 0);
    }

    #[tokio::test]
    async fn test_index_names_exchange_and_results_route() {
        let dir = tempfile::tempdir().unwrap();
        let response = router(dir.path().join("results.json"), "Wallex")
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            String::from_utf8(body.to_vec()).unwrap(),
            "Welcome to Wallex Arbitrage API. Access results at /Internal/arbitrage"
        );
    }
}
