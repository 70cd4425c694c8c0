use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::get};

use crate::HealthResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Liveness plus a round trip to the service catalog database
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API and catalog reachable", body = HealthResponse),
        (status = 503, description = "Catalog database unreachable", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&state.db)
        .await
        .is_ok();

    let (status, label) = if catalog_ok {
        (StatusCode::OK, "ok")
    } else {
        tracing::warn!("health check: catalog database unreachable");
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn unreachable_catalog_reports_degraded() {
        let response = router()
            .with_state(test_state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
