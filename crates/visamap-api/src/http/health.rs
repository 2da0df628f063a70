//! Health and metrics endpoints.

use std::sync::Arc;

use axum::{Json, body::Body, extract::State, http::StatusCode, response::Response};
use tracing::{error, warn};
use visamap_api_models::HealthResponse;
use visamap_telemetry::build_sha;

use crate::http::errors::ApiError;
use crate::state::ApiState;

const STORE_COMPONENT: &str = "store";

pub(crate) async fn health(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    match state.gateway.store().count().await {
        Ok(entries) => {
            state.remove_degraded_component(STORE_COMPONENT);
            let degraded = state.current_health_degraded();
            let status = if degraded.is_empty() { "ok" } else { "degraded" };
            Ok(Json(HealthResponse {
                status: status.to_string(),
                build: build_sha().to_string(),
                entries: Some(entries),
                degraded,
            }))
        }
        Err(err) => {
            state.add_degraded_component(STORE_COMPONENT);
            warn!(error = %err, "health check failed to reach policy store");
            Err(ApiError::service_unavailable(
                "policy store is currently unavailable",
            ))
        }
    }
}

pub(crate) async fn metrics(State(state): State<Arc<ApiState>>) -> Result<Response, ApiError> {
    match state.telemetry.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )
            .body(Body::from(body))
            .map_err(|err| {
                error!(error = %err, "failed to build metrics response");
                ApiError::internal("failed to build metrics response")
            }),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            Err(ApiError::internal("failed to render metrics"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use visamap_core::MemoryPolicyStore;
    use visamap_test_support::{sample_entries, scratch_dir};

    use crate::state::test_support::state_with;

    #[tokio::test]
    async fn health_reports_entry_count() -> Result<()> {
        let scratch = scratch_dir()?;
        let state = state_with(
            Arc::new(MemoryPolicyStore::with_entries(sample_entries())),
            scratch.path(),
        );
        let Json(body) = health(State(state))
            .await
            .map_err(|err| anyhow::anyhow!("{:?}", err.status))?;
        assert_eq!(body.status, "ok");
        assert_eq!(body.entries, Some(5));
        Ok(())
    }

    #[tokio::test]
    async fn health_degrades_when_store_is_down() -> Result<()> {
        let scratch = scratch_dir()?;
        let store = Arc::new(MemoryPolicyStore::new());
        store.set_unavailable(true);
        let state = state_with(Arc::clone(&store), scratch.path());
        let err = health(State(Arc::clone(&state)))
            .await
            .expect_err("store down");
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(state.current_health_degraded(), vec!["store".to_string()]);

        store.set_unavailable(false);
        let Json(body) = health(State(Arc::clone(&state)))
            .await
            .map_err(|err| anyhow::anyhow!("{:?}", err.status))?;
        assert_eq!(body.status, "ok");
        assert!(state.current_health_degraded().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn metrics_renders_prometheus_text() -> Result<()> {
        let scratch = scratch_dir()?;
        let state = state_with(Arc::new(MemoryPolicyStore::new()), scratch.path());
        state.telemetry.inc_publish("ok");
        let response = metrics(State(state))
            .await
            .map_err(|err| anyhow::anyhow!("{:?}", err.status))?;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        assert!(String::from_utf8_lossy(&bytes).contains("publish_total"));
        Ok(())
    }
}
