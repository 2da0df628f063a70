//! Router construction and server host for the API.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, Method, Request, header::CONTENT_TYPE},
    middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{Span, info};
use visamap_core::PolicyGateway;
use visamap_publish::{ArtifactReader, Publisher};
use visamap_telemetry::{Metrics, build_sha};

use crate::error::{ApiServerError, ApiServerResult};
use crate::http::auth::capture_admin_credential;
use crate::http::constants::{HEADER_ADMIN_PASSWORD, HEADER_REQUEST_ID};
use crate::http::health::{health, metrics};
use crate::http::lookup::lookup;
use crate::http::policies::{check_auth, delete_policy, list_policies, upsert_policy};
use crate::http::publish::publish;
use crate::http::telemetry::HttpMetricsLayer;
use crate::state::ApiState;

/// Axum router wrapper hosting the admin and lookup endpoints.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Wire the handlers around the gateway, publisher and artifact reader.
    #[must_use]
    pub fn new(
        gateway: PolicyGateway,
        publisher: Publisher,
        reader: ArtifactReader,
        telemetry: Metrics,
    ) -> Self {
        let state = Arc::new(ApiState::new(
            gateway,
            publisher,
            reader,
            telemetry.clone(),
        ));
        Self::with_state(state, telemetry)
    }

    fn with_state(state: Arc<ApiState>, telemetry: Metrics) -> Self {
        let cors_layer = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([CONTENT_TYPE, HeaderName::from_static(HEADER_ADMIN_PASSWORD)]);
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                tracing::info_span!(
                    "http.request",
                    method = %request.method(),
                    route = %request.uri().path(),
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    span.record("status_code", response.status().as_u16());
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );
        let layered = ServiceBuilder::new()
            .layer(visamap_telemetry::propagate_request_id_layer())
            .layer(visamap_telemetry::set_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(telemetry));

        let router = Self::public_routes()
            .merge(Self::admin_routes())
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);

        Self { router }
    }

    fn public_routes() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .route("/api/lookup", get(lookup))
            .route("/api/admin/auth", post(check_auth))
    }

    fn admin_routes() -> Router<Arc<ApiState>> {
        let credential = middleware::from_fn(capture_admin_credential);

        Router::new()
            .route(
                "/api/admin/visa-policies",
                get(list_policies)
                    .put(upsert_policy)
                    .delete(delete_policy)
                    .route_layer(credential.clone()),
            )
            .route(
                "/api/admin/publish",
                post(publish).route_layer(credential),
            )
    }

    /// Serve until the process is terminated.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Bind`] if the listener cannot bind and
    /// [`ApiServerError::Serve`] if the server loop fails.
    pub async fn serve(self, addr: SocketAddr) -> ApiServerResult<()> {
        self.serve_with_shutdown(addr, std::future::pending()).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Bind`] if the listener cannot bind and
    /// [`ApiServerError::Serve`] if the server loop fails.
    pub async fn serve_with_shutdown<F>(self, addr: SocketAddr, signal: F) -> ApiServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ApiServerError::Bind { addr, source })?;
        info!(%addr, "api listening");
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(signal)
            .await
            .map_err(|source| ApiServerError::Serve { source })?;
        info!("api stopped");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn router(&self) -> Router {
        self.router.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use visamap_core::{AdminSecret, MemoryPolicyStore, PolicyGateway, SharedPolicyStore};
    use visamap_publish::{ArtifactReader, ArtifactWriter, Publisher};
    use visamap_telemetry::Metrics;
    use visamap_test_support::{ADMIN_PASSWORD, scratch_dir};

    use super::ApiServer;
    use crate::http::constants::HEADER_ADMIN_PASSWORD;

    fn server(dir: &std::path::Path) -> Result<ApiServer> {
        let store: SharedPolicyStore = Arc::new(MemoryPolicyStore::new());
        let secret = AdminSecret::new(ADMIN_PASSWORD)
            .ok_or_else(|| anyhow::anyhow!("admin secret must not be empty"))?;
        Ok(ApiServer::new(
            PolicyGateway::new(Arc::clone(&store), secret.clone()),
            Publisher::new(store, secret, ArtifactWriter::new(dir)),
            ArtifactReader::new(dir),
            Metrics::new()?,
        ))
    }

    fn json_request(method: &str, uri: &str, body: &Value) -> Result<Request<Body>> {
        Ok(Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header(HEADER_ADMIN_PASSWORD, ADMIN_PASSWORD)
            .body(Body::from(serde_json::to_vec(body)?))?)
    }

    async fn send(server: &ApiServer, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = server.router().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, body))
    }

    #[tokio::test]
    async fn edit_publish_lookup_round() -> Result<()> {
        let scratch = scratch_dir()?;
        let server = server(scratch.path())?;

        let (status, stored) = send(
            &server,
            json_request(
                "PUT",
                "/api/admin/visa-policies",
                &json!({"passport": "Germany", "destination": "Canada", "policy": 7, "duration": 180}),
            )?,
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stored["policyCode"], 7);

        let lookup = || {
            Request::builder()
                .uri("/api/lookup?origin=Germany&destination=Canada")
                .body(Body::empty())
        };
        let (status, before) = send(&server, lookup()?).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(before["policyCode"], Value::Null);

        let (status, report) =
            send(&server, json_request("POST", "/api/admin/publish", &json!({}))?).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["passports"], 1);
        assert_eq!(report["totalEntries"], 1);

        let (_, after) = send(&server, lookup()?).await?;
        assert_eq!(after["policyCode"], 7);
        assert_eq!(after["policyLabel"], "Visa-Free");
        assert_eq!(after["durationDays"], 180);
        Ok(())
    }

    #[tokio::test]
    async fn publish_without_header_is_unauthorized() -> Result<()> {
        let scratch = scratch_dir()?;
        let server = server(scratch.path())?;
        let request = Request::builder()
            .method("POST")
            .uri("/api/admin/publish")
            .body(Body::empty())?;
        let (status, problem) = send(&server, request).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(problem["status"], 401);
        Ok(())
    }

    #[tokio::test]
    async fn validation_problem_names_the_field() -> Result<()> {
        let scratch = scratch_dir()?;
        let server = server(scratch.path())?;
        let (status, problem) = send(
            &server,
            json_request(
                "PUT",
                "/api/admin/visa-policies",
                &json!({"origin": "Germany", "destination": "", "policyCode": 7}),
            )?,
        )
        .await?;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(problem["invalid_params"][0]["pointer"], "/destination");
        Ok(())
    }

    #[tokio::test]
    async fn malformed_body_is_a_problem_document() -> Result<()> {
        let scratch = scratch_dir()?;
        let server = server(scratch.path())?;
        for body in [
            "{\"origin\": \"Germany\",",
            "{\"origin\": \"Germany\", \"destination\": \"Canada\", \"policyCode\": \"seven\"}",
        ] {
            let request = Request::builder()
                .method("PUT")
                .uri("/api/admin/visa-policies")
                .header("content-type", "application/json")
                .header("x-request-id", "req-malformed")
                .header(HEADER_ADMIN_PASSWORD, ADMIN_PASSWORD)
                .body(Body::from(body))?;
            let (status, problem) = send(&server, request).await?;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(problem["status"], 400);
            assert_eq!(problem["type"], "https://visamap.dev/problems/bad-request");
            assert_eq!(problem["request_id"], "req-malformed");
        }
        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_whether_an_entry_was_removed() -> Result<()> {
        let scratch = scratch_dir()?;
        let server = server(scratch.path())?;
        let key = json!({"origin": "Germany", "destination": "Canada"});
        send(
            &server,
            json_request(
                "PUT",
                "/api/admin/visa-policies",
                &json!({"origin": "Germany", "destination": "Canada", "policyCode": 8}),
            )?,
        )
        .await?;

        let (status, first) =
            send(&server, json_request("DELETE", "/api/admin/visa-policies", &key)?).await?;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first, json!({"ok": true, "removed": true}));
        let (_, second) =
            send(&server, json_request("DELETE", "/api/admin/visa-policies", &key)?).await?;
        assert_eq!(second, json!({"ok": true, "removed": false}));
        Ok(())
    }

    #[tokio::test]
    async fn unsupported_method_is_rejected() -> Result<()> {
        let scratch = scratch_dir()?;
        let server = server(scratch.path())?;
        let request = Request::builder()
            .method("PATCH")
            .uri("/api/admin/visa-policies")
            .body(Body::empty())?;
        let response = server.router().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let request = Request::builder()
            .method("GET")
            .uri("/api/admin/publish")
            .body(Body::empty())?;
        let response = server.router().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        Ok(())
    }

    #[tokio::test]
    async fn responses_carry_request_ids() -> Result<()> {
        let scratch = scratch_dir()?;
        let server = server(scratch.path())?;
        let request = Request::builder().uri("/health").body(Body::empty())?;
        let response = server.router().oneshot(request).await?;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        Ok(())
    }
}
