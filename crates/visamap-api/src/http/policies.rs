//! Policy admin handlers: list, upsert, delete, and the auth check.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query, State, rejection::JsonRejection},
};
use visamap_api_models::{
    AckResponse, AuthRequest, DeleteResponse, PolicyKeyRequest, PolicyListQuery,
    PolicyUpsertRequest, PolicyView,
};
use visamap_core::{GatewayError, PolicyDraft, PolicyFilter};

use crate::http::auth::AdminCredential;
use crate::http::errors::ApiError;
use crate::state::ApiState;

pub(crate) async fn list_policies(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<PolicyListQuery>,
) -> Result<Json<Vec<PolicyView>>, ApiError> {
    let filter = PolicyFilter::new(query.origin, query.destination);
    let entries = state.gateway.list(&filter).await?;
    Ok(Json(entries.into_iter().map(PolicyView::from).collect()))
}

pub(crate) async fn upsert_policy(
    State(state): State<Arc<ApiState>>,
    Extension(credential): Extension<AdminCredential>,
    payload: Result<Json<PolicyUpsertRequest>, JsonRejection>,
) -> Result<Json<PolicyView>, ApiError> {
    let draft: PolicyDraft = read_body(&state, "upsert", payload)?.into();
    let result = state.gateway.upsert(draft, credential.as_str()).await;
    record_mutation(&state, "upsert", result.as_ref().err());
    Ok(Json(PolicyView::from(result?)))
}

pub(crate) async fn delete_policy(
    State(state): State<Arc<ApiState>>,
    Extension(credential): Extension<AdminCredential>,
    payload: Result<Json<PolicyKeyRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let key = read_body(&state, "delete", payload)?;
    let result = state
        .gateway
        .delete(&key.origin, &key.destination, credential.as_str())
        .await;
    record_mutation(&state, "delete", result.as_ref().err());
    let ack = result?;
    Ok(Json(DeleteResponse {
        ok: true,
        removed: ack.removed,
    }))
}

pub(crate) async fn check_auth(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<AckResponse>, ApiError> {
    let request = json_body(payload)?;
    if let Err(err) = state.gateway.check_credential(&request.password) {
        state.telemetry.inc_auth_failure();
        return Err(err.into());
    }
    Ok(Json(AckResponse::ok()))
}

/// A request without a JSON content type reads as an empty body, so field
/// validation reports what is missing. Malformed JSON is a problem response.
fn json_body<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
    }
}

fn read_body<T: Default>(
    state: &ApiState,
    operation: &str,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    json_body(payload).inspect_err(|_| {
        state.telemetry.inc_policy_mutation(operation, "invalid");
    })
}

fn record_mutation(state: &ApiState, operation: &str, err: Option<&GatewayError>) {
    let outcome = match err {
        None => "ok",
        Some(GatewayError::Unauthorized) => {
            state.telemetry.inc_auth_failure();
            "unauthorized"
        }
        Some(GatewayError::Validation { .. }) => "invalid",
        Some(GatewayError::StoreUnavailable { .. }) => "error",
    };
    state.telemetry.inc_policy_mutation(operation, outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::http::StatusCode;
    use visamap_core::{MemoryPolicyStore, PolicyCode, PolicyStore};
    use visamap_test_support::{ADMIN_PASSWORD, entry, sample_entries, scratch_dir};

    use crate::http::auth::credential;
    use crate::state::test_support::state_with;

    fn upsert_body(
        origin: &str,
        destination: &str,
        code: i64,
    ) -> Result<Json<PolicyUpsertRequest>, JsonRejection> {
        Ok(Json(PolicyUpsertRequest {
            origin: origin.to_string(),
            destination: destination.to_string(),
            policy_code: Some(code),
            duration_days: Some(180),
        }))
    }

    fn key_body(origin: &str, destination: &str) -> Result<Json<PolicyKeyRequest>, JsonRejection> {
        Ok(Json(PolicyKeyRequest {
            origin: origin.to_string(),
            destination: destination.to_string(),
        }))
    }

    #[tokio::test]
    async fn list_filters_by_origin_alias() -> Result<()> {
        let scratch = scratch_dir()?;
        let state = state_with(
            Arc::new(MemoryPolicyStore::with_entries(sample_entries())),
            scratch.path(),
        );
        let query: PolicyListQuery = serde_json::from_value(serde_json::json!({
            "passport": "Japan"
        }))?;
        let Json(views) = list_policies(State(state), Query(query))
            .await
            .map_err(|err| anyhow::anyhow!("{:?}", err.status))?;
        let destinations: Vec<_> = views.iter().map(|view| view.destination.as_str()).collect();
        assert_eq!(destinations, vec!["Canada", "Chile"]);
        Ok(())
    }

    #[tokio::test]
    async fn upsert_returns_stored_row() -> Result<()> {
        let scratch = scratch_dir()?;
        let store = Arc::new(MemoryPolicyStore::new());
        let state = state_with(Arc::clone(&store), scratch.path());
        let Json(view) = upsert_policy(
            State(Arc::clone(&state)),
            Extension(credential(ADMIN_PASSWORD)),
            upsert_body("Germany", "Canada", 7),
        )
        .await
        .map_err(|err| anyhow::anyhow!("{:?}", err.status))?;
        assert_eq!(view.policy_code, 7);
        assert_eq!(view.duration_days, 180);
        assert_eq!(
            store.load_all().await?,
            vec![entry("Germany", "Canada", PolicyCode::VisaFree, 180)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn upsert_with_wrong_password_is_unauthorized() -> Result<()> {
        let scratch = scratch_dir()?;
        let store = Arc::new(MemoryPolicyStore::new());
        let state = state_with(Arc::clone(&store), scratch.path());
        let err = upsert_policy(
            State(Arc::clone(&state)),
            Extension(credential("wrong")),
            upsert_body("Germany", "Canada", 7),
        )
        .await
        .expect_err("unauthorized");
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(store.count().await?, 0);
        assert_eq!(state.telemetry.snapshot().auth_failures_total, 1);
        Ok(())
    }

    #[tokio::test]
    async fn empty_body_is_a_validation_error_even_without_credential() -> Result<()> {
        let scratch = scratch_dir()?;
        let state = state_with(Arc::new(MemoryPolicyStore::new()), scratch.path());
        let err = upsert_policy(
            State(Arc::clone(&state)),
            Extension(credential("")),
            Ok(Json(PolicyUpsertRequest::default())),
        )
        .await
            .expect_err("validation");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let err = delete_policy(State(state), Extension(credential("")), key_body("Japan", ""))
            .await
            .expect_err("validation");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let params = err.invalid_params.expect("invalid params");
        assert_eq!(params[0].pointer, "/destination");
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_acknowledged_twice() -> Result<()> {
        let scratch = scratch_dir()?;
        let store = Arc::new(MemoryPolicyStore::with_entries(sample_entries()));
        let state = state_with(Arc::clone(&store), scratch.path());
        for expected_removed in [true, false] {
            let Json(ack) = delete_policy(
                State(Arc::clone(&state)),
                Extension(credential(ADMIN_PASSWORD)),
                key_body("Japan", "Chile"),
            )
            .await
            .map_err(|err| anyhow::anyhow!("{:?}", err.status))?;
            assert!(ack.ok);
            assert_eq!(ack.removed, expected_removed);
        }
        assert_eq!(store.count().await?, 4);
        Ok(())
    }

    #[tokio::test]
    async fn store_outage_maps_to_server_error() -> Result<()> {
        let scratch = scratch_dir()?;
        let store = Arc::new(MemoryPolicyStore::new());
        store.set_unavailable(true);
        let state = state_with(store, scratch.path());
        let err = list_policies(State(state), Query(PolicyListQuery::default()))
            .await
            .expect_err("store down");
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }

    #[tokio::test]
    async fn auth_check_compares_password_exactly() -> Result<()> {
        let scratch = scratch_dir()?;
        let state = state_with(Arc::new(MemoryPolicyStore::new()), scratch.path());
        let ok = check_auth(
            State(Arc::clone(&state)),
            Ok(Json(AuthRequest {
                password: ADMIN_PASSWORD.to_string(),
            })),
        )
        .await
        .map_err(|err| anyhow::anyhow!("{:?}", err.status))?;
        assert!(ok.0.ok);

        let err = check_auth(State(Arc::clone(&state)), Ok(Json(AuthRequest::default())))
            .await
            .expect_err("empty password");
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(state.telemetry.snapshot().auth_failures_total, 1);
        Ok(())
    }
}
