//! Public lookup over the published artifacts.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use visamap_api_models::{LookupQuery, LookupResponse};
use visamap_core::PolicyCode;

use crate::http::errors::ApiError;
use crate::state::ApiState;

pub(crate) async fn lookup(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<LookupQuery>,
) -> Result<Json<LookupResponse>, ApiError> {
    let LookupQuery {
        origin,
        destination,
    } = query;
    if origin.trim().is_empty() || destination.trim().is_empty() {
        return Err(ApiError::bad_request(
            "origin and destination query parameters are required",
        ));
    }

    let found = state.reader.lookup(&origin, &destination).await?;
    Ok(Json(LookupResponse {
        origin,
        destination,
        policy_code: found.policy.map(PolicyCode::code),
        policy_label: found.policy.map(|code| code.label().to_string()),
        duration_days: found.duration_days,
    }))
}
