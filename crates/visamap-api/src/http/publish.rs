//! Publish handler.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, State},
};
use visamap_api_models::PublishResponse;
use visamap_publish::PublishError;

use crate::http::auth::AdminCredential;
use crate::http::errors::ApiError;
use crate::state::ApiState;

pub(crate) async fn publish(
    State(state): State<Arc<ApiState>>,
    Extension(credential): Extension<AdminCredential>,
) -> Result<Json<PublishResponse>, ApiError> {
    match state.publisher.publish(credential.as_str()).await {
        Ok(report) => {
            state.telemetry.inc_publish("ok");
            state.telemetry.set_published(report.origins, report.entries);
            Ok(Json(PublishResponse {
                ok: true,
                passports: report.origins,
                total_entries: report.entries,
                published_at: report.published_at,
            }))
        }
        Err(err) => {
            let outcome = match &err {
                PublishError::Unauthorized => {
                    state.telemetry.inc_auth_failure();
                    "unauthorized"
                }
                PublishError::EmptyStore => "empty_store",
                _ => "error",
            };
            state.telemetry.inc_publish(outcome);
            Err(err.into())
        }
    }
}
