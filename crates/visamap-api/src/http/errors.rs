//! RFC9457-style API error wrapper and domain error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;
use visamap_api_models::{ProblemDetails, ProblemInvalidParam};
use visamap_core::{GatewayError, MAX_DURATION_DAYS};
use visamap_publish::PublishError;
use visamap_telemetry::RequestContext;

use crate::http::constants::{
    PROBLEM_BAD_REQUEST, PROBLEM_EMPTY_STORE, PROBLEM_INTERNAL, PROBLEM_SERVICE_UNAVAILABLE,
    PROBLEM_UNAUTHORIZED, PROBLEM_VALIDATION,
};

/// Structured API error with optional RFC9457 fields.
#[derive(Debug)]
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) kind: &'static str,
    title: &'static str,
    detail: Option<String>,
    pub(crate) invalid_params: Option<Vec<ProblemInvalidParam>>,
}

impl ApiError {
    const fn new(status: StatusCode, kind: &'static str, title: &'static str) -> Self {
        Self {
            status,
            kind,
            title,
            detail: None,
            invalid_params: None,
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub(crate) fn with_invalid_params(mut self, params: Vec<ProblemInvalidParam>) -> Self {
        self.invalid_params = Some(params);
        self
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            PROBLEM_INTERNAL,
            "internal server error",
        )
        .with_detail(message)
    }

    pub(crate) fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            PROBLEM_UNAUTHORIZED,
            "authentication required",
        )
        .with_detail(detail)
    }

    pub(crate) fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, PROBLEM_BAD_REQUEST, "bad request").with_detail(detail)
    }

    pub(crate) fn validation(field: &str, reason: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            PROBLEM_VALIDATION,
            "invalid policy entry",
        )
        .with_detail(format!("{field} is invalid"))
        .with_invalid_params(vec![ProblemInvalidParam {
            pointer: format!("/{field}"),
            message: validation_message(reason),
        }])
    }

    pub(crate) fn empty_store() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            PROBLEM_EMPTY_STORE,
            "nothing to publish",
        )
        .with_detail("no data in database; run the seed script first")
    }

    pub(crate) fn service_unavailable(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            PROBLEM_SERVICE_UNAVAILABLE,
            "service unavailable",
        )
        .with_detail(detail)
    }
}

fn validation_message(reason: &str) -> String {
    match reason {
        "required" => "is required".to_string(),
        "unknown_code" => "must be a policy code between 0 and 15".to_string(),
        "out_of_range" => format!("must be between 0 and {MAX_DURATION_DAYS}"),
        other => other.to_string(),
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Unauthorized => Self::unauthorized("admin password rejected"),
            GatewayError::Validation { field, reason } => Self::validation(field, reason),
            GatewayError::StoreUnavailable { operation, source } => {
                error!(error = %source, operation, "policy store call failed");
                Self::internal("policy store unavailable")
            }
        }
    }
}

impl From<PublishError> for ApiError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Unauthorized => Self::unauthorized("admin password rejected"),
            PublishError::EmptyStore => Self::empty_store(),
            PublishError::Store { operation, source } => {
                error!(error = %source, operation, "policy store read failed during publish");
                Self::internal("policy store unavailable")
            }
            PublishError::Io {
                operation,
                path,
                source,
            } => {
                error!(error = %source, operation, path = %path.display(), "artifact io failed");
                Self::internal("failed to write artifacts")
            }
            PublishError::Serialize { artifact, source } => {
                error!(error = %source, artifact, "artifact serialisation failed");
                Self::internal("failed to render artifacts")
            }
            PublishError::Corrupt { path, source } => {
                error!(error = %source, path = %path.display(), "published artifact is corrupt");
                Self::internal("published artifacts are unreadable")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let context = RequestContext::current();
        if self.status.is_server_error() {
            error!(
                status = self.status.as_u16(),
                kind = self.kind,
                request_id = context.as_ref().map_or("", RequestContext::request_id),
                route = context.as_ref().map_or("", RequestContext::route),
                "request failed"
            );
        }
        let body = ProblemDetails {
            kind: self.kind.to_string(),
            title: self.title.to_string(),
            status: self.status.as_u16(),
            detail: self.detail,
            invalid_params: self.invalid_params,
            request_id: context
                .map(|context| context.request_id().to_string())
                .filter(|id| !id.is_empty()),
        };
        (self.status, Json(body)).into_response()
    }
}
