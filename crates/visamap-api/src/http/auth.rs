//! Admin credential capture for privileged routes.
//!
//! The credential is only captured here; the gateway and publisher decide
//! whether it matches, after request validation has run.

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::http::constants::HEADER_ADMIN_PASSWORD;

/// Value of the `x-admin-password` header; empty when absent or not UTF-8.
#[derive(Clone, Debug, Default)]
pub(crate) struct AdminCredential(String);

impl AdminCredential {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

pub(crate) async fn capture_admin_credential(mut req: Request<Body>, next: Next) -> Response {
    let credential = req
        .headers()
        .get(HEADER_ADMIN_PASSWORD)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_default();
    req.extensions_mut().insert(AdminCredential(credential));
    next.run(req).await
}

#[cfg(test)]
pub(crate) fn credential(value: &str) -> AdminCredential {
    AdminCredential(value.to_string())
}
