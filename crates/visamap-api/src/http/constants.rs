//! Header names and problem type URIs shared across handlers.

pub(crate) const HEADER_ADMIN_PASSWORD: &str = "x-admin-password";
pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

pub(crate) const PROBLEM_INTERNAL: &str = "https://visamap.dev/problems/internal";
pub(crate) const PROBLEM_UNAUTHORIZED: &str = "https://visamap.dev/problems/unauthorized";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://visamap.dev/problems/bad-request";
pub(crate) const PROBLEM_VALIDATION: &str = "https://visamap.dev/problems/validation";
pub(crate) const PROBLEM_EMPTY_STORE: &str = "https://visamap.dev/problems/empty-store";
pub(crate) const PROBLEM_SERVICE_UNAVAILABLE: &str =
    "https://visamap.dev/problems/service-unavailable";
