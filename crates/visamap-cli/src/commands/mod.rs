//! Command handlers grouped by concern.

pub(crate) mod policies;
pub(crate) mod publish;
