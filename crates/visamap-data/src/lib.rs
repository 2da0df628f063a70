#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Data access layer for visamap: migrations and the `PostgreSQL` policy store.

pub mod error;
pub mod policies;

pub use error::{DataError, Result as DataResult};
pub use policies::PgPolicyStore;
