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

//! Server configuration loaded once from the process environment.
//!
//! Layout: model.rs (`AppConfig` and defaults), loader.rs (lookup + validation),
//! error.rs (`ConfigError`).

pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use model::{
    AppConfig, DEFAULT_ARTIFACT_DIR, DEFAULT_BIND_ADDR, DEFAULT_DB_MAX_CONNECTIONS, env,
};
