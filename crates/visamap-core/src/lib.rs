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

//! Engine-agnostic visa policy model, store trait, and the query/mutation gateway.
//!
//! Layout: `model.rs` (entries, codes, filters), `auth.rs` (shared admin secret),
//! `store.rs` (`PolicyStore` trait), `memory.rs` (in-process store), `gateway.rs`
//! (validated and authorised access to a store).

pub mod auth;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod model;
pub mod store;

pub use auth::AdminSecret;
pub use error::{GatewayError, GatewayResult, StoreError, StoreResult, UnknownPolicyCode};
pub use gateway::{DeleteAck, PolicyGateway};
pub use memory::MemoryPolicyStore;
pub use model::{
    MAX_DURATION_DAYS, PolicyCode, PolicyDraft, PolicyEntry, PolicyFilter, PolicyKey,
};
pub use store::{PolicyStore, SharedPolicyStore};
