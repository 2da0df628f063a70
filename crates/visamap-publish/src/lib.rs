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

//! Publishing pipeline: full store read, reshaping into nested lookup mappings,
//! and an atomic commit of `visaPolicy.json` and `visaDuration.json`.
//!
//! Layout: `artifact.rs` (nested mappings and rendering), `writer.rs` (staged
//! commit), `reader.rs` (lookup over committed artifacts), `service.rs` (`Publisher`).

pub mod artifact;
pub mod error;
pub mod reader;
pub mod service;
pub mod writer;

pub use artifact::{NestedMap, PolicyArtifacts, RenderedArtifacts};
pub use error::{PublishError, PublishResult};
pub use reader::{ArtifactLookup, ArtifactReader};
pub use service::{PublishReport, Publisher};
pub use writer::{ArtifactWriter, DURATION_FILE, POLICY_FILE};
