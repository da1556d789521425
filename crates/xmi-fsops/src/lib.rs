#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

//! Filesystem side of a conversion: per-request workspaces and safe archive extraction.
//!
//! Layout: `workspace.rs` (scoped temp directories), `archive.rs` (zip extraction),
//! `error.rs` (fsops errors and their mapping onto the conversion taxonomy).

pub mod archive;
pub mod error;
pub mod workspace;

pub use archive::{ExtractSummary, extract_archive};
pub use error::{FsOpsError, FsOpsResult};
pub use workspace::{Workspace, WorkspaceManager};
