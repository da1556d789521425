#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! XMI gateway application wiring.
//!
//! Layout: `bootstrap.rs` (service wiring), `orchestrator.rs` (per-request
//! conversion pipeline), `error.rs` (startup errors).

/// Application bootstrap and environment loading.
pub mod bootstrap;
/// Application-level errors.
pub mod error;
/// Conversion pipeline behind `POST /v1/xmi`.
pub mod orchestrator;

pub use bootstrap::run_app;
pub use error::{AppError, AppResult};
pub use orchestrator::{ConversionOrchestrator, OrchestratorDeps};
