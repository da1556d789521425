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

//! HTTP surface of the XMI service.
//!
//! Layout: `http/router.rs` (router and server host), `http/convert.rs`
//! (conversion endpoint), `http/multipart.rs` (form decoding), `http/health.rs`,
//! `http/errors.rs` (error responses), `http/telemetry.rs` (metrics layer),
//! `state.rs` (shared handler state), `error.rs` (server errors).

pub mod error;
pub mod http;
pub mod state;

pub use error::{ApiServerError, ApiServerResult};
pub use http::router::ApiServer;
pub use state::{ApiState, UploadLimits};
