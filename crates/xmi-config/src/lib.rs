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

//! Environment-driven configuration for the XMI service.
//!
//! Layout: `defaults.rs` (variable names and default values), `model.rs`
//! (typed settings), `loader.rs` (lookup and validation), `error.rs`.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use model::{ServiceConfig, Timeouts, ToolSettings};
