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

//! Domain model and service seams for the XMI conversion gateway.
//!
//! Layout: `model.rs` (request-scoped types and the validation gate),
//! `command.rs` (option → argument translation), `error.rs` (failure taxonomy),
//! `service.rs` (traits implemented by adapters and the orchestrator).

pub mod command;
pub mod error;
pub mod model;
pub mod service;

pub use command::{ArtifactLayout, CommandInvocation, ToolCommand, build_command};
pub use error::{ConversionError, ConversionResult, single_line};
pub use model::{
    Artifact, ConversionInput, ConversionRequest, ExecutionResult, ExtractionOptions, InputMode,
    OutputFormat, RequestOptions, SourceLanguage, SourceOrigin,
};
pub use service::{ConversionWorkflow, SourceFetcher, ToolResolver, ToolRunner};
