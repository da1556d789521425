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

//! Process-level adapters: the bounded child-process runner, the git source
//! fetcher and the extraction tool locator.

pub mod fetch;
pub mod locator;
pub mod runner;

pub use fetch::GitFetcher;
pub use locator::JarLocator;
pub use runner::ProcessRunner;
