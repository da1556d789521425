//! Traits implemented by process adapters and the request orchestrator.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;

use crate::command::{CommandInvocation, ToolCommand};
use crate::error::ConversionResult;
use crate::model::{Artifact, ConversionRequest, ExecutionResult};

/// Executes an external process with a hard time limit.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `invocation` to completion or until `timeout` elapses.
    ///
    /// Implementations must report a non-zero exit as
    /// [`ConversionError::ExternalToolFailed`](crate::ConversionError::ExternalToolFailed),
    /// a spawn failure as `LaunchFailed`, and an expired limit as `TimedOut`
    /// after the process has been killed.
    async fn run(
        &self,
        invocation: &CommandInvocation,
        timeout: Duration,
    ) -> ConversionResult<ExecutionResult>;
}

/// Materialises a remote source repository into a local directory.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Shallow-clone `repository_url` into `destination`.
    async fn fetch(&self, repository_url: &str, destination: &Path) -> ConversionResult<()>;
}

/// Locates the extraction tool for the next invocation.
pub trait ToolResolver: Send + Sync {
    /// Resolve the launcher and jar to use.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::ToolNotFound`](crate::ConversionError::ToolNotFound)
    /// when no artifact is available.
    fn resolve(&self) -> ConversionResult<ToolCommand>;
}

/// End-to-end conversion of one request into an artifact.
#[async_trait]
pub trait ConversionWorkflow: Send + Sync {
    /// Validate `request`, run the extraction and return the requested artifact.
    async fn convert(&self, request: ConversionRequest) -> ConversionResult<Artifact>;
}
