//! Shallow git clones into a request workspace.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use xmi_core::{CommandInvocation, ConversionError, ConversionResult, SourceFetcher, ToolRunner};

/// Fetches sources with `git clone --depth 1`.
#[derive(Clone)]
pub struct GitFetcher {
    runner: Arc<dyn ToolRunner>,
    git: PathBuf,
    timeout: Duration,
}

impl GitFetcher {
    /// Fetcher running `git` through `runner` with the given clone limit.
    pub fn new(runner: Arc<dyn ToolRunner>, git: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            runner,
            git: git.into(),
            timeout,
        }
    }

    fn invocation(&self, repository_url: &str, destination: &Path) -> CommandInvocation {
        CommandInvocation::new(&self.git)
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg(repository_url)
            .arg(destination)
    }
}

#[async_trait]
impl SourceFetcher for GitFetcher {
    async fn fetch(&self, repository_url: &str, destination: &Path) -> ConversionResult<()> {
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| ConversionError::io("fetch.create_parent", parent, err))?;
        }

        let invocation = self.invocation(repository_url, destination);
        let fetch_failed = |detail: String| ConversionError::FetchFailed {
            url: repository_url.to_string(),
            detail,
        };
        match self.runner.run(&invocation, self.timeout).await {
            Ok(result) => {
                info!(
                    url = %repository_url,
                    elapsed_ms = u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX),
                    "repository cloned"
                );
                Ok(())
            }
            Err(ConversionError::ExternalToolFailed { stderr, .. }) => Err(fetch_failed(stderr)),
            Err(other) => Err(fetch_failed(other.to_string())),
        }
    }
}
