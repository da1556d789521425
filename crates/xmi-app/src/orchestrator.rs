//! Request orchestrator: validated options in, artifact bytes out.
//!
//! Each call runs sequentially on its own workspace:
//! validate → acquire workspace → resolve tool → materialise input → run tool
//! → read artifact → release workspace. Nothing is retried and the workspace
//! is removed on every exit path.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;
use xmi_config::Timeouts;
use xmi_core::{
    Artifact, ArtifactLayout, ConversionError, ConversionInput, ConversionRequest,
    ConversionResult, ConversionWorkflow, InputMode, OutputFormat, RequestOptions, SourceFetcher,
    SourceOrigin, ToolResolver, ToolRunner, build_command,
};
use xmi_fsops::{Workspace, WorkspaceManager, extract_archive};
use xmi_telemetry::{Metrics, current_request_id};

const WORKSPACE_PREFIX: &str = "xmi";
const OUTCOME_OK: &str = "ok";

/// Collaborators required by [`ConversionOrchestrator`].
pub struct OrchestratorDeps {
    /// Runs the extraction tool.
    pub runner: Arc<dyn ToolRunner>,
    /// Clones repositories for repository-backed requests.
    pub fetcher: Arc<dyn SourceFetcher>,
    /// Finds the tool jar for each request.
    pub resolver: Arc<dyn ToolResolver>,
    /// Allocates per-request workspaces.
    pub workspaces: WorkspaceManager,
    /// Tool time limits per input mode.
    pub timeouts: Timeouts,
    /// Shared metrics registry.
    pub telemetry: Metrics,
}

/// Drives one conversion per call.
pub struct ConversionOrchestrator {
    runner: Arc<dyn ToolRunner>,
    fetcher: Arc<dyn SourceFetcher>,
    resolver: Arc<dyn ToolResolver>,
    workspaces: WorkspaceManager,
    timeouts: Timeouts,
    telemetry: Metrics,
}

impl ConversionOrchestrator {
    /// Build an orchestrator from its collaborators.
    #[must_use]
    pub fn new(deps: OrchestratorDeps) -> Self {
        let OrchestratorDeps {
            runner,
            fetcher,
            resolver,
            workspaces,
            timeouts,
            telemetry,
        } = deps;
        Self {
            runner,
            fetcher,
            resolver,
            workspaces,
            timeouts,
            telemetry,
        }
    }

    const fn tool_timeout(&self, mode: InputMode) -> Duration {
        match mode {
            InputMode::Ir => self.timeouts.ir,
            InputMode::Source => self.timeouts.source,
        }
    }

    async fn execute(&self, options: RequestOptions) -> ConversionResult<Artifact> {
        let workspace = self.workspaces.acquire(WORKSPACE_PREFIX)?;
        info!(path = %workspace.path().display(), "workspace acquired");

        let resolver = Arc::clone(&self.resolver);
        let tool = tokio::task::spawn_blocking(move || resolver.resolve())
            .await
            .map_err(|err| {
                ConversionError::io("tool.resolve", workspace.path(), io::Error::other(err))
            })??;
        let layout = workspace.layout();
        self.materialise(&options.input, &workspace, &layout).await?;

        let output_dir = workspace.output_dir();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|err| ConversionError::io("workspace.create_output_dir", &output_dir, err))?;

        let invocation = build_command(&tool, &options, &layout);
        let execution = self
            .runner
            .run(&invocation, self.tool_timeout(options.input_mode()))
            .await?;
        self.telemetry.observe_tool_duration(execution.elapsed);

        let artifact = artifact_path(&options, &layout);
        let body = tokio::fs::read(artifact)
            .await
            .map_err(|err| ConversionError::io("artifact.read", artifact, err))?;
        info!(bytes = body.len(), "artifact read");

        workspace.release();
        Ok(Artifact {
            format: options.output,
            body,
        })
    }

    async fn materialise(
        &self,
        input: &ConversionInput,
        workspace: &Workspace,
        layout: &ArtifactLayout,
    ) -> ConversionResult<()> {
        match input {
            ConversionInput::Ir { payload } => {
                tokio::fs::write(&layout.ir_input, payload)
                    .await
                    .map_err(|err| ConversionError::io("ir.write", &layout.ir_input, err))?;
                info!(bytes = payload.len(), "IR payload written");
            }
            ConversionInput::Source { origin, .. } => {
                match origin {
                    SourceOrigin::RepositoryUrl(url) => {
                        self.fetcher.fetch(url, &layout.source_dir).await?;
                    }
                    SourceOrigin::Archive(bytes) => {
                        self.unpack(bytes, workspace, layout).await?;
                    }
                }
                info!(origin = origin.as_str(), "source materialised");
            }
        }
        Ok(())
    }

    async fn unpack(
        &self,
        bytes: &[u8],
        workspace: &Workspace,
        layout: &ArtifactLayout,
    ) -> ConversionResult<()> {
        let archive = workspace.archive_path();
        tokio::fs::write(&archive, bytes)
            .await
            .map_err(|err| ConversionError::io("archive.write", &archive, err))?;
        let destination = layout.source_dir.clone();
        let summary = tokio::task::spawn_blocking(move || extract_archive(&archive, &destination))
            .await
            .map_err(|err| {
                ConversionError::io("archive.extract", &layout.source_dir, io::Error::other(err))
            })??;
        info!(
            files = summary.files,
            directories = summary.directories,
            "archive extracted"
        );
        Ok(())
    }
}

/// File holding the requested artifact once the tool has exited.
///
/// IR output for IR input is the submitted payload itself, so the caller gets
/// back exactly the bytes it sent.
fn artifact_path<'a>(options: &RequestOptions, layout: &'a ArtifactLayout) -> &'a Path {
    match (options.output, options.input_mode()) {
        (OutputFormat::Xmi, _) => &layout.xmi_output,
        (OutputFormat::Ir, InputMode::Ir) => &layout.ir_input,
        (OutputFormat::Ir, InputMode::Source) => &layout.ir_output,
    }
}

#[async_trait]
impl ConversionWorkflow for ConversionOrchestrator {
    async fn convert(&self, request: ConversionRequest) -> ConversionResult<Artifact> {
        let options = RequestOptions::from_request(request)?;
        let input = options.input_mode();
        let output = options.output;
        let span = info_span!(
            "conversion",
            conversion_id = %Uuid::new_v4(),
            request_id = %current_request_id().unwrap_or_default(),
            input = input.as_str(),
            output = output.as_str()
        );

        let result = self.execute(options).instrument(span).await;
        let outcome = result
            .as_ref()
            .map_or_else(ConversionError::kind, |_| OUTCOME_OK);
        self.telemetry
            .inc_conversion(input.as_str(), output.as_str(), outcome);
        result
    }
}
