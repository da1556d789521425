use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use xmi_app::{ConversionOrchestrator, OrchestratorDeps};
use xmi_config::Timeouts;
use xmi_core::{
    ConversionError, ConversionRequest, ConversionWorkflow, ExtractionOptions, OutputFormat,
};
use xmi_fsops::WorkspaceManager;
use xmi_telemetry::Metrics;
use xmi_test_support::fixtures::{ZipFixture, java_project_zip, scratch_dir};
use xmi_test_support::mocks::{FixedTool, RecordingRunner, RunnerScript, StaticFetcher, flag_value};

const IR_TIMEOUT: Duration = Duration::from_secs(300);
const SOURCE_TIMEOUT: Duration = Duration::from_secs(480);

struct Harness {
    _scratch: tempfile::TempDir,
    workspace_root: PathBuf,
    runner: Arc<RecordingRunner>,
    fetcher: Arc<StaticFetcher>,
    telemetry: Metrics,
    orchestrator: ConversionOrchestrator,
}

impl Harness {
    fn new(runner: RecordingRunner, fetcher: StaticFetcher, resolver: FixedTool) -> Result<Self> {
        let scratch = scratch_dir()?;
        let workspace_root = scratch.path().join("workspaces");
        let runner = Arc::new(runner);
        let fetcher = Arc::new(fetcher);
        let telemetry = Metrics::new()?;
        let orchestrator = ConversionOrchestrator::new(OrchestratorDeps {
            runner: runner.clone(),
            fetcher: fetcher.clone(),
            resolver: Arc::new(resolver),
            workspaces: WorkspaceManager::new(&workspace_root, telemetry.clone()),
            timeouts: Timeouts {
                clone: Duration::from_secs(300),
                ir: IR_TIMEOUT,
                source: SOURCE_TIMEOUT,
            },
            telemetry: telemetry.clone(),
        });
        Ok(Self {
            _scratch: scratch,
            workspace_root,
            runner,
            fetcher,
            telemetry,
            orchestrator,
        })
    }

    fn succeeding() -> Result<Self> {
        Self::new(
            RecordingRunner::succeeding(),
            StaticFetcher::with_java_class(),
            FixedTool::available(),
        )
    }

    fn leftover_workspaces(&self) -> Result<usize> {
        if !self.workspace_root.exists() {
            return Ok(0);
        }
        Ok(fs::read_dir(&self.workspace_root)?.count())
    }

    fn only_call(&self) -> Result<(Vec<String>, Duration, PathBuf)> {
        let calls = self.runner.calls();
        let [(invocation, timeout)] = calls.as_slice() else {
            bail!("expected exactly one tool call, got {}", calls.len());
        };
        let cwd = invocation
            .current_dir
            .clone()
            .ok_or_else(|| anyhow!("tool must run inside the workspace"))?;
        Ok((invocation.args_lossy(), *timeout, cwd))
    }
}

fn ir_request(payload: &str, format: &str) -> ConversionRequest {
    ConversionRequest {
        ir_json: Some(payload.to_string()),
        result_format: Some(format.to_string()),
        ..ConversionRequest::default()
    }
}

fn archive_request(archive: Vec<u8>, format: &str) -> ConversionRequest {
    ConversionRequest {
        language: Some("java".to_string()),
        input_zip: Some(archive),
        result_format: Some(format.to_string()),
        ..ConversionRequest::default()
    }
}

fn position(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|arg| arg == flag)
}

fn under(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

#[tokio::test]
async fn ir_input_produces_tool_xmi_and_cleans_up() -> Result<()> {
    let harness = Harness::succeeding()?;
    let artifact = harness
        .orchestrator
        .convert(ir_request(r#"{"classes":[{"name":"Order"}]}"#, "xmi"))
        .await?;

    assert_eq!(artifact.format, OutputFormat::Xmi);
    assert_eq!(artifact.body, b"<xmi:XMI/>");

    let (args, timeout, cwd) = harness.only_call()?;
    assert_eq!(timeout, IR_TIMEOUT);
    assert!(under(&cwd, &harness.workspace_root));
    assert_eq!(&args[..2], &["-jar".to_string(), "/opt/java-to-xmi.jar".to_string()]);
    let ir = position(&args, "--ir").ok_or_else(|| anyhow!("missing --ir"))?;
    let output = position(&args, "--output").ok_or_else(|| anyhow!("missing --output"))?;
    assert!(ir < output);
    assert!(args[ir + 1].ends_with("model.ir.json"));
    assert!(args[output + 1].ends_with("model.xmi"));
    assert!(position(&args, "--source").is_none());
    assert!(position(&args, "--write-ir").is_none());

    assert_eq!(harness.leftover_workspaces()?, 0);
    assert!(!cwd.exists());
    assert_eq!(harness.telemetry.conversion_count("ir", "xmi", "ok"), 1);
    assert_eq!(harness.telemetry.snapshot().tool_last_duration_ms, 5);
    Ok(())
}

#[tokio::test]
async fn ir_to_ir_returns_submitted_payload_byte_for_byte() -> Result<()> {
    let payload = " {\"classes\" : [ ] }\n\n";
    let harness = Harness::new(
        RecordingRunner::new(RunnerScript::SucceedWithoutOutput),
        StaticFetcher::with_java_class(),
        FixedTool::available(),
    )?;
    let artifact = harness
        .orchestrator
        .convert(ir_request(payload, "ir"))
        .await?;

    assert_eq!(artifact.format, OutputFormat::Ir);
    assert_eq!(artifact.body, payload.as_bytes());
    assert_eq!(harness.runner.calls().len(), 1);
    assert_eq!(harness.leftover_workspaces()?, 0);
    Ok(())
}

#[tokio::test]
async fn archive_input_requests_ir_snapshot() -> Result<()> {
    let harness = Harness::succeeding()?;
    let mut request = archive_request(java_project_zip()?, "ir");
    request.extraction = ExtractionOptions {
        name: Some("Shop".to_string()),
        exclude: vec!["a/**".to_string(), "b/**".to_string()],
        ..ExtractionOptions::default()
    };
    let artifact = harness.orchestrator.convert(request).await?;

    assert_eq!(artifact.format, OutputFormat::Ir);
    assert_eq!(artifact.body, br#"{"classes":[]}"#);

    let (args, timeout, _) = harness.only_call()?;
    assert_eq!(timeout, SOURCE_TIMEOUT);
    let source = position(&args, "--source").ok_or_else(|| anyhow!("missing --source"))?;
    assert!(args[source + 1].ends_with("source"));
    assert!(position(&args, "--output").is_some());
    let write_ir = position(&args, "--write-ir").ok_or_else(|| anyhow!("missing --write-ir"))?;
    assert!(args[write_ir + 1].ends_with("model.ir.json"));
    let name = position(&args, "--name").ok_or_else(|| anyhow!("missing --name"))?;
    assert_eq!(args[name + 1], "Shop");
    let excludes: Vec<&str> = args
        .windows(2)
        .filter(|pair| pair[0] == "--exclude")
        .map(|pair| pair[1].as_str())
        .collect();
    assert_eq!(excludes, vec!["a/**", "b/**"]);

    assert_eq!(harness.leftover_workspaces()?, 0);
    assert_eq!(harness.telemetry.conversion_count("source", "ir", "ok"), 1);
    Ok(())
}

#[tokio::test]
async fn repository_input_is_cloned_into_source_dir() -> Result<()> {
    let harness = Harness::succeeding()?;
    let request = ConversionRequest {
        language: Some("Java".to_string()),
        repo_url: Some("https://example.invalid/acme/shop.git".to_string()),
        input_zip: Some(java_project_zip()?),
        ..ConversionRequest::default()
    };
    let artifact = harness.orchestrator.convert(request).await?;
    assert_eq!(artifact.format, OutputFormat::Xmi);
    assert_eq!(
        harness.fetcher.urls(),
        vec!["https://example.invalid/acme/shop.git".to_string()]
    );

    let invocation = harness
        .runner
        .invocations()
        .pop()
        .ok_or_else(|| anyhow!("tool was not invoked"))?;
    let source = flag_value(&invocation, "--source").ok_or_else(|| anyhow!("missing --source"))?;
    assert!(under(&source, &harness.workspace_root));
    assert_eq!(harness.leftover_workspaces()?, 0);
    Ok(())
}

#[tokio::test]
async fn fetch_failure_is_reported_and_workspace_removed() -> Result<()> {
    let harness = Harness::new(
        RecordingRunner::succeeding(),
        StaticFetcher::failing("fatal: repository not found"),
        FixedTool::available(),
    )?;
    let request = ConversionRequest {
        language: Some("java".to_string()),
        repo_url: Some("https://example.invalid/missing.git".to_string()),
        ..ConversionRequest::default()
    };
    let err = harness
        .orchestrator
        .convert(request)
        .await
        .err()
        .ok_or_else(|| anyhow!("expected fetch failure"))?;
    assert!(matches!(err, ConversionError::FetchFailed { .. }));
    assert!(harness.runner.calls().is_empty());
    assert_eq!(harness.leftover_workspaces()?, 0);
    assert_eq!(
        harness
            .telemetry
            .conversion_count("source", "xmi", "fetch_failed"),
        1
    );
    Ok(())
}

#[tokio::test]
async fn validation_failures_start_no_work() -> Result<()> {
    let harness = Harness::succeeding()?;
    let cases = [
        (
            ConversionRequest::default(),
            "Provide irJson, or language=java with inputZip/repoUrl",
        ),
        (
            ConversionRequest {
                language: Some("kotlin".to_string()),
                input_zip: Some(b"PK".to_vec()),
                ..ConversionRequest::default()
            },
            "Provide irJson, or language=java with inputZip/repoUrl",
        ),
        (
            ConversionRequest {
                language: Some("java".to_string()),
                ..ConversionRequest::default()
            },
            "Provide inputZip or repoUrl",
        ),
        (
            ir_request("{}", "pdf"),
            "resultFormat must be 'xmi' or 'ir'",
        ),
    ];

    for (request, message) in cases {
        let err = harness
            .orchestrator
            .convert(request)
            .await
            .err()
            .ok_or_else(|| anyhow!("expected rejection for {message}"))?;
        assert!(matches!(err, ConversionError::BadRequest { .. }));
        assert_eq!(err.to_string(), message);
    }
    assert!(harness.runner.calls().is_empty());
    assert!(harness.fetcher.urls().is_empty());
    assert!(!harness.workspace_root.exists());
    Ok(())
}

#[tokio::test]
async fn missing_tool_fails_before_the_runner() -> Result<()> {
    let harness = Harness::new(
        RecordingRunner::succeeding(),
        StaticFetcher::with_java_class(),
        FixedTool::missing(),
    )?;
    let err = harness
        .orchestrator
        .convert(ir_request("{}", "xmi"))
        .await
        .err()
        .ok_or_else(|| anyhow!("expected missing tool"))?;
    assert!(matches!(err, ConversionError::ToolNotFound { .. }));
    assert!(harness.runner.calls().is_empty());
    assert_eq!(harness.leftover_workspaces()?, 0);
    Ok(())
}

#[tokio::test]
async fn tool_lookup_runs_off_the_request_thread() -> Result<()> {
    let resolver = FixedTool::available();
    let harness = Harness::new(
        RecordingRunner::succeeding(),
        StaticFetcher::with_java_class(),
        resolver.clone(),
    )?;
    harness.orchestrator.convert(ir_request("{}", "xmi")).await?;

    let threads = resolver.resolve_threads();
    assert_eq!(threads.len(), 1);
    assert_ne!(threads[0], std::thread::current().id());
    Ok(())
}

#[tokio::test]
async fn traversal_archive_is_rejected_without_escaping() -> Result<()> {
    let harness = Harness::succeeding()?;
    let archive = ZipFixture::new()
        .file("src/Ok.java", b"class Ok {}")
        .file("../../evil.txt", b"owned")
        .into_bytes()?;
    let err = harness
        .orchestrator
        .convert(archive_request(archive, "xmi"))
        .await
        .err()
        .ok_or_else(|| anyhow!("expected traversal rejection"))?;
    assert!(matches!(err, ConversionError::PathTraversal { .. }));
    assert!(err.is_client_error());
    assert!(harness.runner.calls().is_empty());
    assert!(!harness.workspace_root.join("evil.txt").exists());
    assert_eq!(harness.leftover_workspaces()?, 0);
    assert_eq!(
        harness
            .telemetry
            .conversion_count("source", "xmi", "path_traversal"),
        1
    );
    Ok(())
}

#[tokio::test]
async fn corrupt_archive_is_a_client_error() -> Result<()> {
    let harness = Harness::succeeding()?;
    let err = harness
        .orchestrator
        .convert(archive_request(b"definitely not a zip".to_vec(), "xmi"))
        .await
        .err()
        .ok_or_else(|| anyhow!("expected invalid archive"))?;
    assert!(matches!(err, ConversionError::InvalidArchive { .. }));
    assert_eq!(harness.leftover_workspaces()?, 0);
    Ok(())
}

#[tokio::test]
async fn tool_failure_surfaces_stderr_and_cleans_up() -> Result<()> {
    let harness = Harness::new(
        RecordingRunner::new(RunnerScript::Fail {
            exit_code: 1,
            stderr: "Unresolved type Foo\n".to_string(),
        }),
        StaticFetcher::with_java_class(),
        FixedTool::available(),
    )?;
    let err = harness
        .orchestrator
        .convert(archive_request(java_project_zip()?, "xmi"))
        .await
        .err()
        .ok_or_else(|| anyhow!("expected tool failure"))?;
    assert_eq!(
        err.to_string(),
        "Command failed (1): java: Unresolved type Foo"
    );
    assert_eq!(harness.leftover_workspaces()?, 0);
    assert_eq!(
        harness
            .telemetry
            .conversion_count("source", "xmi", "external_tool_failed"),
        1
    );
    Ok(())
}

#[tokio::test]
async fn timeout_is_reported_and_workspace_removed() -> Result<()> {
    let harness = Harness::new(
        RecordingRunner::new(RunnerScript::TimeOut),
        StaticFetcher::with_java_class(),
        FixedTool::available(),
    )?;
    let err = harness
        .orchestrator
        .convert(ir_request("{}", "xmi"))
        .await
        .err()
        .ok_or_else(|| anyhow!("expected timeout"))?;
    match err {
        ConversionError::TimedOut { timeout, .. } => assert_eq!(timeout, IR_TIMEOUT),
        other => bail!("unexpected error: {other:?}"),
    }
    assert_eq!(harness.leftover_workspaces()?, 0);
    Ok(())
}

#[tokio::test]
async fn missing_artifact_after_success_is_internal() -> Result<()> {
    let harness = Harness::new(
        RecordingRunner::new(RunnerScript::SucceedWithoutOutput),
        StaticFetcher::with_java_class(),
        FixedTool::available(),
    )?;
    let err = harness
        .orchestrator
        .convert(archive_request(java_project_zip()?, "xmi"))
        .await
        .err()
        .ok_or_else(|| anyhow!("expected missing artifact"))?;
    match &err {
        ConversionError::Io { operation, path, .. } => {
            assert_eq!(*operation, "artifact.read");
            assert!(path.ends_with("out/model.xmi"));
        }
        other => bail!("unexpected error: {other:?}"),
    }
    assert!(!err.is_client_error());
    assert_eq!(harness.leftover_workspaces()?, 0);
    Ok(())
}
