use std::sync::Arc;

use tracing::{info, warn};
use xmi_api::{ApiServer, ApiState, UploadLimits};
use xmi_config::ServiceConfig;
use xmi_core::ToolRunner;
use xmi_fsops::WorkspaceManager;
use xmi_process::{GitFetcher, JarLocator, ProcessRunner};
use xmi_telemetry::{
    DEFAULT_LOG_LEVEL, GlobalContextGuard, LogFormat, LoggingConfig, Metrics, init_logging,
};

use crate::error::{AppError, AppResult};
use crate::orchestrator::{ConversionOrchestrator, OrchestratorDeps};

const SERVICE_NAME: &str = "xmi-gateway";

/// Entry point for the gateway boot sequence.
///
/// # Errors
///
/// Returns an error if configuration is invalid, telemetry cannot be
/// installed, or the listener fails.
pub async fn run_app() -> AppResult<()> {
    let config =
        ServiceConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
    run_app_with(config).await
}

/// Boot sequence driven entirely by an already loaded configuration.
pub(crate) async fn run_app_with(config: ServiceConfig) -> AppResult<()> {
    let logging = LoggingConfig {
        level: DEFAULT_LOG_LEVEL,
        format: log_format(&config),
        build_sha: &config.build_sha,
    };
    init_logging(&logging).map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new(SERVICE_NAME);

    info!(
        tool_root = %config.tool.tool_root.display(),
        workspace_root = %config.workspace_root.display(),
        max_upload_bytes = config.max_upload_bytes,
        "XMI gateway bootstrap starting"
    );

    let telemetry = Metrics::new().map_err(|err| AppError::telemetry("telemetry.metrics", err))?;
    let orchestrator = build_orchestrator(&config, &telemetry);
    let state = ApiState::new(
        Arc::new(orchestrator),
        telemetry,
        UploadLimits::new(config.max_upload_bytes),
    );
    let api = ApiServer::new(state);

    info!(addr = %config.bind_addr, "Launching API listener");
    api.serve(config.bind_addr, shutdown_signal())
        .await
        .map_err(|err| AppError::api_server("api_server.serve", err))?;
    info!("API server shutdown complete");
    Ok(())
}

/// Wire the production process adapters into an orchestrator.
pub(crate) fn build_orchestrator(
    config: &ServiceConfig,
    telemetry: &Metrics,
) -> ConversionOrchestrator {
    let runner: Arc<dyn ToolRunner> = Arc::new(ProcessRunner);
    let fetcher = GitFetcher::new(
        Arc::clone(&runner),
        &config.git_bin,
        config.timeouts.clone,
    );
    let resolver = JarLocator::new(
        &config.tool.java_bin,
        config.tool.explicit_jar.clone(),
        &config.tool.tool_root,
    );
    ConversionOrchestrator::new(OrchestratorDeps {
        runner,
        fetcher: Arc::new(fetcher),
        resolver: Arc::new(resolver),
        workspaces: WorkspaceManager::new(&config.workspace_root, telemetry.clone()),
        timeouts: config.timeouts,
        telemetry: telemetry.clone(),
    })
}

fn log_format(config: &ServiceConfig) -> LogFormat {
    config
        .log_format
        .as_deref()
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(LogFormat::infer)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    info!("shutdown signal received");
}
