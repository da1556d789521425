//! Child-process execution with captured output and a hard time limit.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use xmi_core::{CommandInvocation, ConversionError, ConversionResult, ExecutionResult, ToolRunner};

/// Runs invocations as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            // A read error only truncates diagnostics.
            let _ = pipe.read_to_end(&mut buffer).await;
        }
        buffer
    })
}

async fn collect(handle: &mut JoinHandle<Vec<u8>>) -> String {
    handle
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(
        &self,
        invocation: &CommandInvocation,
        timeout: Duration,
    ) -> ConversionResult<ExecutionResult> {
        let program = invocation.program_name();
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.current_dir {
            command.current_dir(dir);
        }

        let started = Instant::now();
        let mut child = command
            .spawn()
            .map_err(|source| ConversionError::LaunchFailed {
                program: program.clone(),
                source,
            })?;
        info!(command = %invocation, timeout_secs = timeout.as_secs(), "process started");

        let mut stdout = drain(child.stdout.take());
        let mut stderr = drain(child.stderr.take());

        // One deadline covers the exit and both pipes: a descendant that
        // inherited stdout or stderr keeps them open after the child exits.
        let finished = tokio::time::timeout(timeout, async {
            let status = child.wait().await;
            (status, collect(&mut stdout).await, collect(&mut stderr).await)
        })
        .await;

        let (status, stdout_text, stderr_text) = match finished {
            Ok((Ok(status), out, err)) => (status, out, err),
            Ok((Err(source), _, _)) => {
                stdout.abort();
                stderr.abort();
                return Err(ConversionError::LaunchFailed { program, source });
            }
            Err(_) => {
                if let Err(err) = child.kill().await {
                    debug!(error = %err, program = %program, "timed out process already exited");
                }
                stdout.abort();
                stderr.abort();
                warn!(program = %program, timeout_secs = timeout.as_secs(), "process timed out");
                return Err(ConversionError::TimedOut { program, timeout });
            }
        };

        let result = ExecutionResult {
            exit_code: status.code(),
            stdout: stdout_text,
            stderr: stderr_text,
            elapsed: started.elapsed(),
        };
        let elapsed_ms = u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX);
        debug!(program = %program, stderr = %result.stderr, "process stderr");

        if status.success() {
            info!(program = %program, elapsed_ms, "process finished");
            Ok(result)
        } else {
            warn!(program = %program, exit_code = ?result.exit_code, elapsed_ms, "process failed");
            Err(ConversionError::ExternalToolFailed {
                program,
                exit_code: result.exit_code,
                stderr: result.stderr,
            })
        }
    }
}
