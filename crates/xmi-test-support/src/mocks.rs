//! In-memory stand-ins for the process adapters.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};
use std::time::Duration;

use async_trait::async_trait;
use xmi_core::{
    CommandInvocation, ConversionError, ConversionResult, ExecutionResult, SourceFetcher,
    ToolCommand, ToolResolver, ToolRunner,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Value following `flag` in the invocation arguments.
#[must_use]
pub fn flag_value(invocation: &CommandInvocation, flag: &str) -> Option<PathBuf> {
    let flag = OsString::from(flag);
    invocation
        .args
        .iter()
        .position(|arg| *arg == flag)
        .and_then(|index| invocation.args.get(index + 1))
        .map(PathBuf::from)
}

/// Scripted behaviour for [`RecordingRunner`].
#[derive(Debug, Clone)]
pub enum RunnerScript {
    /// Exit zero after writing `xmi` to `--output` and `ir` to `--write-ir` when present.
    Succeed {
        /// Bytes written to the XMI output path.
        xmi: Vec<u8>,
        /// Bytes written to the IR output path.
        ir: Vec<u8>,
    },
    /// Exit zero without writing any artifact.
    SucceedWithoutOutput,
    /// Exit with a non-zero code and the given stderr.
    Fail {
        /// Exit code reported.
        exit_code: i32,
        /// Captured stderr reported.
        stderr: String,
    },
    /// Report a timeout.
    TimeOut,
}

/// Tool runner that records every invocation and follows a script.
#[derive(Debug)]
pub struct RecordingRunner {
    script: RunnerScript,
    calls: Mutex<Vec<(CommandInvocation, Duration)>>,
}

impl RecordingRunner {
    /// Runner following `script` for every call.
    #[must_use]
    pub const fn new(script: RunnerScript) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Runner that writes fixed XMI and IR artifacts.
    #[must_use]
    pub fn succeeding() -> Self {
        Self::new(RunnerScript::Succeed {
            xmi: b"<xmi:XMI/>".to_vec(),
            ir: br#"{"classes":[]}"#.to_vec(),
        })
    }

    /// Invocations seen so far, with their timeouts.
    #[must_use]
    pub fn calls(&self) -> Vec<(CommandInvocation, Duration)> {
        lock(&self.calls).clone()
    }

    /// Invocations seen so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.calls().into_iter().map(|(inv, _)| inv).collect()
    }
}

fn write_artifact(path: &Path, bytes: &[u8]) -> ConversionResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| ConversionError::io("mock.create_output_dir", parent, err))?;
    }
    fs::write(path, bytes).map_err(|err| ConversionError::io("mock.write_output", path, err))
}

#[async_trait]
impl ToolRunner for RecordingRunner {
    async fn run(
        &self,
        invocation: &CommandInvocation,
        timeout: Duration,
    ) -> ConversionResult<ExecutionResult> {
        lock(&self.calls).push((invocation.clone(), timeout));
        match &self.script {
            RunnerScript::Succeed { xmi, ir } => {
                if let Some(output) = flag_value(invocation, "--output") {
                    write_artifact(&output, xmi)?;
                }
                if let Some(output) = flag_value(invocation, "--write-ir") {
                    write_artifact(&output, ir)?;
                }
            }
            RunnerScript::SucceedWithoutOutput => {}
            RunnerScript::Fail { exit_code, stderr } => {
                return Err(ConversionError::ExternalToolFailed {
                    program: invocation.program_name(),
                    exit_code: Some(*exit_code),
                    stderr: stderr.clone(),
                });
            }
            RunnerScript::TimeOut => {
                return Err(ConversionError::TimedOut {
                    program: invocation.program_name(),
                    timeout,
                });
            }
        }
        Ok(ExecutionResult {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
            elapsed: Duration::from_millis(5),
        })
    }
}

/// Fetcher that materialises a fixed file tree or fails.
#[derive(Debug)]
pub struct StaticFetcher {
    files: Vec<(String, Vec<u8>)>,
    failure: Option<String>,
    urls: Mutex<Vec<String>>,
}

impl StaticFetcher {
    /// Fetcher writing one Java file into the destination.
    #[must_use]
    pub fn with_java_class() -> Self {
        Self {
            files: vec![(
                "src/Main.java".to_string(),
                b"public class Main {}".to_vec(),
            )],
            failure: None,
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Fetcher failing every clone with `detail`.
    #[must_use]
    pub fn failing(detail: &str) -> Self {
        Self {
            files: Vec::new(),
            failure: Some(detail.to_string()),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// URLs requested so far.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        lock(&self.urls).clone()
    }
}

#[async_trait]
impl SourceFetcher for StaticFetcher {
    async fn fetch(&self, repository_url: &str, destination: &Path) -> ConversionResult<()> {
        lock(&self.urls).push(repository_url.to_string());
        if let Some(detail) = &self.failure {
            return Err(ConversionError::FetchFailed {
                url: repository_url.to_string(),
                detail: detail.clone(),
            });
        }
        for (name, contents) in &self.files {
            write_artifact(&destination.join(name), contents)?;
        }
        Ok(())
    }
}

/// Resolver returning a fixed tool or a fixed not-found error.
#[derive(Debug, Clone)]
pub struct FixedTool {
    tool: Option<ToolCommand>,
    threads: Arc<Mutex<Vec<ThreadId>>>,
}

impl FixedTool {
    /// Resolver returning `java -jar /opt/java-to-xmi.jar`.
    #[must_use]
    pub fn available() -> Self {
        Self {
            tool: Some(ToolCommand {
                launcher: PathBuf::from("java"),
                jar: PathBuf::from("/opt/java-to-xmi.jar"),
            }),
            threads: Arc::default(),
        }
    }

    /// Resolver that never finds a tool.
    #[must_use]
    pub fn missing() -> Self {
        Self {
            tool: None,
            threads: Arc::default(),
        }
    }

    /// Threads `resolve` ran on, shared between clones.
    #[must_use]
    pub fn resolve_threads(&self) -> Vec<ThreadId> {
        lock(&self.threads).clone()
    }
}

impl ToolResolver for FixedTool {
    fn resolve(&self) -> ConversionResult<ToolCommand> {
        lock(&self.threads).push(thread::current().id());
        self.tool.clone().ok_or_else(|| ConversionError::ToolNotFound {
            probed: vec![PathBuf::from("/opt/java-to-xmi.jar")],
        })
    }
}
