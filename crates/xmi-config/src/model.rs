//! Typed service settings.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Where and how the extraction tool is found and launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    /// Explicit jar path; probed first when set.
    pub explicit_jar: Option<PathBuf>,
    /// Checkout root holding the fixed jar locations and build directories.
    pub tool_root: PathBuf,
    /// Launcher program.
    pub java_bin: PathBuf,
}

/// Time limits for external processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Repository clone.
    pub clone: Duration,
    /// Tool run with IR input.
    pub ir: Duration,
    /// Tool run with source input.
    pub source: Duration,
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// HTTP listener address.
    pub bind_addr: SocketAddr,
    /// Extraction tool settings.
    pub tool: ToolSettings,
    /// Git program used for repository clones.
    pub git_bin: PathBuf,
    /// Parent directory of request workspaces.
    pub workspace_root: PathBuf,
    /// Per-field upload cap in bytes.
    pub max_upload_bytes: usize,
    /// Process time limits.
    pub timeouts: Timeouts,
    /// Log format override, lowercase `json` or `pretty`.
    pub log_format: Option<String>,
    /// Build identifier recorded in logs.
    pub build_sha: String,
}
