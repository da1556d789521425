//! Environment variable names and their defaults.

/// Listener IP address.
pub const ENV_BIND_ADDR: &str = "XMI_BIND_ADDR";
/// Listener port.
pub const ENV_HTTP_PORT: &str = "XMI_HTTP_PORT";
/// Explicit path of the extraction tool jar.
pub const ENV_TOOL_JAR: &str = "JAVA_TO_XMI_JAR";
/// Root of the extraction tool checkout.
pub const ENV_TOOL_ROOT: &str = "XMI_TOOL_ROOT";
/// Java launcher program.
pub const ENV_JAVA_BIN: &str = "XMI_JAVA_BIN";
/// Git program used for clones.
pub const ENV_GIT_BIN: &str = "XMI_GIT_BIN";
/// Parent directory of request workspaces.
pub const ENV_WORKSPACE_ROOT: &str = "XMI_WORKSPACE_ROOT";
/// Per-field upload cap in bytes.
pub const ENV_MAX_UPLOAD_BYTES: &str = "XMI_MAX_UPLOAD_BYTES";
/// Clone time limit in seconds.
pub const ENV_CLONE_TIMEOUT_SECS: &str = "XMI_CLONE_TIMEOUT_SECS";
/// IR-input tool time limit in seconds.
pub const ENV_IR_TIMEOUT_SECS: &str = "XMI_IR_TIMEOUT_SECS";
/// Source-input tool time limit in seconds.
pub const ENV_SOURCE_TIMEOUT_SECS: &str = "XMI_SOURCE_TIMEOUT_SECS";
/// Log output format override.
pub const ENV_LOG_FORMAT: &str = "XMI_LOG_FORMAT";
/// Build identifier recorded in logs.
pub const ENV_BUILD_SHA: &str = "XMI_BUILD_SHA";

pub(crate) const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub(crate) const DEFAULT_HTTP_PORT: u16 = 7072;
pub(crate) const DEFAULT_TOOL_ROOT: &str = "/deps/java-to-xmi";
pub(crate) const DEFAULT_JAVA_BIN: &str = "java";
pub(crate) const DEFAULT_GIT_BIN: &str = "git";
pub(crate) const DEFAULT_MAX_UPLOAD_BYTES: usize = 300 * 1024 * 1024;
pub(crate) const DEFAULT_CLONE_TIMEOUT_SECS: u64 = 5 * 60;
pub(crate) const DEFAULT_IR_TIMEOUT_SECS: u64 = 5 * 60;
pub(crate) const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 8 * 60;
pub(crate) const DEFAULT_BUILD_SHA: &str = "dev";
