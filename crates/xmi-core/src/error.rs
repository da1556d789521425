//! # Design
//!
//! - One taxonomy for every way a conversion can fail, shared by all crates.
//! - Messages are single-line and embed captured diagnostics; the HTTP layer
//!   surfaces them verbatim.
//! - Raw diagnostics stay on the variant so logs keep the full text.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result alias for conversion operations.
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Upper bound on diagnostic text embedded in a message, in bytes.
const MAX_DIAGNOSTIC_BYTES: usize = 4 * 1024;

const TOOL_REMEDIATION: &str = "Build the project (e.g. mvn -q -DskipTests package) in your \
    java-to-xmi repo, then restart the service.";

/// Errors produced while turning a request into an artifact.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Caller input was missing, malformed or contradictory.
    #[error("{reason}")]
    BadRequest {
        /// Caller-facing explanation.
        reason: String,
    },
    /// An archive entry would resolve outside the extraction directory.
    #[error("Unsafe zip entry path: {entry}")]
    PathTraversal {
        /// Raw entry name as stored in the archive.
        entry: String,
    },
    /// The uploaded archive could not be decoded.
    #[error("Uploaded archive could not be read: {detail}")]
    InvalidArchive {
        /// Decoder diagnostic.
        detail: String,
    },
    /// Cloning the remote repository failed or timed out.
    #[error("Failed to fetch {url}: {}", single_line(.detail))]
    FetchFailed {
        /// Repository URL as supplied by the caller.
        url: String,
        /// Captured clone diagnostics.
        detail: String,
    },
    /// The external tool exited unsuccessfully.
    #[error("Command failed ({}): {program}: {}", exit_label(.exit_code), single_line(.stderr))]
    ExternalToolFailed {
        /// Program that was executed.
        program: String,
        /// Exit code, absent when the process was terminated by a signal.
        exit_code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
    /// The process could not be spawned.
    #[error("Failed to launch {program}: {source}")]
    LaunchFailed {
        /// Program that failed to start.
        program: String,
        /// Underlying spawn error.
        source: io::Error,
    },
    /// The process exceeded its time limit and was killed.
    #[error("Command timed out after {}s: {program}", .timeout.as_secs())]
    TimedOut {
        /// Program that was killed.
        program: String,
        /// Configured limit.
        timeout: Duration,
    },
    /// No extraction tool artifact could be found.
    #[error("Unable to locate java-to-xmi CLI jar. Probed: {}. {}", probed_list(.probed), TOOL_REMEDIATION)]
    ToolNotFound {
        /// Every location inspected, in probing order.
        probed: Vec<PathBuf>,
    },
    /// Filesystem failure inside the request workspace.
    #[error("{operation} failed for {}: {source}", .path.display())]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl ConversionError {
    /// Build a [`ConversionError::BadRequest`] from any displayable reason.
    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::BadRequest {
            reason: reason.into(),
        }
    }

    /// Build a [`ConversionError::Io`] with operation context.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Whether the failure was caused by the caller's input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::BadRequest { .. } | Self::PathTraversal { .. } | Self::InvalidArchive { .. }
        )
    }

    /// Stable label for metrics and structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::PathTraversal { .. } => "path_traversal",
            Self::InvalidArchive { .. } => "invalid_archive",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::ExternalToolFailed { .. } => "external_tool_failed",
            Self::LaunchFailed { .. } => "launch_failed",
            Self::TimedOut { .. } => "timed_out",
            Self::ToolNotFound { .. } => "tool_not_found",
            Self::Io { .. } => "io",
        }
    }
}

/// Collapse multi-line diagnostics into one line, keeping the most recent output.
///
/// Blank lines are dropped and the rest joined with `" | "`. Text longer than
/// 4 KiB keeps its tail, since the final lines of a tool's stderr usually hold
/// the failure.
#[must_use]
pub fn single_line(text: &str) -> String {
    let joined = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ");
    if joined.len() <= MAX_DIAGNOSTIC_BYTES {
        return joined;
    }
    let mut start = joined.len() - MAX_DIAGNOSTIC_BYTES;
    while !joined.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &joined[start..])
}

#[allow(clippy::ref_option)]
fn exit_label(exit_code: &Option<i32>) -> String {
    exit_code.map_or_else(|| "signal".to_string(), |code| code.to_string())
}

fn probed_list(probed: &[PathBuf]) -> String {
    probed
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn single_line_joins_and_drops_blank_lines() {
        let text = "Exception in thread main\n\n   at Foo.bar(Foo.java:1)\n";
        assert_eq!(
            single_line(text),
            "Exception in thread main | at Foo.bar(Foo.java:1)"
        );
        assert_eq!(single_line(""), "");
    }

    #[test]
    fn single_line_keeps_tail_of_oversized_output() {
        let mut text = "é".repeat(MAX_DIAGNOSTIC_BYTES);
        text.push_str("\nroot cause");
        let collapsed = single_line(&text);
        assert!(collapsed.starts_with("..."));
        assert!(collapsed.ends_with("root cause"));
        assert!(collapsed.len() <= MAX_DIAGNOSTIC_BYTES + 3);
    }

    #[test]
    fn tool_failure_message_is_single_line_with_stderr() {
        let err = ConversionError::ExternalToolFailed {
            program: "java".to_string(),
            exit_code: Some(2),
            stderr: "bad ir\nline 3".to_string(),
        };
        assert_eq!(err.to_string(), "Command failed (2): java: bad ir | line 3");
        assert!(!err.is_client_error());
        assert_eq!(err.kind(), "external_tool_failed");

        let killed = ConversionError::ExternalToolFailed {
            program: "java".to_string(),
            exit_code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().starts_with("Command failed (signal)"));
    }

    #[test]
    fn tool_not_found_lists_locations_and_remediation() {
        let err = ConversionError::ToolNotFound {
            probed: vec![PathBuf::from("/a.jar"), PathBuf::from("/dir")],
        };
        let message = err.to_string();
        assert!(message.contains("/a.jar, /dir"));
        assert!(message.contains("mvn -q -DskipTests package"));
        assert!(!message.contains('\n'));
    }

    #[test]
    fn client_errors_are_classified() -> Result<(), Box<dyn Error>> {
        assert!(ConversionError::bad_request("nope").is_client_error());
        assert!(
            ConversionError::PathTraversal {
                entry: "../evil".to_string()
            }
            .is_client_error()
        );
        let io_err = ConversionError::io("write", "/tmp/x", io::Error::other("disk"));
        assert!(!io_err.is_client_error());
        assert!(io_err.source().is_some());
        assert_eq!(
            ConversionError::TimedOut {
                program: "git".to_string(),
                timeout: Duration::from_secs(300),
            }
            .to_string(),
            "Command timed out after 300s: git"
        );
        Ok(())
    }
}
