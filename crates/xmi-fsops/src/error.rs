//! # Design
//!
//! - Provide structured, constant-message errors for workspace and archive handling.
//! - Capture operation context (paths, entries) to make failures reproducible in tests.
//! - Map onto [`ConversionError`] at the crate boundary so callers see one taxonomy.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use xmi_core::ConversionError;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by workspace and archive operations.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Zip archive failures.
    #[error("fsops zip failure")]
    Zip {
        /// Operation that triggered the archive failure.
        operation: &'static str,
        /// Path involved in the archive failure.
        path: PathBuf,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },
    /// Archive entry resolving outside the extraction directory.
    #[error("fsops archive entry escapes destination")]
    PathTraversal {
        /// Raw entry name.
        entry: String,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn zip(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: zip::result::ZipError,
    ) -> Self {
        Self::Zip {
            operation,
            path: path.into(),
            source,
        }
    }
}

impl From<FsOpsError> for ConversionError {
    fn from(err: FsOpsError) -> Self {
        match err {
            FsOpsError::Io {
                operation,
                path,
                source,
            } => Self::Io {
                operation,
                path,
                source,
            },
            FsOpsError::Zip { source, .. } => Self::InvalidArchive {
                detail: source.to_string(),
            },
            FsOpsError::PathTraversal { entry } => Self::PathTraversal { entry },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn fsops_error_helpers_build_variants() {
        let io_err = FsOpsError::io("read", "path", io::Error::other("io"));
        assert!(matches!(io_err, FsOpsError::Io { .. }));
        assert!(io_err.source().is_some());

        let zip_err = FsOpsError::zip("unpack", "input.zip", zip::result::ZipError::FileNotFound);
        assert!(matches!(zip_err, FsOpsError::Zip { .. }));
        assert!(zip_err.source().is_some());
    }

    #[test]
    fn fsops_errors_map_onto_conversion_taxonomy() {
        let traversal: ConversionError = FsOpsError::PathTraversal {
            entry: "../../evil".to_string(),
        }
        .into();
        assert!(traversal.is_client_error());
        assert_eq!(traversal.to_string(), "Unsafe zip entry path: ../../evil");

        let invalid: ConversionError = FsOpsError::zip(
            "extract_zip.decode",
            "input.zip",
            zip::result::ZipError::InvalidArchive("bad"),
        )
        .into();
        assert_eq!(invalid.kind(), "invalid_archive");
        assert!(invalid.is_client_error());

        let io: ConversionError =
            FsOpsError::io("workspace.acquire", "/root", io::Error::other("full")).into();
        assert_eq!(io.kind(), "io");
        assert!(!io.is_client_error());
    }
}
