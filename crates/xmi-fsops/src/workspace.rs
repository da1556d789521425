//! Per-request scratch directories with guaranteed removal.
//!
//! A [`Workspace`] owns its directory tree. Dropping the guard removes the tree,
//! so cleanup happens on success, on `?` early returns and when the request
//! future is cancelled. Removal failures are logged and counted, never returned.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};
use xmi_core::ArtifactLayout;
use xmi_telemetry::Metrics;

use crate::error::{FsOpsError, FsOpsResult};

const RANDOM_SUFFIX_BYTES: usize = 16;
const ARCHIVE_FILE: &str = "input.zip";
const IR_INPUT_FILE: &str = "model.ir.json";
const SOURCE_DIR: &str = "source";
const OUTPUT_DIR: &str = "out";
const XMI_OUTPUT_FILE: &str = "model.xmi";
const IR_OUTPUT_FILE: &str = "model.ir.json";

/// Allocates workspaces under a shared temporary root.
#[derive(Clone)]
pub struct WorkspaceManager {
    root: PathBuf,
    metrics: Metrics,
}

impl WorkspaceManager {
    /// Create a manager that allocates below `root`.
    pub fn new(root: impl Into<PathBuf>, metrics: Metrics) -> Self {
        Self {
            root: root.into(),
            metrics,
        }
    }

    /// Root directory new workspaces are created in.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a uniquely named directory `<root>/<prefix>-<random>`.
    ///
    /// # Errors
    ///
    /// Returns [`FsOpsError::Io`] when the root is missing and cannot be created
    /// or is not writable.
    pub fn acquire(&self, prefix: &str) -> FsOpsResult<Workspace> {
        fs::create_dir_all(&self.root)
            .map_err(|err| FsOpsError::io("workspace.create_root", &self.root, err))?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{prefix}-"))
            .rand_bytes(RANDOM_SUFFIX_BYTES)
            .tempdir_in(&self.root)
            .map_err(|err| FsOpsError::io("workspace.acquire", &self.root, err))?;
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "workspace acquired");
        Ok(Workspace {
            dir: Some(dir),
            path,
            metrics: self.metrics.clone(),
        })
    }
}

/// Exclusively owned directory tree for one request.
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
    metrics: Metrics,
}

impl Workspace {
    /// Root of the workspace.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Location the uploaded archive is written to.
    #[must_use]
    pub fn archive_path(&self) -> PathBuf {
        self.path.join(ARCHIVE_FILE)
    }

    /// Directory the tool writes its artifacts into.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.path.join(OUTPUT_DIR)
    }

    /// Paths handed to the extraction tool.
    #[must_use]
    pub fn layout(&self) -> ArtifactLayout {
        let output_dir = self.output_dir();
        ArtifactLayout {
            root: self.path.clone(),
            ir_input: self.path.join(IR_INPUT_FILE),
            source_dir: self.path.join(SOURCE_DIR),
            xmi_output: output_dir.join(XMI_OUTPUT_FILE),
            ir_output: output_dir.join(IR_OUTPUT_FILE),
        }
    }

    /// Remove the workspace now; returns whether removal succeeded.
    pub fn release(mut self) -> bool {
        self.remove()
    }

    fn remove(&mut self) -> bool {
        let Some(dir) = self.dir.take() else {
            return true;
        };
        match dir.close() {
            Ok(()) => {
                debug!(path = %self.path.display(), "workspace released");
                true
            }
            Err(err) => {
                self.metrics.inc_workspace_cleanup_failure();
                warn!(
                    error = %err,
                    path = %self.path.display(),
                    "failed to remove workspace"
                );
                false
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.remove();
    }
}
