//! Locating the java-to-xmi CLI jar.
//!
//! Probing order: the explicit override, the single-module build output, the
//! multi-module CLI build output, then a scan of the known target directories
//! for the most recently modified matching jar. The first hit wins; nothing is
//! cached, so a rebuilt jar is picked up by the next request.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;
use xmi_core::{ConversionError, ConversionResult, ToolCommand, ToolResolver};

const TOOL_IDENTIFIER: &str = "java-to-xmi";
const JAR_EXTENSION: &str = "jar";
const SINGLE_MODULE_JAR: &str = "target/java-to-xmi.jar";
const CLI_MODULE_JAR: &str = "java-to-xmi-cli/target/java-to-xmi-cli-0.1.0-SNAPSHOT.jar";
const SCAN_DIRS: [&str; 2] = ["java-to-xmi-cli/target", "target"];

/// Resolves the tool jar on every call.
#[derive(Debug, Clone)]
pub struct JarLocator {
    launcher: PathBuf,
    explicit: Option<PathBuf>,
    root: PathBuf,
}

impl JarLocator {
    /// Locator launching jars with `launcher`, probing `explicit` first and then `root`.
    pub fn new(
        launcher: impl Into<PathBuf>,
        explicit: Option<PathBuf>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            launcher: launcher.into(),
            explicit,
            root: root.into(),
        }
    }

    fn candidates(&self) -> Vec<PathBuf> {
        self.explicit
            .iter()
            .cloned()
            .chain([
                self.root.join(SINGLE_MODULE_JAR),
                self.root.join(CLI_MODULE_JAR),
            ])
            .collect()
    }

    fn find(&self, probed: &mut Vec<PathBuf>) -> Option<PathBuf> {
        for candidate in self.candidates() {
            let hit = candidate.is_file();
            probed.push(candidate.clone());
            if hit {
                return Some(candidate);
            }
        }
        for dir in SCAN_DIRS.map(|dir| self.root.join(dir)) {
            let newest = newest_matching_jar(&dir);
            probed.push(dir);
            if newest.is_some() {
                return newest;
            }
        }
        None
    }
}

/// Newest regular `.jar` file in `dir` whose name contains the tool identifier.
fn newest_matching_jar(dir: &Path) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut jars: Vec<(SystemTime, PathBuf)> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let path = entry.path();
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(JAR_EXTENSION)
            {
                return None;
            }
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            Some((modified, path))
        })
        .collect();
    jars.sort_by(|a, b| b.0.cmp(&a.0));
    jars.into_iter()
        .map(|(_, path)| path)
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.contains(TOOL_IDENTIFIER))
        })
}

impl ToolResolver for JarLocator {
    fn resolve(&self) -> ConversionResult<ToolCommand> {
        let mut probed = Vec::new();
        let jar = self
            .find(&mut probed)
            .ok_or(ConversionError::ToolNotFound { probed })?;
        debug!(jar = %jar.display(), "resolved extraction tool");
        Ok(ToolCommand {
            launcher: self.launcher.clone(),
            jar,
        })
    }
}
