//! Zip extraction confined to a destination directory.

use std::fs::{self, File};
use std::io;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use crate::error::{FsOpsError, FsOpsResult};

#[cfg(unix)]
const PERMISSION_BITS: u32 = 0o777;
#[cfg(unix)]
const OWNER_READ_WRITE: u32 = 0o600;

/// Counts of entries materialised by [`extract_archive`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    /// Regular files written.
    pub files: usize,
    /// Directory entries created.
    pub directories: usize,
}

/// Extract every entry of `archive` below `destination`.
///
/// Entry names are resolved lexically against `destination`; the first entry
/// that would land outside it (or on it) aborts the whole extraction with
/// [`FsOpsError::PathTraversal`]. Entries already written stay on disk and are
/// removed together with the enclosing workspace.
///
/// # Errors
///
/// Returns [`FsOpsError::Zip`] for unreadable archives, [`FsOpsError::PathTraversal`]
/// for escaping entries and [`FsOpsError::Io`] for filesystem failures.
pub fn extract_archive(archive: &Path, destination: &Path) -> FsOpsResult<ExtractSummary> {
    let file = File::open(archive)
        .map_err(|source| FsOpsError::io("extract_archive.open", archive, source))?;
    let mut zip = ZipArchive::new(file)
        .map_err(|source| FsOpsError::zip("extract_archive.decode", archive, source))?;
    fs::create_dir_all(destination)
        .map_err(|source| FsOpsError::io("extract_archive.create_root", destination, source))?;

    let mut summary = ExtractSummary::default();
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|source| FsOpsError::zip("extract_archive.read_entry", archive, source))?;
        let relative = resolve_entry(entry.name())?;
        let target = destination.join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|source| FsOpsError::io("extract_archive.create_dir", &target, source))?;
            summary.directories += 1;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| {
                FsOpsError::io("extract_archive.create_parent", parent, source)
            })?;
        }
        let mut output = File::create(&target)
            .map_err(|source| FsOpsError::io("extract_archive.create_file", &target, source))?;
        io::copy(&mut entry, &mut output)
            .map_err(|source| FsOpsError::io("extract_archive.copy", &target, source))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            let perms = fs::Permissions::from_mode((mode & PERMISSION_BITS) | OWNER_READ_WRITE);
            fs::set_permissions(&target, perms).map_err(|source| {
                FsOpsError::io("extract_archive.set_permissions", &target, source)
            })?;
        }
        summary.files += 1;
    }

    debug!(
        archive = %archive.display(),
        destination = %destination.display(),
        files = summary.files,
        directories = summary.directories,
        "archive extracted"
    );
    Ok(summary)
}

/// Resolve an entry name to a path strictly inside the destination.
fn resolve_entry(name: &str) -> FsOpsResult<PathBuf> {
    let traversal = || FsOpsError::PathTraversal {
        entry: name.to_string(),
    };
    let mut segments: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(segment) => segments.push(segment),
            Component::CurDir => {}
            Component::ParentDir => {
                segments.pop().ok_or_else(traversal)?;
            }
            Component::RootDir | Component::Prefix(_) => return Err(traversal()),
        }
    }
    if segments.is_empty() {
        return Err(traversal());
    }
    Ok(segments.iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use xmi_test_support::fixtures::{ZipFixture, scratch_dir};

    type TestResult<T> = anyhow::Result<T>;

    #[test]
    fn resolve_entry_normalises_inner_segments() -> TestResult<()> {
        assert_eq!(
            resolve_entry("src/./main/../Main.java")?,
            PathBuf::from("src/Main.java")
        );
        assert_eq!(resolve_entry("a/b/")?, PathBuf::from("a/b"));
        Ok(())
    }

    #[test]
    fn resolve_entry_rejects_escaping_names() {
        for name in ["../evil", "../../evil", "a/../../evil", "/etc/passwd", ".", "a/.."] {
            let err = resolve_entry(name).err();
            assert!(
                matches!(err, Some(FsOpsError::PathTraversal { ref entry }) if entry == name),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn extracts_files_and_directories() -> TestResult<()> {
        let scratch = scratch_dir()?;
        let archive = scratch.path().join("input.zip");
        ZipFixture::new()
            .dir("src/")
            .file("src/com/acme/Order.java", b"class Order {}")
            .file("pom.xml", b"<project/>")
            .write_to(&archive)?;
        let destination = scratch.path().join("source");

        let summary = extract_archive(&archive, &destination)?;
        assert_eq!(
            summary,
            ExtractSummary {
                files: 2,
                directories: 1
            }
        );
        assert_eq!(
            fs::read(destination.join("src/com/acme/Order.java"))?,
            b"class Order {}"
        );
        assert_eq!(fs::read(destination.join("pom.xml"))?, b"<project/>");
        Ok(())
    }

    #[test]
    fn traversal_entry_fails_without_writing_outside() -> TestResult<()> {
        let scratch = scratch_dir()?;
        let archive = scratch.path().join("input.zip");
        ZipFixture::new()
            .file("ok.txt", b"fine")
            .file("../../evil", b"pwned")
            .write_to(&archive)?;
        let destination = scratch.path().join("nested/deeper/source");

        let err = extract_archive(&archive, &destination)
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected traversal failure"))?;
        assert!(matches!(err, FsOpsError::PathTraversal { ref entry } if entry == "../../evil"));
        assert!(!scratch.path().join("nested/evil").exists());
        assert!(!scratch.path().join("evil").exists());
        Ok(())
    }

    #[test]
    fn corrupt_archive_is_reported_as_zip_error() -> TestResult<()> {
        let scratch = scratch_dir()?;
        let archive = scratch.path().join("input.zip");
        fs::write(&archive, b"definitely not a zip")?;
        let err = extract_archive(&archive, &scratch.path().join("source"))
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected decode failure"))?;
        assert!(matches!(
            err,
            FsOpsError::Zip {
                operation: "extract_archive.decode",
                ..
            }
        ));
        Ok(())
    }

    #[test]
    fn empty_archive_yields_empty_destination() -> TestResult<()> {
        let scratch = scratch_dir()?;
        let archive = scratch.path().join("input.zip");
        ZipFixture::new().write_to(&archive)?;
        let destination = scratch.path().join("source");
        let summary = extract_archive(&archive, &destination)?;
        assert_eq!(summary, ExtractSummary::default());
        assert!(destination.is_dir());
        assert_eq!(fs::read_dir(&destination)?.count(), 0);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn unix_modes_are_masked_and_kept_owner_readable() -> TestResult<()> {
        let scratch = scratch_dir()?;
        let archive = scratch.path().join("input.zip");
        ZipFixture::new()
            .file_with_mode("bin/run.sh", b"#!/bin/sh\n", 0o755)
            .file_with_mode("locked.txt", b"x", 0o000)
            .write_to(&archive)?;
        let destination = scratch.path().join("source");
        extract_archive(&archive, &destination)?;

        let run = fs::metadata(destination.join("bin/run.sh"))?.permissions().mode();
        assert_eq!(run & 0o777, 0o755);
        let locked = fs::metadata(destination.join("locked.txt"))?.permissions().mode();
        assert_eq!(locked & 0o777, 0o600);
        Ok(())
    }
}
