//! Filesystem fixtures: scratch directories and in-memory zip archives.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::FileOptions;

/// Create a scratch directory removed when the guard drops.
///
/// # Errors
///
/// Returns an error when the system temporary directory is not writable.
pub fn scratch_dir() -> anyhow::Result<TempDir> {
    Ok(tempfile::Builder::new().prefix("xmi-test-").tempdir()?)
}

enum FixtureEntry {
    Dir(String),
    File {
        name: String,
        contents: Vec<u8>,
        mode: Option<u32>,
    },
}

/// Builder for zip archives used as upload payloads.
#[derive(Default)]
pub struct ZipFixture {
    entries: Vec<FixtureEntry>,
}

impl ZipFixture {
    /// Start an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory entry.
    #[must_use]
    pub fn dir(mut self, name: &str) -> Self {
        self.entries.push(FixtureEntry::Dir(name.to_string()));
        self
    }

    /// Add a file entry with default permissions. The name is stored verbatim.
    #[must_use]
    pub fn file(mut self, name: &str, contents: &[u8]) -> Self {
        self.entries.push(FixtureEntry::File {
            name: name.to_string(),
            contents: contents.to_vec(),
            mode: None,
        });
        self
    }

    /// Add a file entry carrying explicit unix permissions.
    #[must_use]
    pub fn file_with_mode(mut self, name: &str, contents: &[u8], mode: u32) -> Self {
        self.entries.push(FixtureEntry::File {
            name: name.to_string(),
            contents: contents.to_vec(),
            mode: Some(mode),
        });
        self
    }

    /// Encode the archive in memory.
    ///
    /// # Errors
    ///
    /// Returns an error when the zip writer rejects an entry.
    pub fn into_bytes(self) -> anyhow::Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for entry in self.entries {
            match entry {
                FixtureEntry::Dir(name) => {
                    zip.add_directory(name, FileOptions::default())?;
                }
                FixtureEntry::File {
                    name,
                    contents,
                    mode,
                } => {
                    let mut options = FileOptions::default();
                    if let Some(mode) = mode {
                        options = options.unix_permissions(mode);
                    }
                    zip.start_file(name, options)?;
                    zip.write_all(&contents)?;
                }
            }
        }
        Ok(zip.finish()?.into_inner())
    }

    /// Encode the archive and write it to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error when encoding or writing fails.
    pub fn write_to(self, path: &Path) -> anyhow::Result<()> {
        fs::write(path, self.into_bytes()?)?;
        Ok(())
    }
}

/// A small Java project archive with one class.
///
/// # Errors
///
/// Returns an error when the archive cannot be encoded.
pub fn java_project_zip() -> anyhow::Result<Vec<u8>> {
    ZipFixture::new()
        .dir("src/")
        .file(
            "src/com/acme/Order.java",
            b"package com.acme;\npublic class Order {}\n",
        )
        .into_bytes()
}
