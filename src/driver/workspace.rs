//! Per-invocation working directory
//!
//! Every interpreter run gets its own temporary directory holding the
//! generated source file and the test's auxiliary files. Dropping the
//! [`Workspace`] removes all of it, on success, failure, or unwinding.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tempfile::{TempDir, TempPath};

use super::DriverError;

const WORKSPACE_PREFIX: &str = "plane-test-";
const RANDOM_NAME_BYTES: usize = 16;

#[derive(Debug)]
pub struct Workspace {
    // Field order matters: the source file is removed before its directory.
    source: TempPath,
    root: TempDir,
}

impl Workspace {
    /// Create the directory, write the generated source file, and materialize `files`.
    pub fn create(
        source_text: &str,
        files: &BTreeMap<String, String>,
        source_extension: &str,
    ) -> Result<Self, DriverError> {
        let root = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()
            .map_err(DriverError::Workspace)?;

        let suffix = format!(".{}", source_extension);
        let source = tempfile::Builder::new()
            .prefix("")
            .suffix(&suffix)
            .rand_bytes(RANDOM_NAME_BYTES)
            .tempfile_in(root.path())
            .map_err(DriverError::Workspace)?
            .into_temp_path();
        fs::write(&source, source_text).map_err(DriverError::Workspace)?;

        for (name, content) in files {
            let path = resolve_file_path(root.path(), name)?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(DriverError::Workspace)?;
            }
            fs::write(&path, content).map_err(DriverError::Workspace)?;
            tracing::trace!(file = %path.display(), bytes = content.len(), "materialized auxiliary file");
        }

        Ok(Self { source, root })
    }

    /// The directory the interpreter runs in.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }

    /// Name of the generated source file, relative to [`root`](Self::root).
    pub fn source_file_name(&self) -> &Path {
        self.source.file_name().map(Path::new).unwrap_or_else(|| self.source_path())
    }
}

/// Map an auxiliary file name onto the workspace, refusing anything that escapes it.
pub fn resolve_file_path(root: &Path, name: &str) -> Result<PathBuf, DriverError> {
    let relative = Path::new(name);
    let is_contained = !name.is_empty() && relative.components().all(|c| matches!(c, Component::Normal(_)));
    if !is_contained {
        return Err(DriverError::UnsafeFileName { name: name.to_string() });
    }
    Ok(root.join(relative))
}
