//! Suite file discovery

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// List the suite files directly inside `dir`.
///
/// Only regular files whose name ends with `suffix` are returned. The result
/// is sorted lexically so runs are reproducible regardless of the order the
/// filesystem lists entries in.
pub fn discover_suite_files(dir: &Path, suffix: &str) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry_path = entry?.path();
        if !entry_path.is_file() {
            continue;
        }
        let name = entry_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.ends_with(suffix) {
            files.push(entry_path);
        }
    }

    files.sort();
    Ok(files)
}
