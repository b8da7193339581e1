//! Test file discovery
//!
//! Expands the CLI's path arguments into the list of test files to run.

use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Extension of test definition files picked up from directories
const TEST_EXTENSION: &str = "yaml";

/// Expand files and directories into test files, preserving argument order
///
/// Directories are scanned non-recursively for `*.yaml` files, sorted by name.
pub fn collect_test_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        let metadata = std::fs::metadata(path).map_err(|e| Error::file_read(path, e))?;
        if metadata.is_dir() {
            files.extend(scan_dir(path)?);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn scan_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_test = path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == TEST_EXTENSION);
        if is_test {
            files.push(path);
        }
    }
    files.sort();
    tracing::debug!(dir = %dir.display(), count = files.len(), "scanned test directory");
    Ok(files)
}
