//! Configuration paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/imperius/`
//! - macOS: `~/Library/Application Support/imperius/`
//! - Windows: `%APPDATA%\imperius\`

use std::path::{Path, PathBuf};

/// Application name used for the configuration directory
const APP_NAME: &str = "imperius";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Resolve a path named inside a test file
///
/// Relative paths are taken relative to the directory holding the file that
/// names them; absolute paths are returned unchanged.
pub fn resolve_relative(base_file: &Path, target: &str) -> PathBuf {
    let target = Path::new(target);
    if target.is_absolute() {
        return target.to_path_buf();
    }
    match base_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(target),
        _ => target.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_is_toml() {
        if let Some(path) = config_path() {
            assert_eq!(path.file_name().unwrap(), "config.toml");
        }
    }

    #[test]
    fn test_resolve_relative_to_test_file() {
        let resolved = resolve_relative(Path::new("suites/auth/login.yaml"), "partials/token.yaml");
        assert_eq!(resolved, PathBuf::from("suites/auth/partials/token.yaml"));
    }

    #[test]
    fn test_resolve_bare_file_name() {
        let resolved = resolve_relative(Path::new("login.yaml"), "token.yaml");
        assert_eq!(resolved, PathBuf::from("token.yaml"));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_absolute_is_unchanged() {
        let resolved = resolve_relative(Path::new("suites/login.yaml"), "/etc/imperius/vars.yaml");
        assert_eq!(resolved, PathBuf::from("/etc/imperius/vars.yaml"));
    }
}
