//! OS-specific directories for configuration and logs.

use std::io;
use std::path::{Path, PathBuf};

/// Errors that can occur while resolving or creating application directories.
#[derive(Debug, thiserror::Error)]
pub enum PathsError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine OS configuration directory")]
    NoConfigDir,
    /// A directory could not be created.
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

const APP_DIR_NAME: &str = "codotaku";

/// Where the shell keeps its files, following OS conventions (XDG on Linux,
/// Known Folders on Windows, Library on macOS).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    /// Holds the JSON log written by debug builds.
    pub log_dir: PathBuf,
}

impl AppDirs {
    /// Resolve directories without creating them on disk.
    pub fn resolve() -> Result<Self, PathsError> {
        let config_base = dirs::config_dir().ok_or(PathsError::NoConfigDir)?;
        let app_dir = config_base.join(APP_DIR_NAME);
        let log_dir = dirs::cache_dir()
            .map(|cache| cache.join(APP_DIR_NAME).join("logs"))
            .unwrap_or_else(|| app_dir.join("logs"));

        Ok(Self {
            config_dir: app_dir,
            log_dir,
        })
    }

    /// Resolve directories under `config_override` when given, else under the
    /// OS defaults, and create them.
    pub fn resolve_and_create(config_override: Option<&Path>) -> Result<Self, PathsError> {
        let dirs = match config_override {
            Some(root) => Self::with_root(root),
            None => Self::resolve()?,
        };
        dirs.create_dirs()?;
        Ok(dirs)
    }

    /// Directories rooted at `root`, with logs in `root/logs`.
    pub fn with_root(root: &Path) -> Self {
        Self {
            config_dir: root.to_path_buf(),
            log_dir: root.join("logs"),
        }
    }

    /// Create all directories on disk.
    pub fn create_dirs(&self) -> Result<(), PathsError> {
        for dir in [&self.config_dir, &self.log_dir] {
            std::fs::create_dir_all(dir).map_err(|source| PathsError::Create {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_gives_absolute_paths() {
        let Ok(dirs) = AppDirs::resolve() else {
            // Minimal containers may have no HOME.
            return;
        };
        assert!(dirs.config_dir.is_absolute(), "config_dir is not absolute");
        assert!(dirs.log_dir.is_absolute(), "log_dir is not absolute");
        assert!(dirs.config_dir.ends_with(APP_DIR_NAME));
    }

    #[test]
    fn test_with_root_layout() {
        let root = Path::new("some").join("root");
        let dirs = AppDirs::with_root(&root);
        assert_eq!(dirs.config_dir, root);
        assert_eq!(dirs.log_dir, root.join("logs"));
    }

    #[test]
    fn test_directory_creation() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("codotaku-test");

        let dirs = AppDirs::resolve_and_create(Some(&root)).expect("create_dirs failed");
        assert!(dirs.config_dir.is_dir(), "config_dir was not created");
        assert!(dirs.log_dir.is_dir(), "log_dir was not created");
    }
}
