use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ChartError;

/// Where the chart repository registry lives on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoPaths {
    pub home_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub local_dir: PathBuf,
    pub repo_file: PathBuf,
}

impl RepoPaths {
    pub fn from_home(home: impl Into<PathBuf>) -> Self {
        let home_dir = home.into();
        let repository = home_dir.join("repository");
        Self {
            cache_dir: repository.join("cache"),
            local_dir: repository.join("local"),
            repo_file: repository.join("repositories.yaml"),
            home_dir,
        }
    }

    pub fn repository_dir(&self) -> PathBuf {
        self.home_dir.join("repository")
    }

    pub fn cache_index_file(&self, repo: &str) -> PathBuf {
        self.cache_dir.join(format!("{repo}-index.yaml"))
    }
}

impl Default for RepoPaths {
    fn default() -> Self {
        Self::from_home("/.helm")
    }
}

/// Create the registry directories that are missing.
///
/// The repository file itself is left to the release subsystem.
pub fn ensure_home(paths: &RepoPaths) -> Result<(), ChartError> {
    let dirs = [
        paths.home_dir.clone(),
        paths.repository_dir(),
        paths.cache_dir.clone(),
        paths.local_dir.clone(),
    ];
    for dir in &dirs {
        ensure_dir(dir)?;
    }

    if paths.repo_file.is_dir() {
        return Err(ChartError::NotAFile(paths.repo_file.display().to_string()));
    }
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<(), ChartError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ChartError::NotADirectory(dir.display().to_string())),
        Err(_) => {
            info!(path = %dir.display(), "creating");
            fs::create_dir_all(dir).map_err(|source| ChartError::CreateDir {
                path: dir.display().to_string(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_derive_from_home() {
        let paths = RepoPaths::from_home("/srv/helm");
        assert_eq!(paths.cache_dir, PathBuf::from("/srv/helm/repository/cache"));
        assert_eq!(
            paths.repo_file,
            PathBuf::from("/srv/helm/repository/repositories.yaml")
        );
        assert_eq!(
            paths.cache_index_file("stable"),
            PathBuf::from("/srv/helm/repository/cache/stable-index.yaml")
        );
    }

    #[test]
    fn creates_missing_directories_and_is_repeatable() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = RepoPaths::from_home(tmp.path().join("helm"));

        ensure_home(&paths).unwrap();
        assert!(paths.cache_dir.is_dir());
        assert!(paths.local_dir.is_dir());
        ensure_home(&paths).unwrap();
    }

    #[test]
    fn file_in_place_of_directory_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let home = tmp.path().join("helm");
        fs::write(&home, b"").unwrap();

        let err = ensure_home(&RepoPaths::from_home(&home)).unwrap_err();
        assert!(matches!(err, ChartError::NotADirectory(_)));
    }

    #[test]
    fn directory_in_place_of_repo_file_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = RepoPaths::from_home(tmp.path());
        fs::create_dir_all(&paths.repo_file).unwrap();

        let err = ensure_home(&paths).unwrap_err();
        assert!(matches!(err, ChartError::NotAFile(_)));
    }
}
