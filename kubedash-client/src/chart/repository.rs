use std::{error::Error, fs, io};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::repo::{ensure_home, RepoPaths};
use crate::error::ChartError;

const DEFAULT_CHART_ICON: &str = "https://deis.com/assets/images/svg/helm-logo.svg";

/// Reads and writes the chart repository registry under [`RepoPaths`].
/// Implemented by the release subsystem, which owns the file format.
#[async_trait]
pub trait RepositoryManager: Send + Sync {
    async fn list_repositories(
        &self,
        paths: &RepoPaths,
    ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>>;

    /// Register `name` and download its index to `paths.cache_index_file(name)`.
    async fn add_repository(
        &self,
        paths: &RepoPaths,
        name: &str,
        url: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn remove_repository(
        &self,
        paths: &RepoPaths,
        name: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    async fn list_charts(
        &self,
        paths: &RepoPaths,
        repo: &str,
    ) -> Result<Vec<ChartSpec>, Box<dyn Error + Send + Sync>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySpec {
    pub repo_name: String,
    pub repo_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryListSpec {
    pub repo_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub name: String,
    pub version: String,
    #[serde(rename = "fullURL")]
    pub full_url: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryChartListSpec {
    pub charts: Vec<ChartSpec>,
}

fn repository_error(repo: &str) -> impl FnOnce(Box<dyn Error + Send + Sync>) -> ChartError + '_ {
    move |source| ChartError::Repository {
        repo: repo.to_string(),
        source,
    }
}

/// Registered repository names, sorted.
pub async fn get_repository_list(
    paths: &RepoPaths,
    manager: &dyn RepositoryManager,
) -> Result<RepositoryListSpec, ChartError> {
    ensure_home(paths)?;
    let registry = paths.repo_file.display().to_string();
    let mut repo_names = manager
        .list_repositories(paths)
        .await
        .map_err(repository_error(&registry))?;
    repo_names.sort();
    Ok(RepositoryListSpec { repo_names })
}

#[tracing::instrument(skip(paths, manager))]
pub async fn add_repository(
    paths: &RepoPaths,
    manager: &dyn RepositoryManager,
    spec: &RepositorySpec,
) -> Result<(), ChartError> {
    let name = spec.repo_name.trim();
    let url = spec.repo_url.trim();
    if name.is_empty() || name.contains('/') {
        return Err(ChartError::InvalidRepository(format!(
            "repository name {name:?} must be non-empty and contain no '/'"
        )));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ChartError::InvalidRepository(format!(
            "{url:?} is not an http(s) url"
        )));
    }

    let existing = get_repository_list(paths, manager).await?;
    if existing.repo_names.iter().any(|r| r == name) {
        return Err(ChartError::RepositoryExists(name.to_string()));
    }

    info!(%name, %url, "adding chart repository");
    manager
        .add_repository(paths, name, url)
        .await
        .map_err(repository_error(name))
}

/// Unregister `name` and drop its cached index.
#[tracing::instrument(skip(paths, manager))]
pub async fn remove_repository(
    paths: &RepoPaths,
    manager: &dyn RepositoryManager,
    name: &str,
) -> Result<(), ChartError> {
    let existing = get_repository_list(paths, manager).await?;
    if !existing.repo_names.iter().any(|r| r == name) {
        return Err(ChartError::UnknownRepository(name.to_string()));
    }

    manager
        .remove_repository(paths, name)
        .await
        .map_err(repository_error(name))?;

    let index = paths.cache_index_file(name);
    match fs::remove_file(&index) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %index.display(), "no cached index");
            Ok(())
        }
        Err(source) => Err(ChartError::RemoveCache {
            path: index.display().to_string(),
            source,
        }),
    }
}

/// Charts offered by `repo`. Charts without an icon get the default one.
pub async fn get_repository_charts(
    paths: &RepoPaths,
    manager: &dyn RepositoryManager,
    repo: &str,
) -> Result<RepositoryChartListSpec, ChartError> {
    let mut charts = manager
        .list_charts(paths, repo)
        .await
        .map_err(repository_error(repo))?;
    for chart in charts.iter_mut().filter(|c| c.icon.is_empty()) {
        chart.icon = DEFAULT_CHART_ICON.to_string();
    }
    Ok(RepositoryChartListSpec { charts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::BTreeMap, sync::Mutex};

    /// Keeps repositories in memory and writes an index file on add.
    #[derive(Default)]
    struct MemoryRepositories {
        repos: Mutex<BTreeMap<String, String>>,
        charts: Vec<ChartSpec>,
    }

    #[async_trait]
    impl RepositoryManager for MemoryRepositories {
        async fn list_repositories(
            &self,
            _paths: &RepoPaths,
        ) -> Result<Vec<String>, Box<dyn Error + Send + Sync>> {
            // Reverse order, so callers must sort.
            Ok(self.repos.lock().unwrap().keys().rev().cloned().collect())
        }

        async fn add_repository(
            &self,
            paths: &RepoPaths,
            name: &str,
            url: &str,
        ) -> Result<(), Box<dyn Error + Send + Sync>> {
            fs::write(paths.cache_index_file(name), b"entries: {}\n")?;
            self.repos
                .lock()
                .unwrap()
                .insert(name.to_string(), url.to_string());
            Ok(())
        }

        async fn remove_repository(
            &self,
            _paths: &RepoPaths,
            name: &str,
        ) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.repos.lock().unwrap().remove(name);
            Ok(())
        }

        async fn list_charts(
            &self,
            _paths: &RepoPaths,
            repo: &str,
        ) -> Result<Vec<ChartSpec>, Box<dyn Error + Send + Sync>> {
            if !self.repos.lock().unwrap().contains_key(repo) {
                return Err(format!("no index for {repo}").into());
            }
            Ok(self.charts.clone())
        }
    }

    fn spec(name: &str, url: &str) -> RepositorySpec {
        RepositorySpec {
            repo_name: name.into(),
            repo_url: url.into(),
        }
    }

    #[tokio::test]
    async fn add_list_and_remove_repositories() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = RepoPaths::from_home(tmp.path());
        let manager = MemoryRepositories::default();

        add_repository(&paths, &manager, &spec("stable", "https://charts.example.com"))
            .await
            .unwrap();
        add_repository(&paths, &manager, &spec("incubator", "http://10.0.0.1:8879/charts"))
            .await
            .unwrap();
        assert_eq!(
            get_repository_list(&paths, &manager).await.unwrap().repo_names,
            vec!["incubator", "stable"]
        );
        assert!(paths.cache_index_file("stable").is_file());

        remove_repository(&paths, &manager, "stable").await.unwrap();
        assert!(!paths.cache_index_file("stable").exists());
        assert_eq!(
            get_repository_list(&paths, &manager).await.unwrap().repo_names,
            vec!["incubator"]
        );
    }

    #[tokio::test]
    async fn duplicate_and_unknown_names_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = RepoPaths::from_home(tmp.path());
        let manager = MemoryRepositories::default();
        add_repository(&paths, &manager, &spec("stable", "https://charts.example.com"))
            .await
            .unwrap();

        let err = add_repository(&paths, &manager, &spec("stable", "https://other.example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChartError::RepositoryExists(name) if name == "stable"));

        let err = remove_repository(&paths, &manager, "missing").await.unwrap_err();
        assert!(matches!(err, ChartError::UnknownRepository(_)));
    }

    #[tokio::test]
    async fn malformed_repositories_never_reach_the_manager() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = RepoPaths::from_home(tmp.path());
        let manager = MemoryRepositories::default();

        for bad in [
            spec("", "https://charts.example.com"),
            spec("a/b", "https://charts.example.com"),
            spec("stable", "ftp://charts.example.com"),
        ] {
            let err = add_repository(&paths, &manager, &bad).await.unwrap_err();
            assert!(matches!(err, ChartError::InvalidRepository(_)), "{bad:?}");
        }
        assert!(manager.repos.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn charts_without_icons_get_the_default() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = RepoPaths::from_home(tmp.path());
        let manager = MemoryRepositories {
            charts: vec![
                ChartSpec {
                    name: "redis".into(),
                    version: "1.0.0".into(),
                    ..Default::default()
                },
                ChartSpec {
                    name: "nginx".into(),
                    icon: "https://example.com/nginx.svg".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        add_repository(&paths, &manager, &spec("stable", "https://charts.example.com"))
            .await
            .unwrap();

        let charts = get_repository_charts(&paths, &manager, "stable").await.unwrap().charts;
        assert_eq!(charts[0].icon, DEFAULT_CHART_ICON);
        assert_eq!(charts[1].icon, "https://example.com/nginx.svg");

        let err = get_repository_charts(&paths, &manager, "nope").await.unwrap_err();
        assert!(matches!(err, ChartError::Repository { repo, .. } if repo == "nope"));
    }

    #[test]
    fn chart_spec_serializes_full_url_key() {
        let value = k8s_openapi::serde_json::to_value(ChartSpec {
            full_url: "https://x/redis-1.0.0.tgz".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(value["fullURL"], "https://x/redis-1.0.0.tgz");
    }
}
