use std::{error::Error, fmt};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::ChartError;

const MAX_RELEASE_NAME_LEN: usize = 53;

/// Installs a chart as a named release. Implemented by the release subsystem.
#[async_trait]
pub trait ReleaseInstaller: Send + Sync {
    async fn install_release(
        &self,
        chart: &ChartRef,
        namespace: &str,
        release_name: &str,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// `repo/name[@version]`. The repository may be omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartRef {
    pub repo: Option<String>,
    pub name: String,
    pub version: Option<String>,
}

impl ChartRef {
    pub fn parse(raw: &str) -> Result<Self, ChartError> {
        let raw = raw.trim();
        let (path, version) = match raw.split_once('@') {
            Some((path, version)) if !version.is_empty() => (path, Some(version.to_string())),
            Some(_) => return Err(ChartError::InvalidSpec(format!("empty chart version in {raw:?}"))),
            None => (raw, None),
        };
        let (repo, name) = match path.split_once('/') {
            Some((repo, name)) => (Some(repo.to_string()), name),
            None => (None, path),
        };

        if name.is_empty() || name.contains('/') || repo.as_deref() == Some("") {
            return Err(ChartError::InvalidSpec(format!("bad chart reference {raw:?}")));
        }
        Ok(Self {
            repo,
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for ChartRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(repo) = &self.repo {
            write!(f, "{repo}/")?;
        }
        f.write_str(&self.name)?;
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDeploymentFromChartSpec {
    pub chart_name: String,
    pub release_name: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDeploymentFromChartResponse {
    pub chart_name: String,
    pub release_name: String,
    pub namespace: String,
    /// Empty on success.
    pub error: String,
}

impl AppDeploymentFromChartSpec {
    fn validate(&self) -> Result<ChartRef, ChartError> {
        if self.namespace.trim().is_empty() {
            return Err(ChartError::InvalidSpec("namespace is required".into()));
        }
        if !is_dns1123_label(&self.release_name) {
            return Err(ChartError::InvalidSpec(format!(
                "release name {:?} must be a lowercase DNS label of at most {MAX_RELEASE_NAME_LEN} characters",
                self.release_name
            )));
        }
        ChartRef::parse(&self.chart_name)
    }
}

fn is_dns1123_label(name: &str) -> bool {
    let bytes = name.as_bytes();
    let alnum = |b: &u8| b.is_ascii_lowercase() || b.is_ascii_digit();

    !bytes.is_empty()
        && bytes.len() <= MAX_RELEASE_NAME_LEN
        && bytes.first().is_some_and(alnum)
        && bytes.last().is_some_and(alnum)
        && bytes.iter().all(|b| alnum(b) || *b == b'-')
}

/// Validate `spec` and hand it to `installer`.
#[tracing::instrument(skip(installer))]
pub async fn deploy_chart(
    spec: &AppDeploymentFromChartSpec,
    installer: &dyn ReleaseInstaller,
) -> Result<(), ChartError> {
    let chart = spec.validate()?;
    info!(%chart, release = %spec.release_name, "deploying chart");

    installer
        .install_release(&chart, &spec.namespace, &spec.release_name)
        .await
        .map_err(|source| {
            error!(%source, "install failed");
            ChartError::Install {
                release: spec.release_name.clone(),
                source,
            }
        })
}

/// Like [`deploy_chart`], reporting the outcome in the response body.
pub async fn deploy_chart_response(
    spec: AppDeploymentFromChartSpec,
    installer: &dyn ReleaseInstaller,
) -> AppDeploymentFromChartResponse {
    let error = match deploy_chart(&spec, installer).await {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    };
    AppDeploymentFromChartResponse {
        chart_name: spec.chart_name,
        release_name: spec.release_name,
        namespace: spec.namespace,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingInstaller {
        installs: Mutex<Vec<(String, String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl ReleaseInstaller for RecordingInstaller {
        async fn install_release(
            &self,
            chart: &ChartRef,
            namespace: &str,
            release_name: &str,
        ) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.installs.lock().unwrap().push((
                chart.to_string(),
                namespace.to_string(),
                release_name.to_string(),
            ));
            if self.fail {
                return Err("tiller unavailable".into());
            }
            Ok(())
        }
    }

    fn spec(chart: &str, release: &str, ns: &str) -> AppDeploymentFromChartSpec {
        AppDeploymentFromChartSpec {
            chart_name: chart.into(),
            release_name: release.into(),
            namespace: ns.into(),
        }
    }

    #[test]
    fn parses_chart_references() {
        assert_eq!(
            ChartRef::parse("stable/redis@1.2.3").unwrap(),
            ChartRef {
                repo: Some("stable".into()),
                name: "redis".into(),
                version: Some("1.2.3".into())
            }
        );
        assert_eq!(ChartRef::parse("redis").unwrap().repo, None);
        assert!(ChartRef::parse("stable/").is_err());
        assert!(ChartRef::parse("/redis").is_err());
        assert!(ChartRef::parse("a/b/c").is_err());
        assert!(ChartRef::parse("redis@").is_err());
    }

    #[test]
    fn release_names_are_dns_labels() {
        assert!(is_dns1123_label("my-release-1"));
        assert!(!is_dns1123_label(""));
        assert!(!is_dns1123_label("My-Release"));
        assert!(!is_dns1123_label("-leading"));
        assert!(!is_dns1123_label("trailing-"));
        assert!(!is_dns1123_label("under_score"));
        assert!(is_dns1123_label(&"a".repeat(53)));
        assert!(!is_dns1123_label(&"a".repeat(54)));
    }

    #[tokio::test]
    async fn installs_valid_deployments() {
        let installer = RecordingInstaller::default();
        deploy_chart(&spec("stable/redis", "cache", "prod"), &installer)
            .await
            .unwrap();

        assert_eq!(
            *installer.installs.lock().unwrap(),
            vec![("stable/redis".to_string(), "prod".to_string(), "cache".to_string())]
        );
    }

    #[tokio::test]
    async fn invalid_specs_never_reach_the_installer() {
        let installer = RecordingInstaller::default();
        for bad in [
            spec("stable/redis", "Bad_Name", "prod"),
            spec("stable/redis", "cache", ""),
            spec("", "cache", "prod"),
        ] {
            let err = deploy_chart(&bad, &installer).await.unwrap_err();
            assert!(matches!(err, ChartError::InvalidSpec(_)), "{bad:?}");
        }
        assert!(installer.installs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn install_failures_are_reported_in_the_response() {
        let installer = RecordingInstaller {
            fail: true,
            ..Default::default()
        };
        let response = deploy_chart_response(spec("stable/redis", "cache", "prod"), &installer).await;

        assert_eq!(response.release_name, "cache");
        assert!(response.error.contains("tiller unavailable"), "{}", response.error);
    }
}
