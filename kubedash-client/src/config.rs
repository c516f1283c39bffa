use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::{chart::RepoPaths, error::ConfigError};

/// Runtime settings. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DashboardConfig {
    /// Kubeconfig context; the current context when unset.
    pub context: Option<String>,
    pub fetch_timeout_secs: u64,
    pub log_dir: String,
    /// An `EnvFilter` directive such as `info` or `kubedash_client=debug`.
    pub log_level: String,
    pub otlp_endpoint: String,
    pub repo: RepoPaths,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            context: None,
            fetch_timeout_secs: 30,
            log_dir: std::env::temp_dir().display().to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: "http://localhost:4317".to_string(),
            repo: RepoPaths::default(),
        }
    }
}

impl DashboardConfig {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// A zero fetch timeout would fail every list before it is sent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetchTimeoutSecs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let config = DashboardConfig::from_yaml_str("context: staging\nfetchTimeoutSecs: 5\n").unwrap();
        assert_eq!(config.context.as_deref(), Some("staging"));
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.repo, RepoPaths::default());
        assert_eq!(DashboardConfig::from_yaml_str("").unwrap(), DashboardConfig::default());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "logLevel: debug\nrepo:\n  homeDir: /h\n  cacheDir: /h/c\n  localDir: /h/l\n  repoFile: /h/r.yaml"
        )
        .unwrap();

        let config = DashboardConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.repo.cache_dir, std::path::PathBuf::from("/h/c"));
    }

    #[test]
    fn zero_fetch_timeout_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fetchTimeoutSecs: 0").unwrap();

        let err = DashboardConfig::from_yaml_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(DashboardConfig::default().validate().is_ok());
    }

    #[test]
    fn unreadable_and_malformed_files_are_reported() {
        let err = DashboardConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fetchTimeoutSecs: [1, 2]").unwrap();
        let err = DashboardConfig::from_yaml_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
