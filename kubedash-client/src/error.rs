use std::time::Duration;

use kube::error::DiscoveryError;

use crate::fetch::ResourceKind;

/// Failure of a single list call, classified where the call is made.
///
/// Cloneable so one failure can be handed to every consumer of a broadcast.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("cannot reach the cluster API: {0}")]
    Transport(String),

    #[error("{kind} is not served by this cluster")]
    Unsupported { kind: ResourceKind },

    #[error("cluster API rejected the {kind} list: {message}")]
    Validation { kind: ResourceKind, message: String },

    #[error("cluster API returned {code} ({reason}) for {kind}: {message}")]
    Api {
        kind: ResourceKind,
        code: u16,
        reason: String,
        message: String,
    },

    #[error("{kind} list did not complete within {timeout:?}")]
    Timeout { kind: ResourceKind, timeout: Duration },

    #[error("{kind} fetch ended without producing a result")]
    Abandoned { kind: ResourceKind },
}

impl FetchError {
    /// Classify a kube client error for a list of `kind`.
    ///
    /// Only the structured status code is consulted, never the reason text.
    pub fn from_kube(kind: ResourceKind, err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) => match resp.code {
                404 => Self::Unsupported { kind },
                400 | 422 => Self::Validation {
                    kind,
                    message: resp.message,
                },
                code => Self::Api {
                    kind,
                    code,
                    reason: resp.reason,
                    message: resp.message,
                },
            },
            kube::Error::Discovery(DiscoveryError::MissingResource(_))
            | kube::Error::Discovery(DiscoveryError::MissingKind(_))
            | kube::Error::Discovery(DiscoveryError::MissingApiGroup(_)) => {
                Self::Unsupported { kind }
            }
            other => Self::Transport(other.to_string()),
        }
    }

    /// True when the targeted kind does not exist on this cluster.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            Self::Transport(_) => None,
            Self::Unsupported { kind }
            | Self::Validation { kind, .. }
            | Self::Api { kind, .. }
            | Self::Timeout { kind, .. }
            | Self::Abandoned { kind } => Some(*kind),
        }
    }
}

/// A single subject could not be correlated. Never fails a whole list.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CorrelationError {
    #[error("{kind} {namespace}/{name} has no pod selector")]
    MissingSelector {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    #[error("unknown selector operator {operator:?} on key {key:?}")]
    InvalidOperator { key: String, operator: String },

    #[error("selector operator {operator} on key {key:?} requires values")]
    MissingValues { key: String, operator: String },

    #[error("selector operator {operator} on key {key:?} must not carry values")]
    UnexpectedValues { key: String, operator: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("{0} must be a directory")]
    NotADirectory(String),

    #[error("{0} must be a file, not a directory")]
    NotAFile(String),

    #[error("could not create {path}: {source}")]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no release installer is configured")]
    NoInstaller,

    #[error("no chart repository manager is configured")]
    NoRepositoryManager,

    #[error("invalid chart repository: {0}")]
    InvalidRepository(String),

    #[error("repository {0} already exists, pick a different name")]
    RepositoryExists(String),

    #[error("repository {0} is not in the repositories list")]
    UnknownRepository(String),

    #[error("could not remove {path}: {source}")]
    RemoveCache {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("chart repository {repo}: {source}")]
    Repository {
        repo: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("invalid chart deployment: {0}")]
    InvalidSpec(String),

    #[error("installing release {release} failed: {source}")]
    Install {
        release: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Errors surfaced through the JSON entry points.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot build cluster client: {0}")]
    Client(#[from] kube::Error),

    #[error("cannot build cluster client: {0}")]
    Kubeconfig(#[from] kube::config::KubeconfigError),

    #[error("bad json: {0}")]
    Json(#[from] k8s_openapi::serde_json::Error),

    #[error("unknown list kind {0:?}")]
    UnknownKind(String),

    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },
}
