use std::{fmt, future::Future, str::FromStr, time::Duration};

use async_trait::async_trait;
use kube::{
    api::{Api, ListParams},
    Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{error::FetchError, subjects::release::Release};

/// Every kind the aggregation engine lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Deployment,
    ReplicaSet,
    StatefulSet,
    DaemonSet,
    Job,
    Release,
    Pod,
    Node,
    Service,
    Event,
}

impl ResourceKind {
    /// Kind name as it appears in `involvedObject.kind` and `TypeMeta`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deployment => "Deployment",
            Self::ReplicaSet => "ReplicaSet",
            Self::StatefulSet => "StatefulSet",
            Self::DaemonSet => "DaemonSet",
            Self::Job => "Job",
            Self::Release => "Release",
            Self::Pod => "Pod",
            Self::Node => "Node",
            Self::Service => "Service",
            Self::Event => "Event",
        }
    }

    pub fn is_namespaced(self) -> bool {
        !matches!(self, Self::Node)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "deployment" => Self::Deployment,
            "replicaset" => Self::ReplicaSet,
            "statefulset" => Self::StatefulSet,
            "daemonset" => Self::DaemonSet,
            "job" => Self::Job,
            "release" => Self::Release,
            "pod" => Self::Pod,
            "node" => Self::Node,
            "service" => Self::Service,
            "event" => Self::Event,
            _ => return Err(()),
        })
    }
}

/// Namespaces a request is scoped to. Empty means every namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NamespaceQuery {
    namespaces: Vec<String>,
}

impl NamespaceQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut namespaces: Vec<String> = namespaces
            .into_iter()
            .map(Into::into)
            .filter(|ns| !ns.is_empty())
            .collect();
        namespaces.sort();
        namespaces.dedup();
        Self { namespaces }
    }

    /// The namespace to push down to the API server, if the query names exactly one.
    pub fn single(&self) -> Option<&str> {
        match self.namespaces.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    pub fn matches(&self, namespace: &str) -> bool {
        self.namespaces.is_empty() || self.namespaces.iter().any(|ns| ns == namespace)
    }
}

/// Bounds shared by every typed object a [`ClusterFetcher`] can list.
pub trait ListResource:
    Resource<DynamicType = ()> + Clone + DeserializeOwned + fmt::Debug + Send + Sync + 'static
{
}

impl<K> ListResource for K where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + fmt::Debug + Send + Sync + 'static
{
}

/// One blocking list call per kind. Implementations must be cheap to clone
/// and safe to share across every worker of a request.
pub trait ClusterFetcher: Clone + Send + Sync + 'static {
    fn list<K: ListResource>(
        &self,
        kind: ResourceKind,
        namespaces: &NamespaceQuery,
    ) -> impl Future<Output = Result<Vec<K>, FetchError>> + Send + 'static;
}

/// Lists through the cluster API with a per-call deadline.
#[derive(Clone)]
pub struct KubeFetcher {
    client: Client,
    timeout: Duration,
}

impl KubeFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl ClusterFetcher for KubeFetcher {
    fn list<K: ListResource>(
        &self,
        kind: ResourceKind,
        namespaces: &NamespaceQuery,
    ) -> impl Future<Output = Result<Vec<K>, FetchError>> + Send + 'static {
        let api: Api<K> = Api::all(self.client.clone());
        let namespaces = namespaces.clone();
        let timeout = self.timeout;

        async move {
            let mut params = ListParams::default();
            if kind.is_namespaced() {
                if let Some(ns) = namespaces.single() {
                    params = params.fields(&format!("metadata.namespace={ns}"));
                }
            }

            let list = tokio::time::timeout(timeout, api.list(&params))
                .await
                .map_err(|_| FetchError::Timeout { kind, timeout })?
                .map_err(|e| FetchError::from_kube(kind, e))?;

            let items = list
                .items
                .into_iter()
                .filter(|obj| {
                    !kind.is_namespaced()
                        || namespaces.matches(obj.namespace().as_deref().unwrap_or_default())
                })
                .collect::<Vec<_>>();

            tracing::debug!(%kind, count = items.len(), "listed");
            Ok(items)
        }
    }
}

/// Source of releases managed by the package manager's release subsystem.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    async fn list_releases(&self, namespaces: &NamespaceQuery) -> Result<Vec<Release>, FetchError>;

    /// One release by namespace and name. `None` when it does not exist.
    async fn get_release(&self, namespace: &str, name: &str) -> Result<Option<Release>, FetchError> {
        let releases = self.list_releases(&NamespaceQuery::new([namespace])).await?;
        Ok(releases
            .into_iter()
            .find(|r| r.namespace == namespace && r.name == name))
    }
}
