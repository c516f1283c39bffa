// lib.rs
use std::{path::Path, sync::Arc};

use k8s_openapi::{
    api::{
        apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
        batch::v1::Job,
        core::v1::{Event, Pod},
    },
    serde_json,
};
use kube::{config::KubeConfigOptions, Client, Config};
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use crate::{
    builder::build_list_from_channels,
    channels::{Broadcaster, ResourceChannels, Slot},
    chart::{
        add_repository, deploy_chart_response, ensure_home, get_repository_charts,
        get_repository_list, remove_repository, AppDeploymentFromChartSpec, ReleaseInstaller,
        RepositoryManager, RepositorySpec,
    },
    config::DashboardConfig,
    dataselect::DataSelectQuery,
    error::{ChartError, DashboardError, FetchError},
    fetch::{ClusterFetcher, KubeFetcher, ListResource, NamespaceQuery, ReleaseSource, ResourceKind},
    overview::{get_workloads, Workloads},
    structs::{GetListArgs, GetReleaseDetailArgs, RepositoryArgs},
    subjects::{
        release::{Release, ReleaseDetail},
        Subject,
    },
    view::SubjectList,
};

cfg_if::cfg_if! {
    if #[cfg(feature = "telemetry")] {
        use kubedash_telemetry as logging;
    } else {
        mod log;
        use log as logging;
    }
}

pub mod builder;
pub mod channels;
pub mod chart;
pub mod config;
pub mod correlate;
pub mod dataselect;
pub mod error;
pub mod fetch;
pub mod overview;
pub mod selector;
pub mod subjects;
pub mod view;

mod structs;
mod utils;

#[cfg(test)]
mod testing;

/// Entry point for hosts: owns the fetcher, the collaborators and the
/// shutdown signal shared by every request.
pub struct Dashboard<F> {
    fetcher: F,
    releases: Option<Arc<dyn ReleaseSource>>,
    installer: Option<Arc<dyn ReleaseInstaller>>,
    repositories: Option<Arc<dyn RepositoryManager>>,
    config: Arc<DashboardConfig>,
    broadcaster: Broadcaster,
    shutdown: CancellationToken,
}

impl Dashboard<KubeFetcher> {
    /// Build a cluster client from the configured kubeconfig context.
    #[tracing::instrument(skip_all, fields(context = ?config.context))]
    pub async fn connect(config: DashboardConfig) -> Result<Self, DashboardError> {
        config.validate()?;
        let options = KubeConfigOptions {
            context: config.context.clone(),
            ..Default::default()
        };
        let kube_config = Config::from_kubeconfig(&options).await?;
        let client = Client::try_from(kube_config)?;

        let fetcher = KubeFetcher::new(client, config.fetch_timeout());
        Ok(Self::new(fetcher, config))
    }
}

impl<F: ClusterFetcher> Dashboard<F> {
    pub fn new(fetcher: F, config: DashboardConfig) -> Self {
        let shutdown = CancellationToken::new();
        Self {
            fetcher,
            releases: None,
            installer: None,
            repositories: None,
            config: Arc::new(config),
            broadcaster: Broadcaster::new(shutdown.clone()),
            shutdown,
        }
    }

    pub fn with_release_source(mut self, source: Arc<dyn ReleaseSource>) -> Self {
        self.releases = Some(source);
        self
    }

    pub fn with_installer(mut self, installer: Arc<dyn ReleaseInstaller>) -> Self {
        self.installer = Some(installer);
        self
    }

    pub fn with_repository_manager(mut self, repositories: Arc<dyn RepositoryManager>) -> Self {
        self.repositories = Some(repositories);
        self
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Install the subscriber configured by `log_dir` and `log_level`.
    pub fn init_logging(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        logging::setup_logger(
            Path::new(&self.config.log_dir),
            &self.config.log_level,
            &self.config.otlp_endpoint,
        )
    }

    /// Stop every in-flight fetch. Pending reads fail as abandoned.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        #[cfg(feature = "telemetry")]
        logging::shutdown();
    }

    pub async fn list<S: Subject + ListResource>(
        &self,
        namespaces: &NamespaceQuery,
        query: &DataSelectQuery,
    ) -> Result<SubjectList, FetchError> {
        let channels = ResourceChannels::<S>::spawn(&self.broadcaster, &self.fetcher, namespaces);
        build_list_from_channels(channels, query).await
    }

    pub async fn releases(
        &self,
        namespaces: &NamespaceQuery,
        query: &DataSelectQuery,
    ) -> Result<SubjectList, FetchError> {
        let channels = match &self.releases {
            Some(source) => ResourceChannels::spawn_releases(
                &self.broadcaster,
                source.clone(),
                &self.fetcher,
                namespaces,
            ),
            None => {
                debug!("no release source configured");
                ResourceChannels::new(
                    Slot::failed(
                        ResourceKind::Release,
                        FetchError::Unsupported {
                            kind: ResourceKind::Release,
                        },
                    ),
                    Slot::ready(ResourceKind::Pod, Vec::new()),
                    Slot::ready(ResourceKind::Event, Vec::new()),
                )
            }
        };
        build_list_from_channels::<Release>(channels, query).await
    }

    /// One release with the pods and warnings of its namespace.
    pub async fn release_detail(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ReleaseDetail, DashboardError> {
        let source = self.releases.as_ref().ok_or(FetchError::Unsupported {
            kind: ResourceKind::Release,
        })?;
        let namespaces = NamespaceQuery::new([namespace]);
        let [pods] = self.broadcaster.broadcast(
            ResourceKind::Pod,
            self.fetcher.list::<Pod>(ResourceKind::Pod, &namespaces),
        );
        let [events] = self.broadcaster.broadcast(
            ResourceKind::Event,
            self.fetcher.list::<Event>(ResourceKind::Event, &namespaces),
        );

        let release = source
            .get_release(namespace, name)
            .await?
            .ok_or_else(|| DashboardError::NotFound {
                kind: ResourceKind::Release,
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;
        let pods = pods.recv().await?;
        let events = events.recv().await?;

        Ok(ReleaseDetail::new(release, &pods, &events))
    }

    pub async fn workloads(
        &self,
        namespaces: &NamespaceQuery,
        query: &DataSelectQuery,
    ) -> Result<Workloads, FetchError> {
        get_workloads(&self.broadcaster, &self.fetcher, namespaces, query).await
    }

    /// List one kind, or the workloads overview, from a JSON request.
    pub async fn get_list_async(&self, json: String) -> Result<String, DashboardError> {
        let span = tracing::info_span!("get_list", request_id = %uuid::Uuid::new_v4());
        async move {
            let args: GetListArgs = serde_json::from_str(&json)?;
            let namespaces = NamespaceQuery::new(args.namespaces);
            let query = &args.query;

            let body = match args.kind.to_lowercase().as_str() {
                "workloads" => serde_json::to_string(&self.workloads(&namespaces, query).await?)?,
                kind => {
                    let list = match kind.parse::<ResourceKind>() {
                        Ok(ResourceKind::Deployment) => self.list::<Deployment>(&namespaces, query).await?,
                        Ok(ResourceKind::ReplicaSet) => self.list::<ReplicaSet>(&namespaces, query).await?,
                        Ok(ResourceKind::StatefulSet) => self.list::<StatefulSet>(&namespaces, query).await?,
                        Ok(ResourceKind::DaemonSet) => self.list::<DaemonSet>(&namespaces, query).await?,
                        Ok(ResourceKind::Job) => self.list::<Job>(&namespaces, query).await?,
                        Ok(ResourceKind::Release) => self.releases(&namespaces, query).await?,
                        _ => return Err(DashboardError::UnknownKind(args.kind.clone())),
                    };
                    serde_json::to_string(&list)?
                }
            };
            Ok::<_, DashboardError>(body)
        }
        .instrument(span)
        .await
    }

    /// Deploy a chart from a JSON `AppDeploymentFromChartSpec`.
    ///
    /// Validation and install failures are reported in the response body.
    pub async fn deploy_chart_async(&self, json: String) -> Result<String, DashboardError> {
        let span = tracing::info_span!("deploy_chart", request_id = %uuid::Uuid::new_v4());
        async move {
            let spec: AppDeploymentFromChartSpec = serde_json::from_str(&json)?;
            let installer = self.installer.as_deref().ok_or(ChartError::NoInstaller)?;
            ensure_home(&self.config.repo)?;

            let response = deploy_chart_response(spec, installer).await;
            Ok::<_, DashboardError>(serde_json::to_string(&response)?)
        }
        .instrument(span)
        .await
    }

    pub async fn get_release_detail_async(&self, json: String) -> Result<String, DashboardError> {
        let span = tracing::info_span!("get_release_detail", request_id = %uuid::Uuid::new_v4());
        async move {
            let args: GetReleaseDetailArgs = serde_json::from_str(&json)?;
            let detail = self.release_detail(&args.namespace, &args.name).await?;
            Ok::<_, DashboardError>(serde_json::to_string(&detail)?)
        }
        .instrument(span)
        .await
    }

    fn repository_manager(&self) -> Result<&dyn RepositoryManager, ChartError> {
        self.repositories
            .as_deref()
            .ok_or(ChartError::NoRepositoryManager)
    }

    pub async fn get_repository_list_async(&self) -> Result<String, DashboardError> {
        let span = tracing::info_span!("get_repository_list", request_id = %uuid::Uuid::new_v4());
        async move {
            let list = get_repository_list(&self.config.repo, self.repository_manager()?).await?;
            Ok::<_, DashboardError>(serde_json::to_string(&list)?)
        }
        .instrument(span)
        .await
    }

    /// Add a repository from a JSON `RepositorySpec`; echoes the spec back.
    pub async fn add_repository_async(&self, json: String) -> Result<String, DashboardError> {
        let span = tracing::info_span!("add_repository", request_id = %uuid::Uuid::new_v4());
        async move {
            let spec: RepositorySpec = serde_json::from_str(&json)?;
            add_repository(&self.config.repo, self.repository_manager()?, &spec).await?;
            Ok::<_, DashboardError>(serde_json::to_string(&spec)?)
        }
        .instrument(span)
        .await
    }

    pub async fn remove_repository_async(&self, json: String) -> Result<String, DashboardError> {
        let span = tracing::info_span!("remove_repository", request_id = %uuid::Uuid::new_v4());
        async move {
            let args: RepositoryArgs = serde_json::from_str(&json)?;
            let manager = self.repository_manager()?;
            remove_repository(&self.config.repo, manager, &args.repo_name).await?;
            let list = get_repository_list(&self.config.repo, manager).await?;
            Ok::<_, DashboardError>(serde_json::to_string(&list)?)
        }
        .instrument(span)
        .await
    }

    pub async fn get_repository_charts_async(&self, json: String) -> Result<String, DashboardError> {
        let span = tracing::info_span!("get_repository_charts", request_id = %uuid::Uuid::new_v4());
        async move {
            let args: RepositoryArgs = serde_json::from_str(&json)?;
            let charts =
                get_repository_charts(&self.config.repo, self.repository_manager()?, &args.repo_name)
                    .await?;
            Ok::<_, DashboardError>(serde_json::to_string(&charts)?)
        }
        .instrument(span)
        .await
    }
}
