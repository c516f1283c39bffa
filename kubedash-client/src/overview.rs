use k8s_openapi::api::{
    apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet},
    batch::v1::Job,
    core::v1::{Event, Node, Pod, Service},
};
use serde::Serialize;

use crate::{
    builder::build_list_from_channels,
    channels::{Broadcaster, ResourceChannels, Slot},
    dataselect::DataSelectQuery,
    error::FetchError,
    fetch::{ClusterFetcher, ListResource, NamespaceQuery, ResourceKind},
    subjects::Subject,
    view::SubjectList,
};

/// Every workload list of one namespace scope, built in a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workloads {
    pub deployment_list: SubjectList,
    pub replica_set_list: SubjectList,
    pub job_list: SubjectList,
    pub daemon_set_list: SubjectList,
    pub stateful_set_list: SubjectList,
}

fn subject<S, F>(broadcaster: &Broadcaster, fetcher: &F, namespaces: &NamespaceQuery) -> Slot<S>
where
    S: Subject + ListResource,
    F: ClusterFetcher,
{
    let [slot] = broadcaster.broadcast(S::KIND, fetcher.list::<S>(S::KIND, namespaces));
    slot
}

/// Build the five workload lists concurrently.
///
/// Nodes, services, pods and events are listed once and shared by all five
/// builders. The first failing builder fails the overview.
#[tracing::instrument(skip_all)]
pub async fn get_workloads<F: ClusterFetcher>(
    broadcaster: &Broadcaster,
    fetcher: &F,
    namespaces: &NamespaceQuery,
    query: &DataSelectQuery,
) -> Result<Workloads, FetchError> {
    let [n1, n2, n3, n4, n5] = broadcaster.broadcast(
        ResourceKind::Node,
        fetcher.list::<Node>(ResourceKind::Node, namespaces),
    );
    let [s1, s2, s3, s4, s5] = broadcaster.broadcast(
        ResourceKind::Service,
        fetcher.list::<Service>(ResourceKind::Service, namespaces),
    );
    let [p1, p2, p3, p4, p5] = broadcaster.broadcast(
        ResourceKind::Pod,
        fetcher.list::<Pod>(ResourceKind::Pod, namespaces),
    );
    let [e1, e2, e3, e4, e5] = broadcaster.broadcast(
        ResourceKind::Event,
        fetcher.list::<Event>(ResourceKind::Event, namespaces),
    );

    let deployments = ResourceChannels::new(subject::<Deployment, _>(broadcaster, fetcher, namespaces), p1, e1)
        .with_nodes(n1)
        .with_services(s1);
    let replica_sets = ResourceChannels::new(subject::<ReplicaSet, _>(broadcaster, fetcher, namespaces), p2, e2)
        .with_nodes(n2)
        .with_services(s2);
    let jobs = ResourceChannels::new(subject::<Job, _>(broadcaster, fetcher, namespaces), p3, e3)
        .with_nodes(n3)
        .with_services(s3);
    let daemon_sets = ResourceChannels::new(subject::<DaemonSet, _>(broadcaster, fetcher, namespaces), p4, e4)
        .with_nodes(n4)
        .with_services(s4);
    let stateful_sets = ResourceChannels::new(subject::<StatefulSet, _>(broadcaster, fetcher, namespaces), p5, e5)
        .with_nodes(n5)
        .with_services(s5);

    let (deployment_list, replica_set_list, job_list, daemon_set_list, stateful_set_list) = futures::try_join!(
        build_list_from_channels(deployments, query),
        build_list_from_channels(replica_sets, query),
        build_list_from_channels(jobs, query),
        build_list_from_channels(daemon_sets, query),
        build_list_from_channels(stateful_sets, query),
    )?;

    Ok(Workloads {
        deployment_list,
        replica_set_list,
        job_list,
        daemon_set_list,
        stateful_set_list,
    })
}
