use std::sync::Arc;

use k8s_openapi::api::core::v1::{Event, Node, Pod, Service};

use crate::{
    fetch::{ClusterFetcher, ListResource, NamespaceQuery, ReleaseSource, ResourceKind},
    subjects::{release::Release, Subject},
};

mod broadcast;

pub use broadcast::{broadcast, Broadcaster, Collection, Slot};

/// Slots for every kind one list builder reads, owned by a single request.
///
/// Nodes and services are optional: they are only drained when declared.
#[derive(Debug)]
pub struct ResourceChannels<S> {
    pub subject: Slot<S>,
    pub nodes: Option<Slot<Node>>,
    pub services: Option<Slot<Service>>,
    pub pods: Slot<Pod>,
    pub events: Slot<Event>,
}

impl<S> ResourceChannels<S> {
    pub fn new(subject: Slot<S>, pods: Slot<Pod>, events: Slot<Event>) -> Self {
        Self {
            subject,
            nodes: None,
            services: None,
            pods,
            events,
        }
    }

    pub fn with_nodes(mut self, nodes: Slot<Node>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    pub fn with_services(mut self, services: Slot<Service>) -> Self {
        self.services = Some(services);
        self
    }
}

impl<S: Subject + ListResource> ResourceChannels<S> {
    /// Start one worker per kind for a single builder.
    pub fn spawn<F: ClusterFetcher>(
        broadcaster: &Broadcaster,
        fetcher: &F,
        namespaces: &NamespaceQuery,
    ) -> Self {
        let [subject] = broadcaster.broadcast(S::KIND, fetcher.list::<S>(S::KIND, namespaces));
        let [nodes] = broadcaster.broadcast(
            ResourceKind::Node,
            fetcher.list::<Node>(ResourceKind::Node, namespaces),
        );
        let [services] = broadcaster.broadcast(
            ResourceKind::Service,
            fetcher.list::<Service>(ResourceKind::Service, namespaces),
        );
        let [pods] = broadcaster.broadcast(
            ResourceKind::Pod,
            fetcher.list::<Pod>(ResourceKind::Pod, namespaces),
        );
        let [events] = broadcaster.broadcast(
            ResourceKind::Event,
            fetcher.list::<Event>(ResourceKind::Event, namespaces),
        );

        Self::new(subject, pods, events)
            .with_nodes(nodes)
            .with_services(services)
    }
}

impl ResourceChannels<Release> {
    /// Releases come from the release subsystem; pods and events from the cluster.
    pub fn spawn_releases<F: ClusterFetcher>(
        broadcaster: &Broadcaster,
        source: Arc<dyn ReleaseSource>,
        fetcher: &F,
        namespaces: &NamespaceQuery,
    ) -> Self {
        let query = namespaces.clone();
        let [subject] = broadcaster.broadcast(ResourceKind::Release, async move {
            source.list_releases(&query).await
        });
        let [pods] = broadcaster.broadcast(
            ResourceKind::Pod,
            fetcher.list::<Pod>(ResourceKind::Pod, namespaces),
        );
        let [events] = broadcaster.broadcast(
            ResourceKind::Event,
            fetcher.list::<Event>(ResourceKind::Event, namespaces),
        );

        Self::new(subject, pods, events)
    }
}
