use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex},
};

use k8s_openapi::{
    api::{
        apps::v1::Deployment,
        batch::v1::Job,
        core::v1::{Event, Pod},
    },
    serde_json::{self, json, Map, Value},
};

use crate::{
    error::FetchError,
    fetch::{ClusterFetcher, ListResource, NamespaceQuery, ResourceKind},
};

fn labels(pairs: &[(&str, &str)]) -> Value {
    Value::Object(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect::<Map<_, _>>(),
    )
}

pub fn deployment(name: &str, ns: &str, selector: &[(&str, &str)], replicas: Option<i32>) -> Deployment {
    serde_json::from_value(json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": name, "namespace": ns, "creationTimestamp": "2024-01-01T00:00:00Z" },
        "spec": {
            "replicas": replicas,
            "selector": { "matchLabels": labels(selector) },
            "template": { "metadata": { "labels": labels(selector) } }
        }
    }))
    .unwrap()
}

pub fn job(name: &str, ns: &str, selector: &[(&str, &str)], completions: Option<i32>) -> Job {
    serde_json::from_value(json!({
        "apiVersion": "batch/v1",
        "kind": "Job",
        "metadata": { "name": name, "namespace": ns },
        "spec": {
            "completions": completions,
            "selector": { "matchLabels": labels(selector) },
            "template": { "metadata": { "labels": labels(selector) } }
        }
    }))
    .unwrap()
}

pub fn pod(name: &str, ns: &str, pod_labels: &[(&str, &str)], phase: &str) -> Pod {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": { "name": name, "namespace": ns, "labels": labels(pod_labels) },
        "status": { "phase": phase }
    }))
    .unwrap()
}

pub fn pod_with_uid(name: &str, ns: &str, pod_labels: &[(&str, &str)], phase: &str, uid: &str) -> Pod {
    let mut pod = pod(name, ns, pod_labels, phase);
    pod.metadata.uid = Some(uid.to_string());
    pod
}

pub fn event(ns: &str, kind: &str, name: &str, type_: &str, reason: &str) -> Event {
    serde_json::from_value(json!({
        "apiVersion": "v1",
        "kind": "Event",
        "metadata": { "name": format!("{name}.{reason}"), "namespace": ns },
        "involvedObject": { "kind": kind, "name": name, "namespace": ns },
        "type": type_,
        "reason": reason,
        "message": format!("{reason} on {name}"),
        "count": 1
    }))
    .unwrap()
}

#[derive(Default)]
struct Inner {
    responses: Mutex<HashMap<ResourceKind, Result<Value, FetchError>>>,
    calls: Mutex<HashMap<ResourceKind, usize>>,
}

/// Serves canned lists per kind and counts every call. Kinds without a
/// canned response list as empty.
#[derive(Clone, Default)]
pub struct FakeFetcher {
    inner: Arc<Inner>,
}

impl FakeFetcher {
    pub fn with<T: serde::Serialize>(self, kind: ResourceKind, items: Vec<T>) -> Self {
        let items = serde_json::to_value(items).unwrap();
        self.inner.responses.lock().unwrap().insert(kind, Ok(items));
        self
    }

    pub fn failing(self, kind: ResourceKind, err: FetchError) -> Self {
        self.inner.responses.lock().unwrap().insert(kind, Err(err));
        self
    }

    pub fn calls(&self, kind: ResourceKind) -> usize {
        self.inner.calls.lock().unwrap().get(&kind).copied().unwrap_or(0)
    }
}

impl ClusterFetcher for FakeFetcher {
    fn list<K: ListResource>(
        &self,
        kind: ResourceKind,
        _namespaces: &NamespaceQuery,
    ) -> impl Future<Output = Result<Vec<K>, FetchError>> + Send + 'static {
        *self.inner.calls.lock().unwrap().entry(kind).or_default() += 1;
        let response = self.inner.responses.lock().unwrap().get(&kind).cloned();

        async move {
            match response {
                Some(Ok(value)) => Ok(serde_json::from_value(value).unwrap()),
                Some(Err(err)) => Err(err),
                None => Ok(Vec::new()),
            }
        }
    }
}
