use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Event, ObjectReference, Pod};
use serde::Serialize;
use tracing::warn;

use crate::{
    selector::Selector,
    subjects::Subject,
    view::ObjectMeta,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    pub fn of(pod: &Pod) -> Self {
        match pod.status.as_ref().and_then(|s| s.phase.as_deref()) {
            Some("Pending") => Self::Pending,
            Some("Running") => Self::Running,
            Some("Succeeded") => Self::Succeeded,
            Some("Failed") => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Normal,
}

impl Severity {
    pub fn of(event: &Event) -> Self {
        match event.type_.as_deref() {
            Some("Warning") => Self::Warning,
            _ => Self::Normal,
        }
    }
}

/// A warning-severity event attached to a listed subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningEvent {
    pub namespace: String,
    pub object_kind: String,
    pub object_name: String,
    pub reason: String,
    pub message: String,
    pub count: i32,
    pub last_seen: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    pub severity: Severity,
}

impl From<&Event> for WarningEvent {
    fn from(ev: &Event) -> Self {
        let r = &ev.involved_object;
        Self {
            namespace: event_namespace(ev).unwrap_or_default().to_string(),
            object_kind: r.kind.clone().unwrap_or_default(),
            object_name: r.name.clone().unwrap_or_default(),
            reason: ev.reason.clone().unwrap_or_default(),
            message: ev.message.clone().unwrap_or_default().replace('\n', ""),
            count: ev.count.unwrap_or(1),
            last_seen: ev
                .series
                .as_ref()
                .and_then(|s| s.last_observed_time.as_ref().map(|t| t.0))
                .or_else(|| ev.event_time.as_ref().map(|t| t.0))
                .or_else(|| ev.last_timestamp.as_ref().map(|t| t.0))
                .or_else(|| ev.metadata.creation_timestamp.as_ref().map(|t| t.0)),
            severity: Severity::of(ev),
        }
    }
}

/// Pod counts and warnings derived for one subject.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedStatus {
    /// Matched pods that are running or have succeeded.
    pub current: i32,
    pub desired: i32,
    pub failed: i32,
    pub warnings: Vec<WarningEvent>,
}

impl DerivedStatus {
    fn degraded(desired: i32) -> Self {
        Self {
            desired,
            ..Default::default()
        }
    }
}

/// Correlate `item` with the pods and events of its request.
///
/// A subject that cannot be correlated reports zero current and failed pods
/// and no warnings instead of failing the list it belongs to.
pub fn correlate<S: Subject>(
    item: &S,
    meta: &ObjectMeta,
    pods: &[Pod],
    events: &[Event],
) -> DerivedStatus {
    let desired = item.desired_count().unwrap_or(0).max(0);
    match item.selector() {
        Ok(selector) => derive_status(S::KIND.as_str(), meta, &selector, desired, pods, events),
        Err(error) => {
            warn!(kind = %S::KIND, namespace = %meta.namespace, name = %meta.name, %error, "cannot correlate pods");
            DerivedStatus::degraded(desired)
        }
    }
}

fn derive_status(
    kind: &str,
    meta: &ObjectMeta,
    selector: &Selector,
    desired: i32,
    pods: &[Pod],
    events: &[Event],
) -> DerivedStatus {
    let matched: Vec<&Pod> = pods
        .iter()
        .filter(|pod| pod.metadata.namespace.as_deref() == Some(meta.namespace.as_str()))
        .filter(|pod| selector.matches(pod.metadata.labels.as_ref()))
        .collect();

    let (mut current, mut failed) = (0, 0);
    for pod in &matched {
        match PodPhase::of(pod) {
            PodPhase::Running | PodPhase::Succeeded => current += 1,
            PodPhase::Failed => failed += 1,
            PodPhase::Pending | PodPhase::Unknown => {}
        }
    }

    let owned = OwnedPods::new(&matched);
    let warnings = events
        .iter()
        .filter(|ev| Severity::of(ev) == Severity::Warning)
        .filter(|ev| event_namespace(ev) == Some(meta.namespace.as_str()))
        .filter(|ev| {
            let obj = &ev.involved_object;
            owned.contains(obj) || refers_to(obj, kind, &meta.name)
        })
        .map(WarningEvent::from)
        .collect();

    DerivedStatus {
        current,
        desired,
        failed,
        warnings,
    }
}

fn event_namespace(ev: &Event) -> Option<&str> {
    ev.metadata
        .namespace
        .as_deref()
        .or(ev.involved_object.namespace.as_deref())
}

fn refers_to(obj: &ObjectReference, kind: &str, name: &str) -> bool {
    obj.kind.as_deref() == Some(kind) && obj.name.as_deref() == Some(name)
}

/// Identities of the matched pods an event may point at.
struct OwnedPods<'a> {
    by_name: HashMap<&'a str, Option<&'a str>>,
    uids: HashSet<&'a str>,
}

impl<'a> OwnedPods<'a> {
    fn new(pods: &[&'a Pod]) -> Self {
        Self {
            by_name: pods
                .iter()
                .filter_map(|p| Some((p.metadata.name.as_deref()?, p.metadata.uid.as_deref())))
                .collect(),
            uids: pods.iter().filter_map(|p| p.metadata.uid.as_deref()).collect(),
        }
    }

    // A uid on both sides decides; otherwise the pod name does.
    fn contains(&self, obj: &ObjectReference) -> bool {
        if obj.kind.as_deref().is_some_and(|k| k != "Pod") {
            return false;
        }
        let named = obj.name.as_deref().and_then(|n| self.by_name.get(n));
        match (named, obj.uid.as_deref()) {
            (Some(Some(pod_uid)), Some(uid)) => *pod_uid == uid,
            (Some(_), _) => true,
            (None, Some(uid)) => self.uids.contains(uid),
            (None, None) => false,
        }
    }
}
