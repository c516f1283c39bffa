use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Event, Pod};
use serde::{Deserialize, Serialize};

use super::Subject;
use crate::{
    correlate::{correlate, DerivedStatus},
    error::CorrelationError,
    fetch::ResourceKind,
    selector::Selector,
    view::{ObjectMeta, TypeMeta},
};

/// Label charts put on the pods of a release.
pub const RELEASE_LABEL: &str = "release";

/// A release as reported by the release subsystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub chart: String,
    #[serde(default)]
    pub last_deployed: Option<DateTime<Utc>>,
}

impl Subject for Release {
    const KIND: ResourceKind = ResourceKind::Release;

    fn object_meta(&self) -> ObjectMeta {
        ObjectMeta {
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            labels: Default::default(),
            creation_timestamp: self.last_deployed,
        }
    }

    fn selector(&self) -> Result<Selector, CorrelationError> {
        Ok(Selector::from_map(
            [(RELEASE_LABEL.to_string(), self.name.clone())].into(),
        ))
    }

    fn desired_count(&self) -> Option<i32> {
        None
    }
}

/// A single release with the pods and warnings of its namespace correlated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDetail {
    pub object_meta: ObjectMeta,
    pub type_meta: TypeMeta,
    pub status: String,
    pub chart: String,
    pub pods: DerivedStatus,
}

impl ReleaseDetail {
    pub fn new(release: Release, pods: &[Pod], events: &[Event]) -> Self {
        let object_meta = release.object_meta();
        let pods = correlate(&release, &object_meta, pods, events);
        Self {
            object_meta,
            type_meta: TypeMeta {
                kind: ResourceKind::Release,
            },
            status: release.status,
            chart: release.chart,
            pods,
        }
    }
}
