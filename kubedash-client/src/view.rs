use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta as KubeObjectMeta;
use serde::Serialize;

use crate::{
    correlate::DerivedStatus,
    dataselect::Selectable,
    fetch::ResourceKind,
    utils::{pad_key, AccessorMode},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub labels: BTreeMap<String, String>,
    pub creation_timestamp: Option<DateTime<Utc>>,
}

impl From<&KubeObjectMeta> for ObjectMeta {
    fn from(meta: &KubeObjectMeta) -> Self {
        Self {
            name: meta.name.clone().unwrap_or_default(),
            namespace: meta.namespace.clone().unwrap_or_default(),
            labels: meta.labels.clone().unwrap_or_default(),
            creation_timestamp: meta.creation_timestamp.as_ref().map(|t| t.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TypeMeta {
    pub kind: ResourceKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    pub total_items: usize,
}

/// One listed subject with its correlated pod status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectView {
    pub object_meta: ObjectMeta,
    pub type_meta: TypeMeta,
    pub pods: DerivedStatus,
}

/// Totals over every correlated subject, before data selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Cumulative {
    pub current: i64,
    pub desired: i64,
    pub failed: i64,
    pub warnings: usize,
}

impl Cumulative {
    pub fn add(mut self, status: &DerivedStatus) -> Self {
        self.current += i64::from(status.current);
        self.desired += i64::from(status.desired);
        self.failed += i64::from(status.failed);
        self.warnings += status.warnings.len();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectList {
    pub list_meta: ListMeta,
    pub items: Vec<SubjectView>,
    pub cumulative: Cumulative,
}

impl SubjectList {
    /// The list reported for a kind the cluster does not serve.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl Selectable for SubjectView {
    fn filterable_fields() -> &'static [&'static str] {
        &["namespace", "name", "kind"]
    }

    fn field(&self, name: &str, mode: AccessorMode) -> Option<String> {
        let count = |n: i32| match mode {
            AccessorMode::Sort => pad_key(usize::try_from(n).unwrap_or(0)),
            AccessorMode::Filter => n.to_string(),
        };

        match name {
            "namespace" => Some(self.object_meta.namespace.clone()),
            "name" => Some(self.object_meta.name.clone()),
            "kind" => Some(self.type_meta.kind.to_string()),
            "current" => Some(count(self.pods.current)),
            "desired" => Some(count(self.pods.desired)),
            "failed" => Some(count(self.pods.failed)),
            "warnings" => Some(count(
                i32::try_from(self.pods.warnings.len()).unwrap_or(i32::MAX),
            )),
            "age" | "created" => self
                .object_meta
                .creation_timestamp
                .map(|ts| match mode {
                    AccessorMode::Sort => pad_key(usize::try_from(ts.timestamp()).unwrap_or(0)),
                    AccessorMode::Filter => ts.to_rfc3339(),
                }),
            _ => None,
        }
    }
}
