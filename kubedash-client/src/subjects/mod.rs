use crate::{
    error::CorrelationError, fetch::ResourceKind, selector::Selector, view::ObjectMeta,
};

pub mod daemonset;
pub mod deployment;
pub mod job;
pub mod release;
pub mod replicaset;
pub mod statefulset;

/// A listable kind whose pods are found through a label selector.
pub trait Subject: Send + Sync + 'static {
    const KIND: ResourceKind;

    fn object_meta(&self) -> ObjectMeta;

    fn selector(&self) -> Result<Selector, CorrelationError>;

    /// Desired pod count as declared on the object. `None` reads as zero.
    fn desired_count(&self) -> Option<i32>;
}

pub(crate) fn missing_selector(kind: ResourceKind, meta: &ObjectMeta) -> CorrelationError {
    CorrelationError::MissingSelector {
        kind,
        namespace: meta.namespace.clone(),
        name: meta.name.clone(),
    }
}
