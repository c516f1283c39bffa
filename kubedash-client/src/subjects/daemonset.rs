use k8s_openapi::api::apps::v1::DaemonSet;

use super::{missing_selector, Subject};
use crate::{
    error::CorrelationError, fetch::ResourceKind, selector::Selector, view::ObjectMeta,
};

impl Subject for DaemonSet {
    const KIND: ResourceKind = ResourceKind::DaemonSet;

    fn object_meta(&self) -> ObjectMeta {
        ObjectMeta::from(&self.metadata)
    }

    fn selector(&self) -> Result<Selector, CorrelationError> {
        match self.spec.as_ref() {
            Some(spec) => Selector::try_from(&spec.selector),
            None => Err(missing_selector(Self::KIND, &self.object_meta())),
        }
    }

    /// A daemon set has no replica count; the scheduler decides how many nodes run it.
    fn desired_count(&self) -> Option<i32> {
        self.status.as_ref().map(|s| s.desired_number_scheduled)
    }
}
