use k8s_openapi::api::apps::v1::StatefulSet;

use super::{missing_selector, Subject};
use crate::{
    error::CorrelationError, fetch::ResourceKind, selector::Selector, view::ObjectMeta,
};

impl Subject for StatefulSet {
    const KIND: ResourceKind = ResourceKind::StatefulSet;

    fn object_meta(&self) -> ObjectMeta {
        ObjectMeta::from(&self.metadata)
    }

    fn selector(&self) -> Result<Selector, CorrelationError> {
        match self.spec.as_ref() {
            Some(spec) => Selector::try_from(&spec.selector),
            None => Err(missing_selector(Self::KIND, &self.object_meta())),
        }
    }

    fn desired_count(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.replicas)
    }
}
