use k8s_openapi::api::batch::v1::Job;

use super::{missing_selector, Subject};
use crate::{
    error::CorrelationError, fetch::ResourceKind, selector::Selector, view::ObjectMeta,
};

impl Subject for Job {
    const KIND: ResourceKind = ResourceKind::Job;

    fn object_meta(&self) -> ObjectMeta {
        ObjectMeta::from(&self.metadata)
    }

    // The selector is optional on a job until the controller defaults it.
    fn selector(&self) -> Result<Selector, CorrelationError> {
        match self.spec.as_ref().and_then(|s| s.selector.as_ref()) {
            Some(selector) => Selector::try_from(selector),
            None => Err(missing_selector(Self::KIND, &self.object_meta())),
        }
    }

    fn desired_count(&self) -> Option<i32> {
        self.spec.as_ref().and_then(|s| s.completions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::job;

    #[test]
    fn desired_is_completions() {
        assert_eq!(job("pi", "batch", &[("job-name", "pi")], Some(5)).desired_count(), Some(5));
    }

    #[test]
    fn undefaulted_selector_is_reported() {
        let mut j = job("pi", "batch", &[("job-name", "pi")], Some(1));
        if let Some(spec) = j.spec.as_mut() {
            spec.selector = None;
        }
        let err = j.selector().unwrap_err();
        assert_eq!(
            err,
            CorrelationError::MissingSelector {
                kind: ResourceKind::Job,
                namespace: "batch".into(),
                name: "pi".into(),
            }
        );
    }
}
