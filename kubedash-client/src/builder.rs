use k8s_openapi::api::core::v1::{Event, Pod};
use rayon::prelude::*;
use tracing::{debug, Span};

use crate::{
    channels::ResourceChannels,
    correlate::correlate,
    dataselect::DataSelectQuery,
    error::FetchError,
    subjects::Subject,
    view::{Cumulative, ListMeta, SubjectList, SubjectView, TypeMeta},
};

/// Drain `channels` in order and build the correlated list.
///
/// A subject kind the cluster does not serve yields an empty list. Any other
/// failure, on the subject or a secondary kind, fails the list.
#[tracing::instrument(skip_all, fields(kind = %S::KIND))]
pub async fn build_list_from_channels<S: Subject>(
    channels: ResourceChannels<S>,
    query: &DataSelectQuery,
) -> Result<SubjectList, FetchError> {
    let ResourceChannels {
        subject,
        nodes,
        services,
        pods,
        events,
    } = channels;

    let items = match subject.recv().await {
        Ok(items) => items,
        Err(err) if err.is_unsupported() => {
            debug!(%err, "subject kind not served, returning empty list");
            return Ok(SubjectList::empty());
        }
        Err(err) => return Err(err),
    };

    if let Some(nodes) = nodes {
        let nodes = nodes.recv().await?;
        debug!(count = nodes.len(), "nodes");
    }
    if let Some(services) = services {
        let services = services.recv().await?;
        debug!(count = services.len(), "services");
    }
    let pods = pods.recv().await?;
    let events = events.recv().await?;

    // Correlation runs on the blocking pool, not a runtime worker.
    let query = query.clone();
    let span = Span::current();
    tokio::task::spawn_blocking(move || {
        span.in_scope(|| create_subject_list(&items, &pods, &events, &query))
    })
    .await
    .map_err(|err| {
        debug!(%err, "correlation task failed");
        FetchError::Abandoned { kind: S::KIND }
    })
}

/// Correlate already fetched collections and apply `query`.
pub fn create_subject_list<S: Subject>(
    items: &[S],
    pods: &[Pod],
    events: &[Event],
    query: &DataSelectQuery,
) -> SubjectList {
    let views: Vec<SubjectView> = items
        .par_iter()
        .map(|item| {
            let object_meta = item.object_meta();
            let pods = correlate(item, &object_meta, pods, events);
            SubjectView {
                object_meta,
                type_meta: TypeMeta { kind: S::KIND },
                pods,
            }
        })
        .collect();

    let cumulative = views
        .iter()
        .fold(Cumulative::default(), |acc, view| acc.add(&view.pods));
    let (items, total_items) = query.apply(views);

    SubjectList {
        list_meta: ListMeta { total_items },
        items,
        cumulative,
    }
}
