use std::{future::Future, sync::Arc};

use futures::future::join_all;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use crate::{error::FetchError, fetch::ResourceKind};

/// An immutable snapshot of one kind, shared by reference between consumers.
pub type Collection<T> = Arc<Vec<T>>;

type Delivery<T> = Result<Collection<T>, FetchError>;

/// Single-use read handle on one broadcast.
///
/// `recv` consumes the slot, so each slot is read at most once.
#[derive(Debug)]
pub struct Slot<T> {
    kind: ResourceKind,
    rx: oneshot::Receiver<Delivery<T>>,
}

impl<T> Slot<T> {
    /// A slot whose value is already known.
    pub fn ready(kind: ResourceKind, items: Vec<T>) -> Self {
        Self::filled(kind, Ok(Arc::new(items)))
    }

    /// A slot that will report `err`.
    pub fn failed(kind: ResourceKind, err: FetchError) -> Self {
        Self::filled(kind, Err(err))
    }

    fn filled(kind: ResourceKind, delivery: Delivery<T>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(delivery);
        Self { kind, rx }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Wait for the worker's result.
    pub async fn recv(self) -> Result<Collection<T>, FetchError> {
        let kind = self.kind;
        self.rx
            .await
            .unwrap_or(Err(FetchError::Abandoned { kind }))
    }
}

/// Spawns fetch workers that stop early on shutdown.
#[derive(Clone, Debug, Default)]
pub struct Broadcaster {
    shutdown: CancellationToken,
}

impl Broadcaster {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self { shutdown }
    }

    /// Run `fetch` exactly once and hand its result to `N` slots.
    ///
    /// The worker never waits on a consumer. When every slot has been
    /// dropped, or on shutdown, it stops polling `fetch` and exits.
    pub fn broadcast<T, F, const N: usize>(&self, kind: ResourceKind, fetch: F) -> [Slot<T>; N]
    where
        T: Send + Sync + 'static,
        F: Future<Output = Result<Vec<T>, FetchError>> + Send + 'static,
    {
        if self.shutdown.is_cancelled() {
            debug!(%kind, "shut down, not fetching");
            return std::array::from_fn(|_| Slot::failed(kind, FetchError::Abandoned { kind }));
        }

        let mut senders = Vec::with_capacity(N);
        let slots = std::array::from_fn(|_| {
            let (tx, rx) = oneshot::channel();
            senders.push(tx);
            Slot { kind, rx }
        });

        let shutdown = self.shutdown.clone();
        let span = tracing::debug_span!("broadcast", %kind, consumers = N);

        tokio::spawn(
            async move {
                let delivery: Delivery<T> = tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        debug!("shutting down, dropping fetch");
                        return;
                    }
                    _ = all_closed(&mut senders) => {
                        debug!("every consumer went away, dropping fetch");
                        return;
                    }
                    res = fetch => res.map(Arc::new),
                };

                for tx in senders {
                    // A dropped slot is an abandoned consumer, not an error.
                    let _ = tx.send(delivery.clone());
                }
            }
            .instrument(span),
        );

        slots
    }
}

/// Shorthand for [`Broadcaster::broadcast`] without a shutdown signal.
pub fn broadcast<T, F, const N: usize>(kind: ResourceKind, fetch: F) -> [Slot<T>; N]
where
    T: Send + Sync + 'static,
    F: Future<Output = Result<Vec<T>, FetchError>> + Send + 'static,
{
    Broadcaster::default().broadcast(kind, fetch)
}

async fn all_closed<T>(senders: &mut [oneshot::Sender<T>]) {
    join_all(senders.iter_mut().map(|tx| tx.closed())).await;
}
