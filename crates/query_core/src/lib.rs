use std::sync::{Arc, Weak};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{watch, Mutex};

pub mod error;
pub mod state;

pub use error::QueryError;
pub use state::{QueryPatch, QueryPhase, QueryState};

/// Opaque request capability: the controller never inspects transport
/// details beyond this signature.
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn request(
        &self,
        query: &str,
        variables: &Map<String, Value>,
    ) -> Result<Value, QueryError>;
}

/// Stand-in used before a real client is attached (e.g. pre-login).
pub struct MissingQueryClient;

#[async_trait]
impl QueryClient for MissingQueryClient {
    async fn request(
        &self,
        _query: &str,
        _variables: &Map<String, Value>,
    ) -> Result<Value, QueryError> {
        Err(QueryError::Unavailable)
    }
}

/// One unit of query work: the document plus its variables. Compared
/// structurally across evaluations, never by allocation identity, because
/// callers routinely rebuild an identical variables map on every pass.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub query: String,
    pub variables: Map<String, Value>,
}

impl QueryDescriptor {
    pub fn new(query: impl Into<String>, variables: Map<String, Value>) -> Self {
        Self {
            query: query.into(),
            variables,
        }
    }

    pub fn without_variables(query: impl Into<String>) -> Self {
        Self::new(query, Map::new())
    }
}

/// Maps the raw response payload into the shape the consumer renders.
pub trait Normalize: Send + Sync {
    type Output: Clone + Send + Sync + 'static;

    fn normalize(&self, raw: Value) -> Result<Self::Output, QueryError>;
}

/// Default passthrough normalizer.
pub struct IdentityNormalize;

impl Normalize for IdentityNormalize {
    type Output = Value;

    fn normalize(&self, raw: Value) -> Result<Value, QueryError> {
        Ok(raw)
    }
}

struct FetchInputs {
    descriptor: QueryDescriptor,
    client: Weak<dyn QueryClient>,
}

/// A fetch is required when no previous inputs exist, when the descriptor
/// trees differ structurally, or when the client instance was swapped.
fn fetch_inputs_changed(previous: Option<&FetchInputs>, current: &FetchInputs) -> bool {
    match previous {
        None => true,
        Some(previous) => {
            previous.descriptor != current.descriptor
                || !Weak::ptr_eq(&previous.client, &current.client)
        }
    }
}

struct ControllerInner<T> {
    alive: bool,
    state: QueryState<T>,
}

/// Drives the request/response cycle for one consumer.
///
/// `evaluate` starts a fetch only when the descriptor or client changed
/// since the previous evaluation; results settling after `teardown` are
/// discarded without touching state. In-flight requests are never aborted
/// and overlapping requests are not deduplicated against each other: when
/// the inputs change while a request is still pending, whichever request
/// settles last determines the final visible state, even if it is not the
/// most recently issued one. Known limitation, kept as-is.
pub struct QueryController<N: Normalize> {
    normalize: Arc<N>,
    previous: Option<FetchInputs>,
    inner: Arc<Mutex<ControllerInner<N::Output>>>,
    updates: Arc<watch::Sender<QueryState<N::Output>>>,
}

impl<N: Normalize + 'static> QueryController<N> {
    pub fn new(normalize: N) -> Self {
        let (updates, _) = watch::channel(QueryState::default());
        Self {
            normalize: Arc::new(normalize),
            previous: None,
            inner: Arc::new(Mutex::new(ControllerInner {
                alive: true,
                state: QueryState::default(),
            })),
            updates: Arc::new(updates),
        }
    }

    /// Snapshot of the current merged state.
    pub async fn state(&self) -> QueryState<N::Output> {
        self.inner.lock().await.state.clone()
    }

    /// Receiver observing every state change, starting from the current
    /// value. Rendering stays with the caller; the controller only produces
    /// state.
    pub fn subscribe(&self) -> watch::Receiver<QueryState<N::Output>> {
        self.updates.subscribe()
    }

    /// Decides fetch-or-skip for the supplied inputs and returns the state
    /// visible after that decision. When a fetch starts, `fetching` is set
    /// before this call returns; the settlement is applied later by a
    /// spawned continuation, guarded by the lifecycle flag.
    pub async fn evaluate(
        &mut self,
        descriptor: QueryDescriptor,
        client: &Arc<dyn QueryClient>,
    ) -> QueryState<N::Output> {
        let current = FetchInputs {
            descriptor,
            client: Arc::downgrade(client),
        };

        {
            let guard = self.inner.lock().await;
            if !guard.alive || !fetch_inputs_changed(self.previous.as_ref(), &current) {
                return guard.state.clone();
            }
        }

        let descriptor = current.descriptor.clone();
        // The slot is written only after the comparison above; recording it
        // first would make every comparison read "unchanged".
        self.previous = Some(current);

        let snapshot = {
            let mut guard = self.inner.lock().await;
            guard.state = guard.state.merge(QueryPatch::fetch_started());
            self.updates.send_replace(guard.state.clone());
            guard.state.clone()
        };

        let client = Arc::clone(client);
        let normalize = Arc::clone(&self.normalize);
        let inner = Arc::clone(&self.inner);
        let updates = Arc::clone(&self.updates);
        tokio::spawn(async move {
            let outcome = client
                .request(&descriptor.query, &descriptor.variables)
                .await
                .and_then(|raw| normalize.normalize(raw));
            let patch = match outcome {
                Ok(data) => QueryPatch::resolved(data),
                Err(error) => QueryPatch::rejected(error),
            };

            let mut guard = inner.lock().await;
            if !guard.alive {
                // Settled after teardown: discard silently.
                return;
            }
            guard.state = guard.state.merge(patch);
            updates.send_replace(guard.state.clone());
        });

        snapshot
    }

    /// Detaches the consumer. Anything settling afterwards is discarded;
    /// calling this again is a no-op.
    pub async fn teardown(&self) {
        self.inner.lock().await.alive = false;
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
