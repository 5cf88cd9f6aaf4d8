//! State runtime for the bundle dashboard: an immutable state container, a
//! change notifier, a context bag for external handles, and a reaction
//! dispatcher that routes named actions to handlers.

use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, PoisonError, RwLock},
};

use futures::FutureExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error};

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod notifier;
pub mod state;

pub use context::{ContextBag, Handle};
pub use dispatcher::{ReactionContext, ReactionHandler, Reactions, Reactor};
pub use error::{StoreError, StoreResult};
pub use notifier::ChangeNotifier;
pub use state::{AppState, Patch, StateContainer};

/// Cloneable handle to one store instance. Clones share state, context,
/// reactions and subscribers.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    container: StateContainer,
    context: ContextBag,
    reactions: RwLock<HashMap<String, Arc<dyn ReactionHandler>>>,
    deferred: Mutex<DeferredTasks>,
}

#[derive(Default)]
struct DeferredTasks {
    running: Vec<DeferredTask>,
    failures: Vec<StoreError>,
}

struct DeferredTask {
    action: String,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::initial())
    }
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                container: StateContainer::new(initial),
                context: ContextBag::default(),
                reactions: RwLock::new(HashMap::new()),
                deferred: Mutex::new(DeferredTasks::default()),
            }),
        }
    }

    /// Registers every handler in `reactions`, replacing earlier handlers for
    /// the same action types.
    pub fn use_reactions(&self, reactions: Reactions) {
        let mut registered = self
            .inner
            .reactions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let added = reactions.len();
        registered.extend(reactions.into_handlers());
        debug!(added, total = registered.len(), "registered reactions");
    }

    pub fn get_state(&self) -> AppState {
        self.inner.container.get_state()
    }

    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.inner.container.notifier().subscribe(listener);
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        self.inner.container.notifier()
    }

    pub fn context(&self) -> &ContextBag {
        &self.inner.context
    }

    /// Routes `action` to its reaction, or to the built-in reducer when none is
    /// registered.
    ///
    /// The handler runs on the caller's stack; a dispatch made from inside it
    /// completes, merges included, before the outer handler continues. An
    /// error from the handler is returned as is and nothing it returned gets
    /// merged.
    pub fn dispatch(&self, action: &str, payload: Value) -> StoreResult<()> {
        let handler = self
            .inner
            .reactions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(action)
            .cloned();

        let Some(handler) = handler else {
            dispatcher::reduce_core(&self.inner.container, action, payload);
            return Ok(());
        };

        debug!(action, "dispatching to reaction");
        let cx = ReactionContext::new(
            Reactor::new(self.clone(), action),
            payload,
            self.get_state(),
        );
        let patch = handler
            .react(cx)
            .map_err(|source| StoreError::Reaction {
                action: action.to_string(),
                source,
            })?;

        if let Some(patch) = patch.filter(|patch| !patch.is_empty()) {
            self.merge(&patch);
        }
        Ok(())
    }

    pub(crate) fn merge(&self, patch: &Patch) {
        self.inner.container.merge(patch);
    }

    pub(crate) fn spawn_deferred<F>(&self, action: &str, task: F) -> StoreResult<()>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| StoreError::NoRuntime {
                action: action.to_string(),
            })?;

        let task_action = action.to_string();
        let handle = runtime.spawn(async move {
            let outcome = task.await;
            if let Err(err) = &outcome {
                error!(action = %task_action, error = %err, "deferred reaction task failed");
            }
            outcome
        });

        let mut deferred = self
            .inner
            .deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        deferred.reap_finished();
        deferred.running.push(DeferredTask {
            action: action.to_string(),
            handle,
        });
        Ok(())
    }

    /// Number of deferred tasks not yet known to have finished.
    pub fn pending_tasks(&self) -> usize {
        self.inner
            .deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .running
            .iter()
            .filter(|task| !task.handle.is_finished())
            .count()
    }

    /// Waits until no deferred task is left, including tasks scheduled while
    /// waiting, and reports the first failure recorded since the last call.
    pub async fn settle(&self) -> StoreResult<()> {
        loop {
            let batch = {
                let mut deferred = self
                    .inner
                    .deferred
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                std::mem::take(&mut deferred.running)
            };
            if batch.is_empty() {
                break;
            }
            for task in batch {
                let outcome = task.handle.await;
                if let Some(failure) = task_failure(task.action, outcome) {
                    self.inner
                        .deferred
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .failures
                        .push(failure);
                }
            }
        }

        let mut deferred = self
            .inner
            .deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut failures = std::mem::take(&mut deferred.failures).into_iter();
        match failures.next() {
            Some(first) => Err(first),
            None => Ok(()),
        }
    }
}

impl DeferredTasks {
    fn reap_finished(&mut self) {
        let mut still_running = Vec::with_capacity(self.running.len());
        for mut task in self.running.drain(..) {
            match (&mut task.handle).now_or_never() {
                Some(outcome) => {
                    if let Some(failure) = task_failure(task.action, outcome) {
                        self.failures.push(failure);
                    }
                }
                None => still_running.push(task),
            }
        }
        self.running = still_running;
    }
}

fn task_failure(
    action: String,
    outcome: Result<anyhow::Result<()>, tokio::task::JoinError>,
) -> Option<StoreError> {
    match outcome {
        Ok(Ok(())) => None,
        Ok(Err(source)) => Some(StoreError::Deferred { action, source }),
        Err(join_err) => {
            error!(action = %action, error = %join_err, "deferred reaction task panicked");
            Some(StoreError::TaskPanicked { action })
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.get_state())
            .field("context", self.context())
            .field("pending_tasks", &self.pending_tasks())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
