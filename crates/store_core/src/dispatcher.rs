//! Action routing: registered reactions first, the built-in inventory reducer
//! second, a diagnostic for everything else.

use std::{collections::HashMap, future::Future, sync::Arc, time::Duration};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared::protocol::{core_actions, state_keys};
use tracing::warn;

use crate::{
    context::ContextBag,
    error::{StoreError, StoreResult},
    state::{AppState, Patch, StateContainer},
    Store,
};

/// Response to one action type.
///
/// The returned patch, if any and non-empty, is merged as soon as `react`
/// returns. Anything later goes through [`ReactionContext::update`] or a task
/// scheduled with [`ReactionContext::defer`] / [`ReactionContext::spawn`].
pub trait ReactionHandler: Send + Sync {
    fn react(&self, cx: ReactionContext) -> anyhow::Result<Option<Patch>>;
}

impl<F> ReactionHandler for F
where
    F: Fn(ReactionContext) -> anyhow::Result<Option<Patch>> + Send + Sync,
{
    fn react(&self, cx: ReactionContext) -> anyhow::Result<Option<Patch>> {
        self(cx)
    }
}

/// Action type to handler mapping handed to [`Store::use_reactions`].
#[derive(Clone, Default)]
pub struct Reactions {
    handlers: HashMap<String, Arc<dyn ReactionHandler>>,
}

impl Reactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, action: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ReactionContext) -> anyhow::Result<Option<Patch>> + Send + Sync + 'static,
    {
        self.insert(action, Arc::new(handler));
        self
    }

    /// Replaces any handler already registered for `action`.
    pub fn insert(&mut self, action: impl Into<String>, handler: Arc<dyn ReactionHandler>) {
        self.handlers.insert(action.into(), handler);
    }

    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn action_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub(crate) fn into_handlers(self) -> HashMap<String, Arc<dyn ReactionHandler>> {
        self.handlers
    }
}

impl std::fmt::Debug for Reactions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut actions: Vec<&str> = self.action_types().collect();
        actions.sort_unstable();
        f.debug_struct("Reactions").field("actions", &actions).finish()
    }
}

/// Owned capability handle. Clone it into deferred tasks to update state,
/// dispatch, or reach the context bag after the handler has returned.
#[derive(Clone)]
pub struct Reactor {
    store: Store,
    action: Arc<str>,
}

impl Reactor {
    pub(crate) fn new(store: Store, action: &str) -> Self {
        Self {
            store,
            action: Arc::from(action),
        }
    }

    /// Action whose handler produced this reactor.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Merges `patch` and notifies, even when the patch is empty.
    pub fn update(&self, patch: Patch) {
        self.store.merge(&patch);
    }

    pub fn dispatch(&self, action: &str, payload: Value) -> StoreResult<()> {
        self.store.dispatch(action, payload)
    }

    pub fn context(&self) -> &ContextBag {
        self.store.context()
    }

    /// Fresh read of the store, unlike [`ReactionContext::current_state`].
    pub fn state(&self) -> AppState {
        self.store.get_state()
    }

    /// Schedules `task` on the ambient tokio runtime. There is no way to cancel
    /// it; its updates land whenever it gets to them.
    pub fn spawn<F>(&self, task: F) -> StoreResult<()>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.store.spawn_deferred(&self.action, task)
    }

    /// Runs `callback` once `delay` has elapsed.
    pub fn defer<F>(&self, delay: Duration, callback: F) -> StoreResult<()>
    where
        F: FnOnce(Reactor) -> anyhow::Result<()> + Send + 'static,
    {
        let reactor = self.clone();
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            callback(reactor)
        })
    }
}

/// Everything a handler gets for one invocation.
pub struct ReactionContext {
    payload: Value,
    current_state: AppState,
    reactor: Reactor,
}

impl ReactionContext {
    pub(crate) fn new(reactor: Reactor, payload: Value, current_state: AppState) -> Self {
        Self {
            payload,
            current_state,
            reactor,
        }
    }

    pub fn action(&self) -> &str {
        self.reactor.action()
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn payload_as<T: DeserializeOwned>(&self) -> StoreResult<T> {
        T::deserialize(&self.payload).map_err(|source| StoreError::InvalidPayload {
            action: self.action().to_string(),
            source,
        })
    }

    /// State as it was when dispatch invoked this handler. Merges made since,
    /// including ones from nested dispatches, are not reflected here.
    pub fn current_state(&self) -> &AppState {
        &self.current_state
    }

    pub fn update(&self, patch: Patch) {
        self.reactor.update(patch);
    }

    pub fn dispatch(&self, action: &str, payload: Value) -> StoreResult<()> {
        self.reactor.dispatch(action, payload)
    }

    pub fn context(&self) -> &ContextBag {
        self.reactor.context()
    }

    pub fn reactor(&self) -> Reactor {
        self.reactor.clone()
    }

    pub fn spawn<F>(&self, task: F) -> StoreResult<()>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.reactor.spawn(task)
    }

    pub fn defer<F>(&self, delay: Duration, callback: F) -> StoreResult<()>
    where
        F: FnOnce(Reactor) -> anyhow::Result<()> + Send + 'static,
    {
        self.reactor.defer(delay, callback)
    }
}

/// Built-in reducer for actions nobody registered a reaction for.
///
/// Returns `false` for unknown types, which leave the state alone and do not
/// notify.
pub(crate) fn reduce_core(container: &StateContainer, action: &str, payload: Value) -> bool {
    match action {
        core_actions::UPDATE_INVENTORY_BUNDLES => {
            container.merge_with(|state| {
                replace_inventory(state, state_keys::BUNDLES, state_keys::TOKENS, payload)
            });
            true
        }
        core_actions::UPDATE_INVENTORY_TOKENS => {
            container.merge_with(|state| {
                replace_inventory(state, state_keys::TOKENS, state_keys::BUNDLES, payload)
            });
            true
        }
        core_actions::TEST => {
            container.merge(&Patch::new().with(state_keys::TEST, payload));
            true
        }
        _ => {
            warn!(action, %payload, "unknown action, no reaction registered");
            false
        }
    }
}

fn replace_inventory(state: &AppState, field: &str, sibling: &str, payload: Value) -> Patch {
    let kept = state
        .get(state_keys::INVENTORY)
        .and_then(|inventory| inventory.get(sibling))
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));

    let mut inventory = Map::new();
    inventory.insert(field.to_string(), payload);
    inventory.insert(sibling.to_string(), kept);
    Patch::new().with(state_keys::INVENTORY, Value::Object(inventory))
}
