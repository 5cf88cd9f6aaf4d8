//! Immutable application state, shallow patches, and the container that swaps
//! one for the other.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use shared::protocol::state_keys;

use crate::{
    error::{json_kind, StoreError, StoreResult},
    notifier::ChangeNotifier,
};

/// Snapshot of the whole application state.
///
/// Cloning is cheap; a snapshot never changes after it was taken; merges
/// produce a new value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState(Arc<Map<String, Value>>);

impl AppState {
    /// `{inventory: {bundles: [], tokens: []}}`, the state every store starts from
    /// unless told otherwise.
    pub fn initial() -> Self {
        let mut inventory = Map::new();
        inventory.insert(state_keys::BUNDLES.to_string(), Value::Array(Vec::new()));
        inventory.insert(state_keys::TOKENS.to_string(), Value::Array(Vec::new()));
        let mut map = Map::new();
        map.insert(state_keys::INVENTORY.to_string(), Value::Object(inventory));
        Self(Arc::new(map))
    }

    pub fn from_value(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(Arc::new(map))),
            other => Err(StoreError::PatchNotObject {
                found: json_kind(&other),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Decodes the value under `key`; `None` when the key is absent or null.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, serde_json::Error> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::deserialize(value).map(Some),
        }
    }

    pub fn get_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> Result<T, serde_json::Error> {
        Ok(self.get_as(key)?.unwrap_or_default())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.as_ref().clone())
    }

    /// Shallow merge: each top-level key of `patch` replaces the current value
    /// wholesale, nested objects included.
    pub fn merged(&self, patch: &Patch) -> Self {
        let mut next = self.0.as_ref().clone();
        for (key, value) in patch.iter() {
            next.insert(key.clone(), value.clone());
        }
        Self(Arc::new(next))
    }
}

/// Partial state merged shallowly into [`AppState`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch(Map<String, Value>);

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_serialized<T: Serialize + ?Sized>(
        mut self,
        key: impl Into<String>,
        value: &T,
    ) -> StoreResult<Self> {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|source| StoreError::Serialize {
            key: key.clone(),
            source,
        })?;
        self.0.insert(key, value);
        Ok(self)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl TryFrom<Value> for Patch {
    type Error = StoreError;

    fn try_from(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(StoreError::PatchNotObject {
                found: json_kind(&other),
            }),
        }
    }
}

impl From<Map<String, Value>> for Patch {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Holds the current [`AppState`] and fires the notifier once per merge.
pub struct StateContainer {
    state: RwLock<AppState>,
    notifier: ChangeNotifier,
}

impl StateContainer {
    pub fn new(initial: AppState) -> Self {
        Self {
            state: RwLock::new(initial),
            notifier: ChangeNotifier::default(),
        }
    }

    pub fn get_state(&self) -> AppState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn merge(&self, patch: &Patch) {
        self.merge_with(|_| patch.clone());
    }

    /// Builds the patch from the state it will be merged into, under the same
    /// write lock, so read-modify-write patches cannot lose a concurrent merge.
    pub fn merge_with(&self, build: impl FnOnce(&AppState) -> Patch) {
        {
            let mut current = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let patch = build(&current);
            let next = current.merged(&patch);
            *current = next;
        }
        // Lock released first: listeners read the state they were told about.
        self.notifier.notify();
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }
}
