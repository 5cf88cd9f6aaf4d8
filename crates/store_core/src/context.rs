//! Slot for long-lived external handles (wallet providers and the like) that
//! reactions set once and read on later invocations.

use std::{
    any::Any,
    sync::{Arc, PoisonError, RwLock},
};

pub type Handle = Arc<dyn Any + Send + Sync>;

/// Last write wins. Readers get whatever was stored last, which may be a
/// partially initialized handle; check its fields instead of assuming.
#[derive(Default)]
pub struct ContextBag {
    slot: RwLock<Option<Handle>>,
}

impl ContextBag {
    pub fn get(&self) -> Option<Handle> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current handle if it holds a `T`.
    pub fn get_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.get().and_then(|handle| handle.downcast::<T>().ok())
    }

    pub fn set<T: Any + Send + Sync>(&self, value: T) {
        self.set_handle(Arc::new(value));
    }

    pub fn set_handle(&self, handle: Handle) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    pub fn is_empty(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl std::fmt::Debug for ContextBag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextBag")
            .field("populated", &!self.is_empty())
            .finish()
    }
}
