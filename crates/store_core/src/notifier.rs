//! Single-event "state changed" broadcast.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, PoisonError, RwLock,
};

pub type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct ChangeNotifier {
    listeners: RwLock<Vec<Listener>>,
    fired: AtomicU64,
}

impl ChangeNotifier {
    /// Registers `listener`; it runs on every later [`notify`](Self::notify),
    /// after the listeners registered before it.
    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// Calls every listener synchronously. A panicking listener unwinds into
    /// the caller.
    pub fn notify(&self) {
        self.fired.fetch_add(1, Ordering::SeqCst);
        // Snapshot so listeners may subscribe more listeners without deadlocking.
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Total number of notifications sent so far.
    pub fn notifications(&self) -> u64 {
        self.fired.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listener_count())
            .field("notifications", &self.notifications())
            .finish()
    }
}
