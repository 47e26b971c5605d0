//! Cancellable subscriptions and the listener registry behind them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Handle to a live subscription.
///
/// The listener is removed when the handle is dropped or
/// [`unsubscribe`](Subscription::unsubscribe)d, whichever comes first.
#[must_use = "dropping a Subscription cancels it"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription that was never started (e.g. no signed-in user).
    pub fn inert() -> Self {
        Self { cancel: None }
    }

    /// True until cancelled. Inert subscriptions are never active.
    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    /// Stop receiving snapshots.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Snapshot callback.
pub type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

struct ListenerMap<K, T> {
    entries: HashMap<u64, (K, Callback<T>)>,
    next_id: u64,
}

/// Registry of keyed listeners.
///
/// Callers snapshot the matching callbacks and invoke them after the lock is
/// released, so a callback may subscribe or unsubscribe re-entrantly.
pub(crate) struct Listeners<K, T> {
    inner: Arc<Mutex<ListenerMap<K, T>>>,
}

impl<K, T> Listeners<K, T>
where
    K: Clone + Send + Sync + 'static,
    T: 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ListenerMap {
                entries: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    fn lock(inner: &Mutex<ListenerMap<K, T>>) -> MutexGuard<'_, ListenerMap<K, T>> {
        inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `callback` under `key`.
    pub fn add(&self, key: K, callback: Callback<T>) -> Subscription {
        let id = {
            let mut map = Self::lock(&self.inner);
            let id = map.next_id;
            map.next_id = map.next_id.wrapping_add(1);
            map.entries.insert(id, (key, callback));
            id
        };
        log::debug!("listener {} subscribed", id);

        let weak: Weak<Mutex<ListenerMap<K, T>>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                Self::lock(&inner).entries.remove(&id);
                log::debug!("listener {} unsubscribed", id);
            }
        })
    }

    /// Listeners whose key satisfies `pred`.
    pub fn matching(&self, pred: impl Fn(&K) -> bool) -> Vec<(K, Callback<T>)> {
        let map = Self::lock(&self.inner);
        let mut found: Vec<(u64, K, Callback<T>)> = map
            .entries
            .iter()
            .filter(|(_, (key, _))| pred(key))
            .map(|(id, (key, cb))| (*id, key.clone(), Arc::clone(cb)))
            .collect();
        found.sort_by_key(|(id, _, _)| *id);
        found.into_iter().map(|(_, key, cb)| (key, cb)).collect()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        Self::lock(&self.inner).entries.len()
    }
}
