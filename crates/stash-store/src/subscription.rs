//! Per-key observer lists.
//!
//! A [`Subscriber`] is a shared callback. Its identity is the `Arc`
//! allocation: cloning the handle keeps the identity, so the handle passed
//! to [`SubscriptionRegistry::subscribe`] (or any clone of it) is what
//! [`SubscriptionRegistry::unsubscribe`] must be given.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};

/// Callback invoked with the current value of a key (`None` if absent).
pub type Subscriber<T> = Arc<dyn Fn(Option<&T>) + Send + Sync>;

/// Wrap a closure as a [`Subscriber`].
pub fn subscriber<T, F>(f: F) -> Subscriber<T>
where
    F: Fn(Option<&T>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Mapping from key to an ordered list of subscribers.
pub struct SubscriptionRegistry<T> {
    subscribers: HashMap<String, Vec<Subscriber<T>>>,
}

impl<T> SubscriptionRegistry<T> {
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }

    /// Append a subscriber to the key's list, creating the list if absent.
    pub fn subscribe(&mut self, key: &str, callback: Subscriber<T>) {
        self.subscribers
            .entry(key.to_string())
            .or_default()
            .push(callback);
    }

    /// Remove the first entry identical to `callback`.
    ///
    /// Fails with [`StoreError::SubscriptionNotFound`] if the key has no
    /// list and [`StoreError::SubscriberNotRegistered`] if no entry in it
    /// is the same allocation.
    pub fn unsubscribe(&mut self, key: &str, callback: &Subscriber<T>) -> StoreResult<()> {
        let list = self
            .subscribers
            .get_mut(key)
            .ok_or_else(|| StoreError::SubscriptionNotFound {
                key: key.to_string(),
            })?;
        let index = list
            .iter()
            .position(|cb| Arc::ptr_eq(cb, callback))
            .ok_or_else(|| StoreError::SubscriberNotRegistered {
                key: key.to_string(),
            })?;
        list.remove(index);
        Ok(())
    }

    /// Invoke every subscriber for `key` in registration order.
    ///
    /// A panicking callback unwinds through here; the remaining callbacks
    /// are not invoked.
    pub fn notify(&self, key: &str, value: Option<&T>) -> usize {
        match self.subscribers.get(key) {
            Some(list) => {
                for callback in list {
                    callback(value);
                }
                list.len()
            }
            None => 0,
        }
    }

    /// Number of subscribers registered under `key`.
    pub fn count(&self, key: &str) -> usize {
        self.subscribers.get(key).map_or(0, Vec::len)
    }
}

impl<T> Default for SubscriptionRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SubscriptionRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total: usize = self.subscribers.values().map(Vec::len).sum();
        f.debug_struct("SubscriptionRegistry")
            .field("keys", &self.subscribers.len())
            .field("subscribers", &total)
            .finish()
    }
}
