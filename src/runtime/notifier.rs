use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

type Callback = Arc<dyn Fn() + Send + Sync>;

/// Identifier of a registered subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

/// Registry of change subscribers.
///
/// Subscribers carry no payload: a notification only says that something
/// changed, and subscribers pull whatever they need from the store.
pub(crate) struct Notifier {
    subscribers: Mutex<BTreeMap<SubscriberId, Callback>>,
    next_id: AtomicU64,
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a callback. It stays registered until the returned guard is
    /// dropped or explicitly unsubscribed.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscribers.lock().insert(id, Arc::new(callback));
        trace!(subscriber = id.0, "subscribed");

        Subscription {
            id,
            notifier: Arc::downgrade(self),
        }
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        // Drop the callback after releasing the lock; it may own handles
        // whose destructors reach back into the store.
        let removed = self.subscribers.lock().remove(&id);
        if removed.is_some() {
            trace!(subscriber = id.0, "unsubscribed");
        }
    }

    /// Invoke every subscriber registered when the call started.
    ///
    /// The subscriber set is copied before the first callback runs, so
    /// callbacks are free to subscribe, unsubscribe, read or mutate.
    pub fn notify(&self) -> usize {
        let callbacks: Vec<Callback> = self.subscribers.lock().values().cloned().collect();
        trace!(subscribers = callbacks.len(), "notifying");

        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

/// RAII guard for a store subscription.
///
/// Dropping the guard unsubscribes the callback.
#[must_use = "dropping a Subscription unsubscribes it immediately"]
pub struct Subscription {
    id: SubscriberId,
    notifier: Weak<Notifier>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Stop receiving notifications.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(notifier) = self.notifier.upgrade() {
            notifier.unsubscribe(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn notify_reaches_every_subscriber() {
        let notifier = Arc::new(Notifier::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let c1 = calls.clone();
        let _a = notifier.subscribe(move || {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = calls.clone();
        let _b = notifier.subscribe(move || {
            c2.fetch_add(10, Ordering::SeqCst);
        });

        assert_eq!(notifier.notify(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn dropping_guard_unsubscribes() {
        let notifier = Arc::new(Notifier::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let sub = notifier.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });

        notifier.notify();
        sub.unsubscribe();
        notifier.notify();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(), 0);
    }

    #[test]
    fn subscribers_added_during_notify_wait_for_next_pass() {
        let notifier = Arc::new(Notifier::new());
        let late_calls = Arc::new(AtomicUsize::new(0));
        let late_guards = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&notifier);
        let late = late_calls.clone();
        let guards = late_guards.clone();
        let _first = notifier.subscribe(move || {
            if let Some(notifier) = weak.upgrade() {
                let late = late.clone();
                guards.lock().push(notifier.subscribe(move || {
                    late.fetch_add(1, Ordering::SeqCst);
                }));
            }
        });

        notifier.notify();
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);

        notifier.notify();
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_during_notify_does_not_skip() {
        let notifier = Arc::new(Notifier::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = victim.clone();
        let _killer = notifier.subscribe(move || {
            slot.lock().take();
        });
        let c = calls.clone();
        *victim.lock() = Some(notifier.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        notifier.notify();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        notifier.notify();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
