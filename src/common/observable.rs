//! Push-based observable cells
//!
//! An [`Observable`] holds a value and a list of subscribers. Subscribers are
//! called synchronously with the current value when they subscribe and after
//! every mutation. Cloning an `Observable` yields another handle to the same
//! cell.
//!
//! Writes are serialized together with their delivery, so subscribers see
//! values in the order they were written. A callback may read the cell it
//! observes but must not write to it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscribers<T> {
    next_id: u64,
    callbacks: Vec<(u64, Callback<T>)>,
}

struct Inner<T> {
    value: RwLock<T>,
    subscribers: Mutex<Subscribers<T>>,
    /// Held across a mutation and its delivery
    writer: Mutex<()>,
}

/// A shared value that notifies its subscribers on change
pub struct Observable<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = self.inner.value.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Observable").field("value", &*value).finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    /// Create a new observable holding `value`
    pub fn new(value: T) -> Self {
        Observable {
            inner: Arc::new(Inner {
                value: RwLock::new(value),
                subscribers: Mutex::new(Subscribers {
                    next_id: 0,
                    callbacks: Vec::new(),
                }),
                writer: Mutex::new(()),
            }),
        }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.inner
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the value and notify subscribers
    pub fn set(&self, value: T) {
        let _writer = self.write_lock();
        {
            let mut guard = self.inner.value.write().unwrap_or_else(PoisonError::into_inner);
            *guard = value;
        }
        self.deliver();
    }

    /// Mutate the value in place and notify subscribers
    pub fn update<F: FnOnce(&mut T)>(&self, f: F) {
        let _writer = self.write_lock();
        {
            let mut guard = self.inner.value.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard);
        }
        self.deliver();
    }

    /// Mutate the value under the write lock; subscribers are notified only
    /// when `f` succeeds
    pub fn try_update<E, F>(&self, f: F) -> std::result::Result<(), E>
    where
        F: FnOnce(&mut T) -> std::result::Result<(), E>,
    {
        let _writer = self.write_lock();
        {
            let mut guard = self.inner.value.write().unwrap_or_else(PoisonError::into_inner);
            f(&mut guard)?;
        }
        self.deliver();
        Ok(())
    }

    /// Register `callback`; it runs immediately with the current value
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let callback: Callback<T> = Arc::new(callback);
        let writer = self.write_lock();
        let id = {
            let mut subs = self
                .inner
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let id = subs.next_id;
            subs.next_id += 1;
            subs.callbacks.push((id, Arc::clone(&callback)));
            id
        };

        callback(&self.get());
        drop(writer);

        let weak: Weak<Inner<T>> = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut subs = inner
                    .subscribers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                subs.callbacks.retain(|(sub_id, _)| *sub_id != id);
            }
        })
    }

    /// Push the current value to every subscriber
    pub fn notify(&self) {
        let _writer = self.write_lock();
        self.deliver();
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.inner
            .writer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Caller holds the writer lock; value and subscriber locks are released
    /// before callbacks run
    fn deliver(&self) {
        let value = self.get();
        let callbacks: Vec<Callback<T>> = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(&value);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .callbacks
            .len()
    }
}

/// Cleanup handle returned by [`Observable::subscribe`]
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to end it.
pub struct Subscription {
    cleanup: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Wrap a cleanup action
    pub fn new<F: FnOnce() + Send + Sync + 'static>(cleanup: F) -> Self {
        Subscription {
            cleanup: Some(Box::new(cleanup)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }

    /// One handle that ends every subscription in `subscriptions`
    pub fn all(subscriptions: Vec<Subscription>) -> Self {
        Subscription::new(move || {
            for subscription in subscriptions {
                subscription.unsubscribe();
            }
        })
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cleanup.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_subscribe_receives_current_value_then_updates() {
        let cell = Observable::new(1);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = cell.subscribe(move |v| seen_clone.lock().unwrap().push(*v));

        cell.set(2);
        cell.update(|v| *v += 10);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 12]);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let cell = Observable::new(0);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let sub = cell.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(cell.subscriber_count(), 1);

        sub.unsubscribe();
        cell.set(5);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn test_callback_may_read_the_cell() {
        let cell = Observable::new(String::from("a"));
        let reader = cell.clone();
        let seen = Arc::new(Mutex::new(String::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = cell.subscribe(move |_| *seen_clone.lock().unwrap() = reader.get());

        cell.set(String::from("b"));
        assert_eq!(*seen.lock().unwrap(), "b");
    }

    #[test]
    fn test_concurrent_writers_deliver_in_write_order() {
        let cell = Observable::new(0u64);
        let last_seen = Arc::new(Mutex::new(0u64));
        let last_clone = Arc::clone(&last_seen);
        let _sub = cell.subscribe(move |v| *last_clone.lock().unwrap() = *v);

        let writers: Vec<_> = (0..8u64)
            .map(|w| {
                let cell = cell.clone();
                std::thread::spawn(move || {
                    for i in 0..200u64 {
                        cell.set(w * 1000 + i);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        assert_eq!(*last_seen.lock().unwrap(), cell.get());
    }

    #[test]
    fn test_concurrent_updates_are_all_delivered() {
        let cell = Observable::new(0u64);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let _sub = cell.subscribe(move |v| seen_clone.lock().unwrap().push(*v));

        let writers: Vec<_> = (0..4)
            .map(|_| {
                let cell = cell.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        cell.update(|v| *v += 1);
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, (0..=400).collect::<Vec<u64>>());
    }
}
