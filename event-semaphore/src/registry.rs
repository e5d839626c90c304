//! A table of outstanding waits, keyed by event.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt::{self, Debug};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{Error, ErrorKind, Result};
use crate::key::EventKey;
use crate::outcome::Outcome;
use crate::pending::{Completer, PendingWait, pending};
use crate::util::{drop_guard, lock};

/// How long a wait lasts when the caller does not pick a timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

type Filter<T> = Box<dyn Fn(&T) -> bool + Send>;

struct Registration<T> {
    id: u64,
    completer: Completer<T>,
    filter: Option<Filter<T>>,
}

struct Shared<T, K> {
    table: Mutex<HashMap<K, Registration<T>>>,
    next_id: AtomicU64,
    default_timeout: Duration,
}

impl<T, K: Eq + Hash + Debug> Shared<T, K> {
    fn deregister(&self, key: &K, id: u64) {
        let removed = {
            let mut table = lock(&self.table);
            match table.get(key) {
                Some(registration) if registration.id == id => table.remove(key),
                _ => None,
            }
        };
        if removed.is_some() {
            trace!(?key, id, "wait deregistered");
        }
    }
}

/// Lets one thread block until another thread resolves or rejects a named event.
///
/// At most one wait per key is outstanding at a time; a second
/// [`register`](Self::register) for a key that is still being waited on fails
/// with [`ErrorKind::DuplicateRegistration`]. Resolving or rejecting a key that
/// nobody is waiting for does nothing.
///
/// The table lock is only held while an entry is inserted, looked up, or
/// removed, never while a caller is blocked. Producers complete the wait after
/// releasing it.
///
/// `EventRegistry` is a cheap handle: clones share the same table. When the
/// last handle is dropped, outstanding waits fail with [`ErrorKind::Canceled`].
pub struct EventRegistry<T, K = EventKey> {
    shared: Arc<Shared<T, K>>,
}

impl<T, K> Clone for EventRegistry<T, K> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, K> Default for EventRegistry<T, K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> Debug for EventRegistry<T, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("default_timeout", &self.shared.default_timeout)
            .field("waiting", &self.len())
            .finish()
    }
}

impl<T, K> EventRegistry<T, K> {
    /// Creates an empty registry using [`DEFAULT_TIMEOUT`].
    pub fn new() -> Self {
        Self::with_default_timeout(DEFAULT_TIMEOUT)
    }

    /// Creates an empty registry whose `wait_for*` calls time out after `timeout`.
    pub fn with_default_timeout(timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                table: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                default_timeout: timeout,
            }),
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.shared.default_timeout
    }

    /// The number of outstanding waits.
    pub fn len(&self) -> usize {
        lock(&self.shared.table).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fails every outstanding wait with [`ErrorKind::Canceled`].
    ///
    /// Returns the number of waits that were canceled.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = lock(&self.shared.table).drain().collect();
        let count = drained.len();
        for (_, registration) in drained {
            registration.completer.reject(ErrorKind::Canceled.into());
        }
        if count > 0 {
            debug!(count, "canceled outstanding waits");
        }
        count
    }
}

impl<T, K> EventRegistry<T, K>
where
    T: Send + 'static,
    K: Eq + Hash + Clone + Debug + Send + 'static,
{
    /// Registers a wait for `key` without blocking.
    ///
    /// The entry is visible to [`resolve`](Self::resolve) as soon as this returns.
    pub fn register(&self, key: impl Into<K>) -> Result<PendingWait<T>> {
        self.insert(key.into(), None)
    }

    /// Registers a wait for `key` that only accepts values matching `predicate`.
    ///
    /// Resolutions with a value that does not match are ignored and the wait
    /// stays registered. Rejections are always delivered. `predicate` runs with
    /// the table locked and must not call back into this registry.
    pub fn register_matching(
        &self,
        key: impl Into<K>,
        predicate: impl Fn(&T) -> bool + Send + 'static,
    ) -> Result<PendingWait<T>> {
        self.insert(key.into(), Some(Box::new(predicate)))
    }

    fn insert(&self, key: K, filter: Option<Filter<T>>) -> Result<PendingWait<T>> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (completer, wait) = pending();

        match lock(&self.shared.table).entry(key.clone()) {
            Entry::Occupied(_) => {
                debug!(?key, "wait already outstanding for event");
                return Err(ErrorKind::DuplicateRegistration.into());
            }
            Entry::Vacant(slot) => {
                slot.insert(Registration {
                    id,
                    completer,
                    filter,
                });
            }
        }
        trace!(?key, id, "wait registered");

        let shared = Arc::downgrade(&self.shared);
        Ok(wait.with_deregister(drop_guard(move || {
            if let Some(shared) = shared.upgrade() {
                shared.deregister(&key, id);
            }
        })))
    }

    /// Blocks until `key` is resolved or rejected, or the default timeout elapses.
    pub fn wait_for(&self, key: impl Into<K>) -> Outcome<T> {
        self.wait_for_timeout(key, self.default_timeout(), || ())
    }

    /// Registers a wait for `key`, runs `action`, then blocks until the event
    /// completes or the default timeout elapses.
    ///
    /// `action` runs after the wait is registered, so an event it triggers is
    /// never missed, even one resolved synchronously from inside `action`.
    pub fn wait_for_with(&self, key: impl Into<K>, action: impl FnOnce()) -> Outcome<T> {
        self.wait_for_timeout(key, self.default_timeout(), action)
    }

    /// Like [`wait_for_with`](Self::wait_for_with), with an explicit timeout.
    pub fn wait_for_timeout(
        &self,
        key: impl Into<K>,
        timeout: Duration,
        action: impl FnOnce(),
    ) -> Outcome<T> {
        match self.register(key) {
            Ok(wait) => {
                action();
                wait.wait(timeout)
            }
            Err(error) => Outcome::Failure(error),
        }
    }

    /// The asynchronous form of [`wait_for_with`](Self::wait_for_with).
    ///
    /// Registration and `action` happen before the first `.await`. Dropping
    /// the future abandons the wait and frees the key.
    pub async fn wait_for_async(&self, key: impl Into<K>, action: impl FnOnce()) -> Outcome<T> {
        match self.register(key) {
            Ok(wait) => {
                action();
                wait.wait_async(self.default_timeout()).await
            }
            Err(error) => Outcome::Failure(error),
        }
    }

    /// Completes the wait for `key` with `value`.
    ///
    /// Returns `true` if a waiter received the value. Does nothing if no one
    /// is waiting for `key`.
    pub fn resolve<Q>(&self, key: &Q, value: T) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.complete(key, Ok(value))
    }

    /// Fails the wait for `key` with `error`.
    ///
    /// Returns `true` if a waiter received the error. Does nothing if no one
    /// is waiting for `key`.
    pub fn reject<Q>(&self, key: &Q, error: Error) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.complete(key, Err(error))
    }

    /// Fails the wait for `key` with a rejection built from `message`.
    pub fn reject_with_message<Q>(&self, key: &Q, message: impl Into<String>) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        self.complete(key, Err(Error::from_message(message)))
    }

    /// Returns `true` while a wait for `key` is outstanding.
    pub fn is_waiting<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        lock(&self.shared.table).contains_key(key)
    }

    fn complete<Q>(&self, key: &Q, result: Result<T>) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + Debug + ?Sized,
    {
        let registration = {
            let mut table = lock(&self.shared.table);
            let accepted = match (table.get(key), &result) {
                (None, _) => {
                    trace!(?key, "no wait registered for event; ignoring");
                    return false;
                }
                (Some(Registration { filter: Some(filter), .. }), Ok(value)) => filter(value),
                (Some(_), _) => true,
            };
            if !accepted {
                trace!(?key, "value did not match; still waiting");
                return false;
            }
            table.remove(key)
        };

        match registration {
            Some(registration) => {
                debug!(?key, id = registration.id, ok = result.is_ok(), "completing wait");
                registration.completer.complete(result)
            }
            None => false,
        }
    }
}
