//! A single outstanding wait for one event occurrence.
//!
//! [`pending()`] returns the two halves of a wait: a [`Completer`] that a
//! producer uses to resolve or reject it, and a [`PendingWait`] that the
//! consumer blocks (or awaits) on.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::Timer;
use futures_channel::oneshot;
use futures_lite::future;
use tracing::trace;

use crate::error::{Error, Result};
use crate::outcome::Outcome;
use crate::util::{DropGuard, lock};

/// Creates a new wait, returning its producer and consumer halves.
pub fn pending<T>() -> (Completer<T>, PendingWait<T>) {
    let (sender, receiver) = oneshot::channel();
    let completer = Completer {
        sender: Arc::new(Mutex::new(Some(sender))),
    };
    let wait = PendingWait {
        receiver,
        deregister: None,
    };
    (completer, wait)
}

/// The producer half of a wait.
///
/// Only the first call to [`resolve`](Self::resolve) or [`reject`](Self::reject)
/// across all clones has an effect. Neither call blocks, so both are safe to
/// make from delegate callbacks.
pub struct Completer<T> {
    sender: Arc<Mutex<Option<oneshot::Sender<Result<T>>>>>,
}

impl<T> Clone for Completer<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> fmt::Debug for Completer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer")
            .field("completed", &self.is_completed())
            .finish()
    }
}

impl<T> Completer<T> {
    /// Completes the wait with `value`.
    ///
    /// Returns `false` if the wait was already completed or its waiter has gone away.
    pub fn resolve(&self, value: T) -> bool {
        self.complete(Ok(value))
    }

    /// Completes the wait with `error`.
    ///
    /// Returns `false` if the wait was already completed or its waiter has gone away.
    pub fn reject(&self, error: Error) -> bool {
        self.complete(Err(error))
    }

    /// Completes the wait with a rejection built from `message`.
    pub fn reject_with_message(&self, message: impl Into<String>) -> bool {
        self.reject(Error::from_message(message))
    }

    /// Returns `true` once the wait has been resolved or rejected.
    pub fn is_completed(&self) -> bool {
        lock(&self.sender).is_none()
    }

    pub(crate) fn complete(&self, result: Result<T>) -> bool {
        let sender = lock(&self.sender).take();
        match sender {
            Some(sender) => sender.send(result).is_ok(),
            None => {
                trace!("wait already completed; ignoring");
                false
            }
        }
    }
}

/// The consumer half of a wait.
///
/// Consuming the wait with [`wait`](Self::wait) or [`wait_async`](Self::wait_async)
/// yields exactly one [`Outcome`]. A wait handed out by an
/// [`EventRegistry`](crate::EventRegistry) removes its registry entry when it
/// finishes or is dropped.
#[must_use = "a wait does nothing unless waited on"]
pub struct PendingWait<T> {
    receiver: oneshot::Receiver<Result<T>>,
    deregister: Option<DropGuard>,
}

impl<T> fmt::Debug for PendingWait<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWait")
            .field("registered", &self.deregister.is_some())
            .finish_non_exhaustive()
    }
}

impl<T> PendingWait<T> {
    pub(crate) fn with_deregister(mut self, guard: DropGuard) -> Self {
        self.deregister = Some(guard);
        self
    }

    /// Blocks the current thread until the wait completes or `timeout` elapses.
    pub fn wait(self, timeout: Duration) -> Outcome<T> {
        async_io::block_on(self.wait_async(timeout))
    }

    /// Waits until the wait completes or `timeout` elapses, without blocking the thread.
    ///
    /// Dropping the returned future abandons the wait.
    pub async fn wait_async(mut self, timeout: Duration) -> Outcome<T> {
        let received = future::or(async { Some((&mut self.receiver).await) }, async {
            Timer::after(timeout).await;
            None
        })
        .await;

        if let Some(received) = received {
            return Outcome::received(received);
        }

        // Deregister first so no producer can pick up the entry after we look,
        // then close so a producer still holding the entry fails to send.
        drop(self.deregister.take());
        self.receiver.close();
        match self.receiver.try_recv() {
            Ok(Some(result)) => Outcome::from(result),
            Ok(None) | Err(_) => {
                trace!(?timeout, "wait timed out");
                Outcome::TimedOut
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Instant;

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn resolve_from_another_thread() {
        let (completer, wait) = pending();
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            assert!(completer.resolve(vec![1u8, 2, 3]));
        });

        let outcome = wait.wait(Duration::from_secs(5));
        assert_eq!(outcome.success(), Some(vec![1, 2, 3]));
        producer.join().unwrap();
    }

    #[test]
    fn reject_carries_error() {
        let (completer, wait) = pending::<()>();
        assert!(completer.reject(Error::rejected(14, "peer removed pairing information")));

        let error = wait.wait(Duration::from_secs(1)).failure().unwrap();
        assert_eq!(error.kind(), ErrorKind::Rejected);
        assert_eq!(error.code(), Some(14));
    }

    #[test]
    fn completion_is_one_shot() {
        let (completer, wait) = pending();
        let other = completer.clone();

        assert!(!completer.is_completed());
        assert!(completer.resolve(1));
        assert!(other.is_completed());
        assert!(!other.resolve(2));
        assert!(!completer.reject_with_message("too late"));

        assert_eq!(wait.wait(Duration::from_secs(1)).success(), Some(1));
    }

    #[test]
    fn times_out_without_producer_activity() {
        let (completer, wait) = pending::<u32>();
        let timeout = Duration::from_millis(50);

        let start = Instant::now();
        assert!(wait.wait(timeout).is_timed_out());
        assert!(start.elapsed() >= timeout);

        // the waiter is gone; a late resolve is harmless
        assert!(!completer.resolve(5));
    }

    #[test]
    fn dropped_completer_cancels() {
        let (completer, wait) = pending::<u32>();
        drop(completer);

        let error = wait.wait(Duration::from_secs(5)).failure().unwrap();
        assert_eq!(error.kind(), ErrorKind::Canceled);
    }

    #[tokio::test]
    async fn wait_async_resolves() {
        let (completer, wait) = pending();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            completer.resolve("ready");
        });

        let outcome = wait.wait_async(Duration::from_secs(5)).await;
        assert_eq!(outcome.success(), Some("ready"));
    }
}
