use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Runs a closure when dropped.
pub struct ScopeGuard<F: FnOnce()> {
    dropfn: ManuallyDrop<F>,
}

impl<F: FnOnce()> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        // SAFETY: This is OK because `dropfn` is `ManuallyDrop` which will not be dropped by the compiler.
        let dropfn = unsafe { ManuallyDrop::take(&mut self.dropfn) };
        dropfn();
    }
}

pub fn defer<F: FnOnce()>(dropfn: F) -> ScopeGuard<F> {
    ScopeGuard {
        dropfn: ManuallyDrop::new(dropfn),
    }
}

/// A type-erased [`ScopeGuard`] that can travel with a value across threads.
pub type DropGuard = ScopeGuard<Box<dyn FnOnce() + Send>>;

pub fn drop_guard(dropfn: impl FnOnce() + Send + 'static) -> DropGuard {
    let dropfn: Box<dyn FnOnce() + Send> = Box::new(dropfn);
    defer(dropfn)
}

/// Locks `mutex`, ignoring poisoning.
///
/// None of the state guarded in this crate can be left half-updated by a panic.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn guard_runs_once_on_drop() {
        let hits = Arc::new(AtomicUsize::new(0));
        let guard = {
            let hits = hits.clone();
            drop_guard(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            })
        };
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        drop(guard);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
