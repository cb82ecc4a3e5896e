//! Reentrancy guard for state-mutating entry points.
//!
//! Built on a `parking_lot::ReentrantMutex`: a call arriving on another thread
//! blocks until the running operation finishes, while a call re-entering on
//! the same thread (for example from a custody callback) sees the busy flag
//! and is rejected.

use std::cell::Cell;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tidelock_core::error::LedgerError;

#[derive(Default)]
pub struct ReentrancyGuard {
    busy: ReentrantMutex<Cell<bool>>,
}

/// Held for the duration of one operation. Dropping it releases the guard on
/// every exit path, including early `?` returns.
pub struct Entered<'a> {
    slot: ReentrantMutexGuard<'a, Cell<bool>>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<Entered<'_>, LedgerError> {
        let slot = self.busy.lock();
        if slot.replace(true) {
            return Err(LedgerError::Reentrancy);
        }
        Ok(Entered { slot })
    }

    /// Whether an operation is running on the current thread.
    pub fn is_entered(&self) -> bool {
        self.busy.lock().get()
    }
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.slot.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn nested_enter_rejected() {
        let guard = ReentrancyGuard::new();
        let _outer = guard.enter().unwrap();
        assert!(matches!(guard.enter(), Err(LedgerError::Reentrancy)));
        assert!(guard.is_entered());
    }

    #[test]
    fn released_on_drop() {
        let guard = ReentrancyGuard::new();
        {
            let _entered = guard.enter().unwrap();
        }
        assert!(!guard.is_entered());
        assert!(guard.enter().is_ok());
    }

    #[test]
    fn released_after_early_return() {
        fn failing(guard: &ReentrancyGuard) -> Result<(), LedgerError> {
            let _entered = guard.enter()?;
            Err(LedgerError::ZeroAmount)
        }
        let guard = ReentrancyGuard::new();
        assert!(failing(&guard).is_err());
        assert!(guard.enter().is_ok());
    }

    #[test]
    fn rejected_attempt_keeps_outer_entry() {
        let guard = ReentrancyGuard::new();
        let outer = guard.enter().unwrap();
        let _ = guard.enter();
        assert!(guard.is_entered());
        drop(outer);
        assert!(!guard.is_entered());
    }

    #[test]
    fn other_threads_are_serialized() {
        let guard = Arc::new(ReentrancyGuard::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let guard = Arc::clone(&guard);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    let _entered = guard.enter().unwrap();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
