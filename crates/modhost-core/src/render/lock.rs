//! Render lock - serializes frame drawing against structural engine edits
//!
//! # Scope
//!
//! ```text
//! UI thread ── FrameRenderer ──► lock ─ pointer move ─ draw frame ─ unlock ─► FPS publish
//! UI thread ── engine edits  ──► lock ─ add/remove module ────────── unlock
//! Audio thread ─────────────────── never touches this lock ──────────────────
//! ```
//!
//! The audio path never takes this lock; it relies on the engine's own
//! lock-free discipline (atomics, ring buffers).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Binary mutual-exclusion token with observable ownership
#[derive(Debug, Default)]
pub struct RenderLock {
    inner: Mutex<()>,
    held: AtomicBool,
}

impl RenderLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the critical section, blocking until available
    ///
    /// A poisoned lock (a panic while drawing) is recovered: the protected
    /// state is the engine's, not ours, and the next frame must still run.
    pub fn lock(&self) -> RenderGuard<'_> {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        self.held.store(true, Ordering::Release);
        RenderGuard {
            lock: self,
            _guard: guard,
        }
    }

    /// Enter the critical section only if nobody holds it
    pub fn try_lock(&self) -> Option<RenderGuard<'_>> {
        let guard = match self.inner.try_lock() {
            Ok(guard) => guard,
            Err(std::sync::TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(std::sync::TryLockError::WouldBlock) => return None,
        };
        self.held.store(true, Ordering::Release);
        Some(RenderGuard {
            lock: self,
            _guard: guard,
        })
    }

    /// Whether some thread is currently inside the critical section
    pub fn is_locked(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// RAII guard; leaving scope exits the critical section
#[must_use = "the render lock is released as soon as the guard is dropped"]
pub struct RenderGuard<'a> {
    lock: &'a RenderLock,
    _guard: MutexGuard<'a, ()>,
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        // Cleared before the mutex guard field drops
        self.lock.held.store(false, Ordering::Release);
    }
}
