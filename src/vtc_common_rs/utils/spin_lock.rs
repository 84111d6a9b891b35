//! Spin lock for short critical sections around shared frame buffers
//!
//! Acquisition escalates by attempt count: busy spin, CPU pause hint,
//! thread yield, then short sleeps.

use std::cell::UnsafeCell;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Attempts spent busy spinning without any hint
const BUSY_LIMIT: u32 = 4;
/// Attempts spent issuing the pause hint
const PAUSE_LIMIT: u32 = 16;
/// Attempts spent yielding the thread
const YIELD_LIMIT: u32 = 32;
/// Sleep once yielding did not help
const SLEEP_INTERVAL: Duration = Duration::from_micros(50);

/// Escalating wait strategy
#[derive(Debug, Default)]
pub struct Backoff {
    attempt: u32,
}

impl Backoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait once, more expensively the longer it has been going on
    pub fn snooze(&mut self) {
        if self.attempt < BUSY_LIMIT {
            // plain retry
        } else if self.attempt < PAUSE_LIMIT {
            for _ in 0..(1u32 << (self.attempt - BUSY_LIMIT).min(6)) {
                std::hint::spin_loop();
            }
        } else if self.attempt < YIELD_LIMIT {
            thread::yield_now();
        } else {
            thread::sleep(SLEEP_INTERVAL);
        }
        self.attempt = self.attempt.saturating_add(1);
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Past the yielding stage
    pub fn is_sleeping(&self) -> bool {
        self.attempt > YIELD_LIMIT
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Lock word without data
#[derive(Debug, Default)]
pub struct RawSpinLock {
    locked: AtomicBool,
}

impl RawSpinLock {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    pub fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    pub fn lock(&self) {
        let mut backoff = Backoff::new();
        while !self.try_lock() {
            // wait on a plain load to keep the cache line shared
            while self.is_locked() {
                backoff.snooze();
            }
        }
    }

    /// Release the lock
    ///
    /// Must only be called by the holder.
    pub fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

/// Spin lock owning its data
pub struct SpinLock<T: ?Sized> {
    raw: RawSpinLock,
    data: UnsafeCell<T>,
}

// Access to `data` is serialized by `raw`.
unsafe impl<T: ?Sized + Send> Send for SpinLock<T> {}
unsafe impl<T: ?Sized + Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    pub const fn new(data: T) -> Self {
        Self {
            raw: RawSpinLock::new(),
            data: UnsafeCell::new(data),
        }
    }

    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized> SpinLock<T> {
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        self.raw.lock();
        SpinLockGuard {
            lock: self,
            _marker: PhantomData,
        }
    }

    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        if self.raw.try_lock() {
            Some(SpinLockGuard {
                lock: self,
                _marker: PhantomData,
            })
        } else {
            None
        }
    }

    pub fn is_locked(&self) -> bool {
        self.raw.is_locked()
    }

    /// Exclusive borrow makes locking unnecessary
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }
}

impl<T: Default> Default for SpinLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ?Sized> std::fmt::Debug for SpinLock<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinLock")
            .field("locked", &self.is_locked())
            .finish_non_exhaustive()
    }
}

/// RAII guard, unlocks on drop
pub struct SpinLockGuard<'a, T: ?Sized> {
    lock: &'a SpinLock<T>,
    _marker: PhantomData<&'a mut T>,
}

impl<T: ?Sized> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: the guard holds the lock
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized> DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: the guard holds the lock exclusively
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.raw.unlock();
    }
}
