//! Advisory per-pin locking
//!
//! Locks are cooperative: `set`, `toggle` and `read` never consult them.
//! A caller that needs several operations on one line without interleaving
//! takes the lock first and releases it afterwards.

use core::fmt;

use portable_atomic::{AtomicU16, Ordering};

use crate::pin::{Pin, Port, PORT_COUNT};

/// Outcome of a lock or unlock request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LockStatus {
    /// Lock acquired (or released)
    Ok,
    /// The target cannot be locked, or was not held on release
    Error,
    /// Another holder owns the lock
    Busy,
    /// The lock table stayed unavailable past the wait bound
    Timeout,
}

impl LockStatus {
    /// Check if the request succeeded
    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, LockStatus::Ok)
    }

    /// Check if retrying later can succeed
    pub const fn is_retryable(self) -> bool {
        matches!(self, LockStatus::Busy | LockStatus::Timeout)
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockStatus::Ok => write!(f, "ok"),
            LockStatus::Error => write!(f, "invalid lock target"),
            LockStatus::Busy => write!(f, "lock held by another owner"),
            LockStatus::Timeout => write!(f, "lock wait timed out"),
        }
    }
}

/// Result of a single acquisition attempt against a [`LockTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attempt {
    /// The bit was free and is now ours
    Acquired,
    /// The bit is already set
    Held,
    /// Another pin on the same port changed the word under us
    Contended,
}

/// Holder bitmap, one word per port
///
/// Each bit records whether the matching pin is locked. Updates are a
/// single compare-and-swap so locking one pin never disturbs the bits of
/// its siblings.
pub struct LockTable {
    held: [AtomicU16; PORT_COUNT],
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}

impl LockTable {
    /// Create an empty lock table
    pub const fn new() -> Self {
        Self {
            held: [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)],
        }
    }

    /// Make one acquisition attempt
    pub fn try_acquire(&self, port: Port, pin: Pin) -> Attempt {
        self.attempt(port, pin, self.held_mask(port))
            .unwrap_or(Attempt::Contended)
    }

    /// Retry until acquired, held elsewhere, or `expired` reports true
    ///
    /// `expired` is polled after every contended attempt; the first attempt
    /// is always made.
    pub fn acquire_until(
        &self,
        port: Port,
        pin: Pin,
        expired: impl FnMut() -> bool,
    ) -> Attempt {
        self.acquire_from(port, pin, self.held_mask(port), expired)
    }

    /// [`LockTable::acquire_until`] starting from a word read earlier
    ///
    /// Every retry compares against the word the failed swap found, so a
    /// change made while `expired` runs is seen as contention.
    pub fn acquire_from(
        &self,
        port: Port,
        pin: Pin,
        mut observed: u16,
        mut expired: impl FnMut() -> bool,
    ) -> Attempt {
        loop {
            match self.attempt(port, pin, observed) {
                Ok(outcome) => return outcome,
                Err(_) if expired() => return Attempt::Contended,
                Err(actual) => observed = actual,
            }
        }
    }

    /// Single compare-and-swap from `observed`
    ///
    /// Returns the word actually found when the swap loses.
    fn attempt(&self, port: Port, pin: Pin, observed: u16) -> Result<Attempt, u16> {
        if observed & pin.mask() != 0 {
            return Ok(Attempt::Held);
        }
        self.held[port.index()]
            .compare_exchange(
                observed,
                observed | pin.mask(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| Attempt::Acquired)
    }

    /// Clear the lock bit
    ///
    /// Returns `false` if the pin was not locked.
    pub fn release(&self, port: Port, pin: Pin) -> bool {
        let previous = self.held[port.index()].fetch_and(!pin.mask(), Ordering::AcqRel);
        previous & pin.mask() != 0
    }

    /// Check if a pin is currently locked
    pub fn is_held(&self, port: Port, pin: Pin) -> bool {
        self.held[port.index()].load(Ordering::Acquire) & pin.mask() != 0
    }

    /// Bitmap of locked pins on a port
    pub fn held_mask(&self, port: Port) -> u16 {
        self.held[port.index()].load(Ordering::Acquire)
    }
}
