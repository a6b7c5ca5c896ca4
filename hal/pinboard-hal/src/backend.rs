//! Register access backend contract
//!
//! A backend performs the physical operations for one silicon family.
//! Every method takes `&self`: backends are shared between main-line code
//! and interrupt handlers, so each write must be a single-pin set/reset
//! that never rewrites the full port word.

use core::fmt;

use crate::pin::{Pin, PinMode, PinState, Port};

/// Why a backend could not hand out a pin lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquireError {
    /// Another holder owns the lock
    Held,
    /// The lock resource stayed unavailable for the whole wait bound
    Expired,
    /// The pin is reserved by the board and cannot be locked
    Reserved,
}

/// Why a backend could not release a pin lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReleaseError {
    /// The lock was not held
    NotHeld,
    /// The pin is reserved by the board
    Reserved,
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcquireError::Held => write!(f, "lock already held"),
            AcquireError::Expired => write!(f, "lock wait expired"),
            AcquireError::Reserved => write!(f, "pin is reserved"),
        }
    }
}

impl fmt::Display for ReleaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseError::NotHeld => write!(f, "lock not held"),
            ReleaseError::Reserved => write!(f, "pin is reserved"),
        }
    }
}

/// Register-level pin access
///
/// Implementations must guarantee:
/// - `set_bits`/`clear_bits` only affect the bits in `mask`
/// - `read_input` reflects the sensed level, including for output pins
/// - `acquire` honours the wait bound and never blocks indefinitely
pub trait RegisterBackend {
    /// Apply an electrical mode to one pin
    fn configure(&self, port: Port, pin: Pin, mode: PinMode);

    /// Drive the pins in `mask` high (set half of the set/reset register)
    fn set_bits(&self, port: Port, mask: u16);

    /// Drive the pins in `mask` low (reset half of the set/reset register)
    fn clear_bits(&self, port: Port, mask: u16);

    /// Sample the input data register for one pin
    fn read_input(&self, port: Port, pin: Pin) -> PinState;

    /// Sample the output latch for one pin
    fn read_output(&self, port: Port, pin: Pin) -> PinState;

    /// Invert the driven level of one pin
    ///
    /// The default reads the output latch and issues a single set or reset
    /// write for `pin` only.
    fn toggle(&self, port: Port, pin: Pin) {
        match self.read_output(port, pin) {
            PinState::On => self.clear_bits(port, pin.mask()),
            PinState::Off => self.set_bits(port, pin.mask()),
        }
    }

    /// Check if the board reserves this pin (debug port, boot strap, ...)
    fn is_reserved(&self, _port: Port, _pin: Pin) -> bool {
        false
    }

    /// Take the mutual-exclusion token for one pin
    ///
    /// Waits at most `wait_ms` milliseconds while the lock resource is
    /// unavailable. A lock that is already held fails immediately.
    fn acquire(&self, port: Port, pin: Pin, wait_ms: u32) -> Result<(), AcquireError>;

    /// Return the mutual-exclusion token for one pin
    fn release(&self, port: Port, pin: Pin) -> Result<(), ReleaseError>;
}

impl<B: RegisterBackend + ?Sized> RegisterBackend for &B {
    fn configure(&self, port: Port, pin: Pin, mode: PinMode) {
        (**self).configure(port, pin, mode)
    }

    fn set_bits(&self, port: Port, mask: u16) {
        (**self).set_bits(port, mask)
    }

    fn clear_bits(&self, port: Port, mask: u16) {
        (**self).clear_bits(port, mask)
    }

    fn read_input(&self, port: Port, pin: Pin) -> PinState {
        (**self).read_input(port, pin)
    }

    fn read_output(&self, port: Port, pin: Pin) -> PinState {
        (**self).read_output(port, pin)
    }

    fn toggle(&self, port: Port, pin: Pin) {
        (**self).toggle(port, pin)
    }

    fn is_reserved(&self, port: Port, pin: Pin) -> bool {
        (**self).is_reserved(port, pin)
    }

    fn acquire(&self, port: Port, pin: Pin, wait_ms: u32) -> Result<(), AcquireError> {
        (**self).acquire(port, pin, wait_ms)
    }

    fn release(&self, port: Port, pin: Pin) -> Result<(), ReleaseError> {
        (**self).release(port, pin)
    }
}
