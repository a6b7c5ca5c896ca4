//! Simulated board for host-side testing
//!
//! `SimBackend` models three ports with an output latch, externally driven
//! input levels and a pin lock table. Time is simulated: each lock poll
//! advances the backend's millisecond counter by one, so wait bounds are
//! deterministic.

use portable_atomic::{AtomicU16, AtomicU32, Ordering};

use crate::backend::{AcquireError, RegisterBackend, ReleaseError};
use crate::clock::ClockProvider;
use crate::lock::{Attempt, LockTable};
use crate::pin::{Pin, PinMode, PinState, Port, PORT_COUNT};

/// Simulated register backend
pub struct SimBackend {
    /// Output data latch per port
    odr: [AtomicU16; PORT_COUNT],
    /// Levels driven onto input pins from outside
    external: [AtomicU16; PORT_COUNT],
    /// Pins configured as push-pull output
    outputs: [AtomicU16; PORT_COUNT],
    /// Pins whose lock word is being hammered by another context
    unavailable: [AtomicU16; PORT_COUNT],
    reserved: [u16; PORT_COUNT],
    locks: LockTable,
    now_ms: AtomicU32,
    writes: AtomicU32,
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBackend {
    /// Create a board with every pin floating low and nothing reserved
    pub const fn new() -> Self {
        Self {
            odr: [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)],
            external: [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)],
            outputs: [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)],
            unavailable: [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)],
            reserved: [0; PORT_COUNT],
            locks: LockTable::new(),
            now_ms: AtomicU32::new(0),
            writes: AtomicU32::new(0),
        }
    }

    /// Mark a pin as reserved by the board
    pub fn with_reserved(mut self, port: Port, pin: Pin) -> Self {
        self.reserved[port.index()] |= pin.mask();
        self
    }

    /// Drive an input pin from outside the chip
    pub fn drive_input(&self, port: Port, pin: Pin, state: PinState) {
        let word = &self.external[port.index()];
        match state {
            PinState::On => word.fetch_or(pin.mask(), Ordering::AcqRel),
            PinState::Off => word.fetch_and(!pin.mask(), Ordering::AcqRel),
        };
    }

    /// Keep the lock word for a pin permanently contended
    ///
    /// Contention comes from a simulated rival locking and unlocking another
    /// free pin on the same port, so at least one sibling must be unlocked.
    pub fn set_lock_unavailable(&self, port: Port, pin: Pin, unavailable: bool) {
        let word = &self.unavailable[port.index()];
        if unavailable {
            word.fetch_or(pin.mask(), Ordering::AcqRel);
        } else {
            word.fetch_and(!pin.mask(), Ordering::AcqRel);
        }
    }

    /// Current output latch of a port
    pub fn output_word(&self, port: Port) -> u16 {
        self.odr[port.index()].load(Ordering::Acquire)
    }

    /// Mode the backend last applied to a pin
    pub fn applied_mode(&self, port: Port, pin: Pin) -> PinMode {
        if self.outputs[port.index()].load(Ordering::Acquire) & pin.mask() != 0 {
            PinMode::Output
        } else {
            PinMode::Input
        }
    }

    /// Check if the lock table currently holds a pin
    pub fn is_locked(&self, port: Port, pin: Pin) -> bool {
        self.locks.is_held(port, pin)
    }

    /// Number of set/reset writes issued
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Simulated milliseconds spent polling the lock table
    pub fn elapsed_ms(&self) -> u32 {
        self.now_ms.load(Ordering::Relaxed)
    }

    fn tick(&self) -> u32 {
        self.now_ms.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Acquire `pin` while another context locks and unlocks `rival`
    ///
    /// The rival moves between every swap, so each compare-and-swap loses
    /// until `expired` fires. The rival's bit is left as it was found.
    fn contend(
        &self,
        port: Port,
        pin: Pin,
        rival: Pin,
        observed: u16,
        mut expired: impl FnMut() -> bool,
    ) -> Attempt {
        let mut moves = 0u32;
        // The rival already moved since `observed` was read
        let outcome = self
            .locks
            .acquire_from(port, pin, observed | rival.mask(), || {
                if expired() {
                    return true;
                }
                if moves % 2 == 0 {
                    self.locks.try_acquire(port, rival);
                } else {
                    self.locks.release(port, rival);
                }
                moves += 1;
                false
            });
        if moves % 2 == 1 {
            self.locks.release(port, rival);
        }
        outcome
    }
}

impl RegisterBackend for SimBackend {
    fn configure(&self, port: Port, pin: Pin, mode: PinMode) {
        let word = &self.outputs[port.index()];
        match mode {
            PinMode::Output => word.fetch_or(pin.mask(), Ordering::AcqRel),
            PinMode::Input => word.fetch_and(!pin.mask(), Ordering::AcqRel),
        };
    }

    fn set_bits(&self, port: Port, mask: u16) {
        self.odr[port.index()].fetch_or(mask, Ordering::AcqRel);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn clear_bits(&self, port: Port, mask: u16) {
        self.odr[port.index()].fetch_and(!mask, Ordering::AcqRel);
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    fn read_input(&self, port: Port, pin: Pin) -> PinState {
        // Output pins read back their driven level through the input stage
        let word = match self.applied_mode(port, pin) {
            PinMode::Output => &self.odr[port.index()],
            PinMode::Input => &self.external[port.index()],
        };
        PinState::from(word.load(Ordering::Acquire) & pin.mask() != 0)
    }

    fn read_output(&self, port: Port, pin: Pin) -> PinState {
        PinState::from(self.output_word(port) & pin.mask() != 0)
    }

    fn is_reserved(&self, port: Port, pin: Pin) -> bool {
        self.reserved[port.index()] & pin.mask() != 0
    }

    fn acquire(&self, port: Port, pin: Pin, wait_ms: u32) -> Result<(), AcquireError> {
        if self.is_reserved(port, pin) {
            return Err(AcquireError::Reserved);
        }

        let start = self.elapsed_ms();
        let expired = || self.tick().wrapping_sub(start) >= wait_ms.saturating_add(1);

        let observed = self.locks.held_mask(port);
        let unavailable =
            self.unavailable[port.index()].load(Ordering::Acquire) & pin.mask() != 0;
        let rival = Pin::ALL
            .into_iter()
            .find(|other| *other != pin && observed & other.mask() == 0);

        let outcome = match rival {
            Some(rival) if unavailable => self.contend(port, pin, rival, observed, expired),
            _ => self.locks.acquire_until(port, pin, expired),
        };

        match outcome {
            Attempt::Acquired => Ok(()),
            Attempt::Held => Err(AcquireError::Held),
            Attempt::Contended => Err(AcquireError::Expired),
        }
    }

    fn release(&self, port: Port, pin: Pin) -> Result<(), ReleaseError> {
        if self.is_reserved(port, pin) {
            return Err(ReleaseError::Reserved);
        }
        if self.locks.release(port, pin) {
            Ok(())
        } else {
            Err(ReleaseError::NotHeld)
        }
    }
}

/// Simulated clock provider
///
/// Delays return immediately and are accumulated instead.
#[derive(Default)]
pub struct SimClock {
    init_calls: u32,
    initialized: bool,
    delayed_ms: AtomicU32,
}

impl SimClock {
    /// Create an uninitialised clock
    pub const fn new() -> Self {
        Self {
            init_calls: 0,
            initialized: false,
            delayed_ms: AtomicU32::new(0),
        }
    }

    /// Check if `board_init` has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of `board_init` calls, including ignored repeats
    pub fn init_calls(&self) -> u32 {
        self.init_calls
    }

    /// Total requested delay
    pub fn delayed_ms(&self) -> u32 {
        self.delayed_ms.load(Ordering::Relaxed)
    }
}

impl ClockProvider for SimClock {
    fn board_init(&mut self) {
        self.init_calls += 1;
        self.initialized = true;
    }

    fn delay_ms(&self, ms: u32) {
        self.delayed_ms.fetch_add(ms, Ordering::Relaxed);
    }
}
