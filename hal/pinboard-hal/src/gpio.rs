//! GPIO abstraction layer
//!
//! [`Gpio`] translates typed `(Pin, Port)` requests into backend register
//! operations and tracks which pins have been configured. It is meant to be
//! created once as a process-wide singleton:
//!
//! ```ignore
//! static GPIO: Gpio<Stm32f1Registers> = Gpio::new(Stm32f1Registers::new());
//!
//! GPIO.init(Pin::P13, Port::C, PinMode::Output);
//! GPIO.set(Pin::P13, Port::C, PinState::On)?;
//! ```

use core::fmt;

use portable_atomic::{AtomicU16, Ordering};

use crate::backend::{AcquireError, RegisterBackend, ReleaseError};
use crate::config::GpioConfig;
use crate::line::Line;
use crate::lock::LockStatus;
use crate::pin::{Pin, PinMode, PinState, Port, PORT_COUNT};

/// Errors from driving a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// The pin has not been initialised
    Unconfigured,
    /// The pin is configured as an input
    NotOutput,
}

impl fmt::Display for GpioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpioError::Unconfigured => write!(f, "pin not initialised"),
            GpioError::NotOutput => write!(f, "pin is not an output"),
        }
    }
}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

/// Board GPIO access over a register backend
///
/// All operations take `&self`. Writes to different pins never interfere;
/// callers needing several operations on one pin without interleaving take
/// a [`PinGuard`] with [`Gpio::lock`] first.
pub struct Gpio<B> {
    backend: B,
    config: GpioConfig,
    /// Pins that have been through `init`
    configured: [AtomicU16; PORT_COUNT],
    /// Configured pins currently in output mode
    outputs: [AtomicU16; PORT_COUNT],
}

impl<B: RegisterBackend> Gpio<B> {
    /// Create the GPIO layer with default settings
    pub const fn new(backend: B) -> Self {
        Self::with_config(backend, GpioConfig::new())
    }

    /// Create the GPIO layer with explicit settings
    pub const fn with_config(backend: B, config: GpioConfig) -> Self {
        Self {
            backend,
            config,
            configured: [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)],
            outputs: [AtomicU16::new(0), AtomicU16::new(0), AtomicU16::new(0)],
        }
    }

    /// Get the underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get the active settings
    pub fn config(&self) -> GpioConfig {
        self.config
    }

    /// Configure the electrical mode of a pin
    ///
    /// Idempotent; may be called again later to switch modes.
    ///
    /// # Panics
    ///
    /// Panics if the backend reserves the pin. Board pin assignments are
    /// build-time constants, so this indicates a wiring table mistake.
    pub fn init(&self, pin: Pin, port: Port, mode: PinMode) {
        if self.backend.is_reserved(port, pin) {
            panic!("{}{} is reserved by the board", port, pin);
        }

        let outputs = &self.outputs[port.index()];
        match mode {
            PinMode::Output => {
                self.backend.configure(port, pin, mode);
                outputs.fetch_or(pin.mask(), Ordering::AcqRel);
            }
            PinMode::Input => {
                // Stop accepting writes before the driver is released
                outputs.fetch_and(!pin.mask(), Ordering::AcqRel);
                self.backend.configure(port, pin, mode);
            }
        }
        self.configured[port.index()].fetch_or(pin.mask(), Ordering::AcqRel);
    }

    /// Get the configured mode of a pin, if any
    pub fn mode(&self, pin: Pin, port: Port) -> Option<PinMode> {
        if self.configured[port.index()].load(Ordering::Acquire) & pin.mask() == 0 {
            return None;
        }
        if self.outputs[port.index()].load(Ordering::Acquire) & pin.mask() != 0 {
            Some(PinMode::Output)
        } else {
            Some(PinMode::Input)
        }
    }

    /// Drive an output pin to a level
    ///
    /// Only the addressed pin is written; other pins on the port are not
    /// touched. Input and unconfigured pins are rejected without any
    /// register access.
    pub fn set(&self, pin: Pin, port: Port, state: PinState) -> Result<(), GpioError> {
        self.require_output(pin, port)?;
        match state {
            PinState::On => self.backend.set_bits(port, pin.mask()),
            PinState::Off => self.backend.clear_bits(port, pin.mask()),
        }
        Ok(())
    }

    /// Invert the driven level of an output pin
    pub fn toggle(&self, pin: Pin, port: Port) -> Result<(), GpioError> {
        self.require_output(pin, port)?;
        self.backend.toggle(port, pin);
        Ok(())
    }

    /// Read the sensed level of a pin
    ///
    /// Output pins return their driven level.
    pub fn read(&self, pin: Pin, port: Port) -> PinState {
        self.backend.read_input(port, pin)
    }

    /// Try to take exclusive access to a pin
    ///
    /// On success the returned [`PinGuard`] is the only way to release the
    /// lock, either through [`Gpio::unlock`] or by dropping it. Failures
    /// carry the status:
    ///
    /// - [`LockStatus::Busy`]: held by someone else
    /// - [`LockStatus::Timeout`]: lock table unavailable for the whole wait bound
    /// - [`LockStatus::Error`]: pin cannot be locked
    pub fn lock(&self, pin: Pin, port: Port) -> Result<PinGuard<'_, B>, LockStatus> {
        match self.backend.acquire(port, pin, self.config.lock_wait()) {
            Ok(()) => Ok(PinGuard {
                gpio: self,
                pin,
                port,
                held: true,
            }),
            Err(AcquireError::Held) => Err(LockStatus::Busy),
            Err(AcquireError::Expired) => Err(LockStatus::Timeout),
            Err(AcquireError::Reserved) => Err(LockStatus::Error),
        }
    }

    /// Release a lock taken with [`Gpio::lock`]
    ///
    /// Returns [`LockStatus::Error`] if the guard belongs to another `Gpio`
    /// instance; that guard is still released on its own instance when it
    /// drops here.
    pub fn unlock(&self, guard: PinGuard<'_, B>) -> LockStatus {
        if !core::ptr::eq(guard.gpio, self) {
            return LockStatus::Error;
        }
        guard.release()
    }

    fn release_pin(&self, pin: Pin, port: Port) -> LockStatus {
        match self.backend.release(port, pin) {
            Ok(()) => LockStatus::Ok,
            Err(ReleaseError::NotHeld) | Err(ReleaseError::Reserved) => LockStatus::Error,
        }
    }

    /// Borrow a single-line handle for `embedded-hal` drivers
    pub fn line(&self, pin: Pin, port: Port) -> Line<'_, B> {
        Line::new(self, pin, port)
    }

    fn require_output(&self, pin: Pin, port: Port) -> Result<(), GpioError> {
        match self.mode(pin, port) {
            Some(PinMode::Output) => Ok(()),
            Some(PinMode::Input) => Err(GpioError::NotOutput),
            None => Err(GpioError::Unconfigured),
        }
    }
}

/// Exclusive access to one pin, released on drop
///
/// Only [`Gpio::lock`] creates a guard, so a lock can only be released by
/// the context that took it.
#[must_use = "the pin is unlocked as soon as the guard is dropped"]
pub struct PinGuard<'a, B: RegisterBackend> {
    gpio: &'a Gpio<B>,
    pin: Pin,
    port: Port,
    held: bool,
}

impl<B: RegisterBackend> PinGuard<'_, B> {
    /// Locked pin
    pub fn pin(&self) -> Pin {
        self.pin
    }

    /// Port of the locked pin
    pub fn port(&self) -> Port {
        self.port
    }

    /// Drive the locked pin
    pub fn set(&self, state: PinState) -> Result<(), GpioError> {
        self.gpio.set(self.pin, self.port, state)
    }

    /// Toggle the locked pin
    pub fn toggle(&self) -> Result<(), GpioError> {
        self.gpio.toggle(self.pin, self.port)
    }

    /// Read the locked pin
    pub fn read(&self) -> PinState {
        self.gpio.read(self.pin, self.port)
    }

    /// Release the lock now and report the outcome
    pub fn release(mut self) -> LockStatus {
        self.held = false;
        self.gpio.release_pin(self.pin, self.port)
    }
}

impl<B: RegisterBackend> fmt::Debug for PinGuard<'_, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinGuard")
            .field("port", &self.port)
            .field("pin", &self.pin)
            .field("held", &self.held)
            .finish()
    }
}

impl<B: RegisterBackend> Drop for PinGuard<'_, B> {
    fn drop(&mut self) {
        if self.held {
            let _ = self.gpio.release_pin(self.pin, self.port);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_LOCK_WAIT_MS;
    use crate::sim::SimBackend;

    fn board() -> Gpio<SimBackend> {
        Gpio::new(SimBackend::new())
    }

    #[test]
    fn test_set_then_read() {
        let gpio = board();
        gpio.init(Pin::P5, Port::A, PinMode::Output);

        gpio.set(Pin::P5, Port::A, PinState::On).unwrap();
        assert_eq!(gpio.read(Pin::P5, Port::A), PinState::On);

        gpio.set(Pin::P5, Port::A, PinState::Off).unwrap();
        assert_eq!(gpio.read(Pin::P5, Port::A), PinState::Off);
    }

    #[test]
    fn test_blink_scenario() {
        let gpio = board();
        gpio.init(Pin::P5, Port::A, PinMode::Output);
        gpio.set(Pin::P5, Port::A, PinState::On).unwrap();
        assert_eq!(gpio.read(Pin::P5, Port::A), PinState::On);

        gpio.toggle(Pin::P5, Port::A).unwrap();
        assert_eq!(gpio.read(Pin::P5, Port::A), PinState::Off);
    }

    #[test]
    fn test_init_is_idempotent() {
        let gpio = board();
        gpio.init(Pin::P2, Port::B, PinMode::Output);
        gpio.set(Pin::P2, Port::B, PinState::On).unwrap();
        gpio.init(Pin::P2, Port::B, PinMode::Output);

        assert_eq!(gpio.mode(Pin::P2, Port::B), Some(PinMode::Output));
        assert_eq!(gpio.read(Pin::P2, Port::B), PinState::On);
    }

    #[test]
    fn test_unconfigured_pin_rejects_writes() {
        let gpio = board();
        assert_eq!(gpio.mode(Pin::P1, Port::C), None);
        assert_eq!(
            gpio.set(Pin::P1, Port::C, PinState::On),
            Err(GpioError::Unconfigured)
        );
        assert_eq!(gpio.toggle(Pin::P1, Port::C), Err(GpioError::Unconfigured));
        assert_eq!(gpio.backend().write_count(), 0);
    }

    #[test]
    fn test_input_pin_rejects_writes() {
        let gpio = board();
        gpio.init(Pin::P0, Port::A, PinMode::Input);

        assert_eq!(
            gpio.set(Pin::P0, Port::A, PinState::On),
            Err(GpioError::NotOutput)
        );
        assert_eq!(gpio.toggle(Pin::P0, Port::A), Err(GpioError::NotOutput));
        assert_eq!(gpio.backend().write_count(), 0);
        assert_eq!(gpio.backend().output_word(Port::A), 0);
    }

    #[test]
    fn test_input_reads_external_level() {
        let gpio = board();
        gpio.init(Pin::P0, Port::A, PinMode::Input);
        assert_eq!(gpio.read(Pin::P0, Port::A), PinState::Off);

        gpio.backend().drive_input(Port::A, Pin::P0, PinState::On);
        assert_eq!(gpio.read(Pin::P0, Port::A), PinState::On);
    }

    #[test]
    fn test_reconfigure_output_to_input() {
        let gpio = board();
        gpio.init(Pin::P7, Port::B, PinMode::Output);
        gpio.set(Pin::P7, Port::B, PinState::On).unwrap();

        gpio.init(Pin::P7, Port::B, PinMode::Input);
        assert_eq!(gpio.mode(Pin::P7, Port::B), Some(PinMode::Input));
        assert_eq!(gpio.backend().applied_mode(Port::B, Pin::P7), PinMode::Input);
        assert_eq!(gpio.toggle(Pin::P7, Port::B), Err(GpioError::NotOutput));
    }

    #[test]
    fn test_same_pin_on_other_port_is_independent() {
        let gpio = board();
        gpio.init(Pin::P5, Port::A, PinMode::Output);

        assert_eq!(gpio.mode(Pin::P5, Port::B), None);
        gpio.set(Pin::P5, Port::A, PinState::On).unwrap();
        assert_eq!(gpio.backend().output_word(Port::B), 0);
    }

    #[test]
    #[should_panic(expected = "reserved")]
    fn test_init_reserved_pin_panics() {
        let gpio = Gpio::new(SimBackend::new().with_reserved(Port::A, Pin::P13));
        gpio.init(Pin::P13, Port::A, PinMode::Output);
    }

    #[test]
    fn test_lock_then_busy() {
        let gpio = board();
        let held = gpio.lock(Pin::P5, Port::A).unwrap();
        assert_eq!(gpio.lock(Pin::P5, Port::A).err(), Some(LockStatus::Busy));

        // Other pins stay lockable
        let _sibling = gpio.lock(Pin::P6, Port::A).unwrap();

        assert_eq!(gpio.unlock(held), LockStatus::Ok);
        assert!(gpio.lock(Pin::P5, Port::A).is_ok());
    }

    #[test]
    fn test_lock_timeout_when_unavailable() {
        let gpio = Gpio::with_config(SimBackend::new(), GpioConfig::new().with_lock_wait_ms(5));
        gpio.backend().set_lock_unavailable(Port::B, Pin::P9, true);

        assert_eq!(gpio.lock(Pin::P9, Port::B).err(), Some(LockStatus::Timeout));
        assert!(gpio.backend().elapsed_ms() > 5);
        assert!(!gpio.backend().is_locked(Port::B, Pin::P9));

        gpio.backend().set_lock_unavailable(Port::B, Pin::P9, false);
        assert!(gpio.lock(Pin::P9, Port::B).is_ok());
    }

    #[test]
    fn test_lock_wait_beyond_maximum_still_times_out() {
        let gpio = Gpio::with_config(
            SimBackend::new(),
            GpioConfig {
                lock_wait_ms: u32::MAX,
            },
        );
        gpio.backend().set_lock_unavailable(Port::A, Pin::P8, true);

        assert_eq!(gpio.lock(Pin::P8, Port::A).err(), Some(LockStatus::Timeout));
        assert_eq!(gpio.backend().elapsed_ms(), MAX_LOCK_WAIT_MS + 1);
    }

    #[test]
    fn test_held_lock_reports_busy_even_when_unavailable() {
        let gpio = board();
        let _held = gpio.lock(Pin::P9, Port::B).unwrap();
        gpio.backend().set_lock_unavailable(Port::B, Pin::P9, true);
        assert_eq!(gpio.lock(Pin::P9, Port::B).err(), Some(LockStatus::Busy));
    }

    #[test]
    fn test_lock_errors() {
        let gpio = Gpio::new(SimBackend::new().with_reserved(Port::A, Pin::P14));
        assert_eq!(gpio.lock(Pin::P14, Port::A).err(), Some(LockStatus::Error));
        assert!(!gpio.backend().is_locked(Port::A, Pin::P14));
    }

    #[test]
    fn test_lock_does_not_block_writes() {
        let gpio = board();
        gpio.init(Pin::P4, Port::C, PinMode::Output);
        let _held = gpio.lock(Pin::P4, Port::C).unwrap();

        // Advisory only
        gpio.set(Pin::P4, Port::C, PinState::On).unwrap();
        assert_eq!(gpio.read(Pin::P4, Port::C), PinState::On);
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let gpio = board();
        gpio.init(Pin::P13, Port::C, PinMode::Output);

        {
            let guard = gpio.lock(Pin::P13, Port::C).unwrap();
            assert_eq!(guard.pin(), Pin::P13);
            assert_eq!(guard.port(), Port::C);
            guard.set(PinState::On).unwrap();
            guard.toggle().unwrap();
            assert_eq!(guard.read(), PinState::Off);

            assert_eq!(gpio.lock(Pin::P13, Port::C).err(), Some(LockStatus::Busy));
        }

        assert!(!gpio.backend().is_locked(Port::C, Pin::P13));
    }

    #[test]
    fn test_guard_explicit_release() {
        let gpio = board();
        let guard = gpio.lock(Pin::P1, Port::B).unwrap();
        assert_eq!(guard.release(), LockStatus::Ok);
        assert!(!gpio.backend().is_locked(Port::B, Pin::P1));

        // No second release from drop
        let _next = gpio.lock(Pin::P1, Port::B).unwrap();
        assert!(gpio.backend().is_locked(Port::B, Pin::P1));
    }

    #[test]
    fn test_stale_holder_cannot_release_new_owner() {
        let gpio = board();

        let first = gpio.lock(Pin::P5, Port::A).unwrap();
        assert_eq!(gpio.unlock(first), LockStatus::Ok);

        // A later owner keeps the lock until it lets go itself
        let second = gpio.lock(Pin::P5, Port::A).unwrap();
        assert_eq!(gpio.lock(Pin::P5, Port::A).err(), Some(LockStatus::Busy));
        assert!(gpio.backend().is_locked(Port::A, Pin::P5));

        drop(second);
        assert!(!gpio.backend().is_locked(Port::A, Pin::P5));
    }

    #[test]
    fn test_unlock_rejects_foreign_guard() {
        let left = board();
        let right = board();

        let theirs = right.lock(Pin::P5, Port::A).unwrap();
        let _ours = left.lock(Pin::P5, Port::A).unwrap();

        assert_eq!(left.unlock(theirs), LockStatus::Error);

        // The foreign guard went back to its own board; ours is untouched
        assert!(!right.backend().is_locked(Port::A, Pin::P5));
        assert!(left.backend().is_locked(Port::A, Pin::P5));
    }

    #[test]
    fn test_borrowed_backend() {
        let sim = SimBackend::new();
        let gpio = Gpio::new(&sim);
        gpio.init(Pin::P3, Port::C, PinMode::Output);
        gpio.set(Pin::P3, Port::C, PinState::On).unwrap();

        assert_eq!(sim.output_word(Port::C), Pin::P3.mask());
    }

    #[test]
    fn test_static_singleton() {
        static GPIO: Gpio<SimBackend> = Gpio::new(SimBackend::new());

        GPIO.init(Pin::P15, Port::B, PinMode::Output);
        GPIO.set(Pin::P15, Port::B, PinState::On).unwrap();
        assert_eq!(GPIO.read(Pin::P15, Port::B), PinState::On);
    }
}
