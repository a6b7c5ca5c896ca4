//! GPIO register backend for STM32F1
//!
//! Mode changes go through CRL/CRH, data writes through BSRR and reads
//! through IDR/ODR. BSRR writes are atomic in hardware: a set or reset of
//! one pin never touches the other pins of the port.

use embassy_stm32::pac;
use embassy_stm32::pac::gpio::{regs, vals, Gpio as GpioBlock};
use embassy_time::{Duration, Instant};

use pinboard_hal::backend::{AcquireError, RegisterBackend, ReleaseError};
use pinboard_hal::lock::{Attempt, LockTable};
use pinboard_hal::pin::{Pin, PinMode, PinState, Port, PORT_COUNT};

/// Pins the Blue Pill wires to the debug port and boot strap
///
/// - PA13 (SWDIO), PA14 (SWCLK)
/// - PB2 (BOOT1)
pub const RESERVED_PINS: [u16; PORT_COUNT] = [
    Pin::P13.mask() | Pin::P14.mask(),
    Pin::P2.mask(),
    0,
];

/// Register block for a port
fn block(port: Port) -> GpioBlock {
    let regs = match port {
        Port::A => pac::GPIOA,
        Port::B => pac::GPIOB,
        Port::C => pac::GPIOC,
    };
    debug_assert_eq!(regs.as_ptr() as u32, port.base_address());
    regs
}

/// STM32F1 GPIO backend
///
/// Zero-cost apart from the lock table; intended to live inside a
/// `static Gpio<Stm32f1Registers>`.
pub struct Stm32f1Registers {
    locks: LockTable,
}

impl Default for Stm32f1Registers {
    fn default() -> Self {
        Self::new()
    }
}

impl Stm32f1Registers {
    /// Create the backend
    ///
    /// Port clocks must already be enabled (see [`crate::clock::Stm32f1Clocks`]).
    pub const fn new() -> Self {
        Self {
            locks: LockTable::new(),
        }
    }
}

impl RegisterBackend for Stm32f1Registers {
    fn configure(&self, port: Port, pin: Pin, mode: PinMode) {
        let n = pin.index() as usize;
        // CRL/CRH hold four bits per pin; the update is read-modify-write
        critical_section::with(|_| {
            block(port).cr(n / 8).modify(|w| match mode {
                PinMode::Input => {
                    w.set_mode(n % 8, vals::Mode::INPUT);
                    w.set_cnf_in(n % 8, vals::CnfIn::FLOATING);
                }
                PinMode::Output => {
                    w.set_mode(n % 8, vals::Mode::OUTPUT50MHZ);
                    w.set_cnf_out(n % 8, vals::CnfOut::PUSH_PULL);
                }
            });
        });
    }

    fn set_bits(&self, port: Port, mask: u16) {
        block(port).bsrr().write_value(regs::Bsrr(u32::from(mask)));
    }

    fn clear_bits(&self, port: Port, mask: u16) {
        block(port).bsrr().write_value(regs::Bsrr(u32::from(mask) << 16));
    }

    fn read_input(&self, port: Port, pin: Pin) -> PinState {
        PinState::from(block(port).idr().read().0 & u32::from(pin.mask()) != 0)
    }

    fn read_output(&self, port: Port, pin: Pin) -> PinState {
        PinState::from(block(port).odr().read().0 & u32::from(pin.mask()) != 0)
    }

    fn is_reserved(&self, port: Port, pin: Pin) -> bool {
        RESERVED_PINS[port.index()] & pin.mask() != 0
    }

    fn acquire(&self, port: Port, pin: Pin, wait_ms: u32) -> Result<(), AcquireError> {
        if self.is_reserved(port, pin) {
            return Err(AcquireError::Reserved);
        }

        let start = Instant::now();
        let bound = Duration::from_millis(u64::from(wait_ms));
        match self
            .locks
            .acquire_until(port, pin, || start.elapsed() >= bound)
        {
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
