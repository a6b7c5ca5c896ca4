//! STM32F1-specific HAL for Pinboard
//!
//! This crate implements the `pinboard-hal` backend traits for STM32F1
//! series chips, targeting the "Blue Pill" board:
//!
//! - STM32F103C8 (64KB flash, ports A-C)
//!
//! # Features
//!
//! - `stm32f103c8` - Enable support for STM32F103C8T6
//! - `stm32f103cb` - Enable support for STM32F103CBT6
//! - `defmt` - Enable debug formatting support
//!
//! # Usage
//!
//! ```ignore
//! static GPIO: Gpio<Stm32f1Registers> = Gpio::new(Stm32f1Registers::new());
//!
//! let mut clocks = Stm32f1Clocks::default();
//! clocks.board_init();
//! GPIO.init(Pin::P13, Port::C, PinMode::Output);
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod gpio;

pub use clock::Stm32f1Clocks;
pub use gpio::{Stm32f1Registers, RESERVED_PINS};

// Re-export shared types from pinboard-hal
pub use pinboard_hal::{Gpio, LockStatus, Pin, PinMode, PinState, Port};
