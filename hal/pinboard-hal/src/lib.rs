//! Pinboard Hardware Abstraction Layer
//!
//! This crate defines a board-level GPIO layer that application code uses
//! to configure, drive, read and lock pins without knowing the register
//! layout of the chip. Chip-specific crates implement the backend traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (pinboard-firmware, etc.)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pinboard-hal (Gpio layer + traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ pinboard-hal- │       │  sim (host    │
//! │   stm32f1     │       │   testing)    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Modules
//!
//! - [`pin`] - [`Pin`], [`Port`], [`PinMode`], [`PinState`]
//! - [`gpio`] - [`Gpio`] operations: init, set, toggle, read, lock, unlock
//! - [`lock`] - [`LockStatus`] and the per-port [`LockTable`]
//! - [`backend`] - [`RegisterBackend`] contract for chip crates
//! - [`clock`] - [`ClockProvider`] contract (board init, delays)
//! - [`config`] - runtime settings and pin-name parsing
//! - [`line`] - `embedded-hal` digital pin handles
//! - [`sim`] - simulated backend and clock

#![no_std]
#![deny(unsafe_code)]

pub mod backend;
pub mod clock;
pub mod config;
pub mod gpio;
pub mod line;
pub mod lock;
pub mod pin;
pub mod sim;

// Re-export key types at crate root for convenience
pub use backend::{AcquireError, RegisterBackend, ReleaseError};
pub use clock::ClockProvider;
pub use config::{
    parse_pin_string, GpioConfig, PinParseError, PinSpec, DEFAULT_LOCK_WAIT_MS, MAX_LOCK_WAIT_MS,
};
pub use gpio::{Gpio, GpioError, PinGuard};
pub use line::Line;
pub use lock::{LockStatus, LockTable};
pub use pin::{Pin, PinMode, PinState, Port};
