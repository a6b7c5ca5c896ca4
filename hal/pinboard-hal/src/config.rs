//! Board configuration types
//!
//! Pin assignments come from board descriptions as strings such as
//! `"PC13"` or `"!PA0"`, parsed here into typed `(Port, Pin)` pairs.

use core::fmt;

use crate::pin::{Pin, PinState, Port};

/// Default bound on how long `lock` waits for an unavailable lock table
pub const DEFAULT_LOCK_WAIT_MS: u32 = 10;

/// Longest lock wait the GPIO layer will honour
pub const MAX_LOCK_WAIT_MS: u32 = 1000;

/// Runtime settings for the GPIO layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioConfig {
    /// Maximum wait for the lock table before `lock` reports a timeout
    ///
    /// Values above [`MAX_LOCK_WAIT_MS`] are treated as that maximum.
    pub lock_wait_ms: u32,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioConfig {
    /// Create a config with default settings
    pub const fn new() -> Self {
        Self {
            lock_wait_ms: DEFAULT_LOCK_WAIT_MS,
        }
    }

    /// Set the lock wait bound, capped at [`MAX_LOCK_WAIT_MS`]
    pub const fn with_lock_wait_ms(mut self, lock_wait_ms: u32) -> Self {
        self.lock_wait_ms = if lock_wait_ms > MAX_LOCK_WAIT_MS {
            MAX_LOCK_WAIT_MS
        } else {
            lock_wait_ms
        };
        self
    }

    /// Lock wait bound actually applied
    pub const fn lock_wait(&self) -> u32 {
        if self.lock_wait_ms > MAX_LOCK_WAIT_MS {
            MAX_LOCK_WAIT_MS
        } else {
            self.lock_wait_ms
        }
    }
}

/// A named pin from a board description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinSpec {
    pub port: Port,
    pub pin: Pin,
    /// Pin is active-low ("!" prefix)
    pub inverted: bool,
}

impl PinSpec {
    /// Create a non-inverted pin spec
    pub const fn new(port: Port, pin: Pin) -> Self {
        Self {
            port,
            pin,
            inverted: false,
        }
    }

    /// Physical level that represents the logical `active` state
    pub fn level_for(&self, active: bool) -> PinState {
        PinState::from(active != self.inverted)
    }
}

impl fmt::Display for PinSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inverted {
            write!(f, "!")?;
        }
        write!(f, "{}{}", self.port, self.pin)
    }
}

/// Why a pin string was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinParseError {
    /// Missing the leading 'P'
    MissingPrefix,
    /// Port letter is not a bank on this board
    UnknownPort,
    /// Pin number missing, not a number, or above 15
    InvalidPin,
}

impl fmt::Display for PinParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinParseError::MissingPrefix => write!(f, "pin name must start with 'P'"),
            PinParseError::UnknownPort => write!(f, "unknown port (expected A-C)"),
            PinParseError::InvalidPin => write!(f, "pin number must be 0-15"),
        }
    }
}

/// Parse a pin string from a board description
///
/// Supports formats:
/// - "PA0" -> (Port A, Pin 0, not inverted)
/// - "!PB1" -> (Port B, Pin 1, inverted)
/// - "pc13" -> (Port C, Pin 13, not inverted)
pub fn parse_pin_string(s: &str) -> Result<PinSpec, PinParseError> {
    let s = s.trim();

    let (s, inverted) = match s.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (s, false),
    };

    let mut chars = s.chars();
    match chars.next() {
        Some('P') | Some('p') => {}
        _ => return Err(PinParseError::MissingPrefix),
    }

    let port = chars
        .next()
        .and_then(Port::from_letter)
        .ok_or(PinParseError::UnknownPort)?;

    let index: u8 = chars
        .as_str()
        .parse()
        .map_err(|_| PinParseError::InvalidPin)?;
    let pin = Pin::new(index).ok_or(PinParseError::InvalidPin)?;

    Ok(PinSpec {
        port,
        pin,
        inverted,
    })
}
