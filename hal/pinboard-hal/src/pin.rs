//! Pin and port identifiers
//!
//! A physical line is addressed by a `(Port, Pin)` pair. Both halves are
//! closed enums, so a multi-pin mask or an unknown bank can never reach a
//! backend call.

use core::fmt;
use core::ops::Not;

/// Number of pins on one port
pub const PINS_PER_PORT: usize = 16;

/// Number of port banks on the board
pub const PORT_COUNT: usize = 3;

/// One of the 16 pin positions on a port
///
/// The discriminant is the pin's single-bit mask (bit k for pin k).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum Pin {
    P0 = 0x0001,
    P1 = 0x0002,
    P2 = 0x0004,
    P3 = 0x0008,
    P4 = 0x0010,
    P5 = 0x0020,
    P6 = 0x0040,
    P7 = 0x0080,
    P8 = 0x0100,
    P9 = 0x0200,
    P10 = 0x0400,
    P11 = 0x0800,
    P12 = 0x1000,
    P13 = 0x2000,
    P14 = 0x4000,
    P15 = 0x8000,
}

impl Pin {
    /// All pins in bit order
    pub const ALL: [Pin; PINS_PER_PORT] = [
        Pin::P0,
        Pin::P1,
        Pin::P2,
        Pin::P3,
        Pin::P4,
        Pin::P5,
        Pin::P6,
        Pin::P7,
        Pin::P8,
        Pin::P9,
        Pin::P10,
        Pin::P11,
        Pin::P12,
        Pin::P13,
        Pin::P14,
        Pin::P15,
    ];

    /// Get the pin for a bit position (0-15)
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < PINS_PER_PORT {
            Some(Self::ALL[index as usize])
        } else {
            None
        }
    }

    /// Get the pin for a raw mask
    ///
    /// Returns `None` unless exactly one of the low 16 bits is set.
    pub const fn from_mask(mask: u16) -> Option<Self> {
        if mask.count_ones() != 1 {
            return None;
        }
        Self::new(mask.trailing_zeros() as u8)
    }

    /// Single-bit mask for this pin
    #[inline]
    pub const fn mask(self) -> u16 {
        self as u16
    }

    /// Bit position of this pin (0-15)
    #[inline]
    pub const fn index(self) -> u8 {
        (self as u16).trailing_zeros() as u8
    }
}

/// A port bank
///
/// Each variant is bound to one fixed register block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    A,
    B,
    C,
}

impl Port {
    /// All ports in bank order
    pub const ALL: [Port; PORT_COUNT] = [Port::A, Port::B, Port::C];

    /// Register block base address (STM32F1 APB2 GPIO banks)
    pub const fn base_address(self) -> u32 {
        match self {
            Port::A => 0x4001_0800,
            Port::B => 0x4001_0C00,
            Port::C => 0x4001_1000,
        }
    }

    /// Zero-based bank index, usable for per-port tables
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bank letter as used in pin names ("PA5" -> 'A')
    pub const fn letter(self) -> char {
        match self {
            Port::A => 'A',
            Port::B => 'B',
            Port::C => 'C',
        }
    }

    /// Look up a port by its letter (case-insensitive)
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Port::A),
            'B' => Some(Port::B),
            'C' => Some(Port::C),
            _ => None,
        }
    }
}

/// Electrical configuration of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// Floating input (high impedance, sense-only)
    Input,
    /// Push-pull output
    Output,
}

/// Logic level of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PinState {
    #[default]
    Off = 0,
    On = 1,
}

impl PinState {
    /// Check if the level is high
    #[inline]
    pub const fn is_on(self) -> bool {
        matches!(self, PinState::On)
    }
}

impl From<bool> for PinState {
    fn from(high: bool) -> Self {
        if high {
            PinState::On
        } else {
            PinState::Off
        }
    }
}

impl From<PinState> for bool {
    fn from(state: PinState) -> Self {
        state.is_on()
    }
}

impl Not for PinState {
    type Output = PinState;

    fn not(self) -> Self::Output {
        match self {
            PinState::Off => PinState::On,
            PinState::On => PinState::Off,
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.letter())
    }
}
