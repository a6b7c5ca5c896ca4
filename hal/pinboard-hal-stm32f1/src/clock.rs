//! Clock bring-up and blocking delays for STM32F1
//!
//! `embassy_stm32::init` enables the GPIO port clocks and starts the
//! embassy time driver that `delay_ms` and lock wait bounds rely on.

use embassy_stm32::{Config, Peripherals};
use embassy_time::{block_for, Duration};

use pinboard_hal::clock::ClockProvider;

/// Board clock provider
pub struct Stm32f1Clocks {
    config: Option<Config>,
    peripherals: Option<Peripherals>,
}

impl Default for Stm32f1Clocks {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Stm32f1Clocks {
    /// Create a provider that will bring the chip up with `config`
    pub fn new(config: Config) -> Self {
        Self {
            config: Some(config),
            peripherals: None,
        }
    }

    /// Check if `board_init` has run
    pub fn is_initialized(&self) -> bool {
        self.config.is_none()
    }

    /// Take the peripheral singletons handed out by `board_init`
    ///
    /// Returns `None` before init or if already taken.
    pub fn take_peripherals(&mut self) -> Option<Peripherals> {
        self.peripherals.take()
    }
}

impl ClockProvider for Stm32f1Clocks {
    fn board_init(&mut self) {
        if let Some(config) = self.config.take() {
            self.peripherals = Some(embassy_stm32::init(config));
        }
    }

    fn delay_ms(&self, ms: u32) {
        block_for(Duration::from_millis(u64::from(ms)));
    }
}
