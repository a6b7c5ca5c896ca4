//! Single-line handles for `embedded-hal` drivers
//!
//! A [`Line`] binds one `(Pin, Port)` pair of a [`Gpio`] so that generic
//! drivers written against `embedded_hal::digital` can use board pins.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};

use crate::backend::RegisterBackend;
use crate::gpio::{Gpio, GpioError};
use crate::pin::{Pin, PinState, Port};

/// One board pin borrowed from a [`Gpio`]
///
/// Handles are cheap to create and may coexist for the same pin; they do
/// not take the pin lock.
pub struct Line<'a, B> {
    gpio: &'a Gpio<B>,
    pin: Pin,
    port: Port,
}

impl<'a, B: RegisterBackend> Line<'a, B> {
    pub(crate) fn new(gpio: &'a Gpio<B>, pin: Pin, port: Port) -> Self {
        Self { gpio, pin, port }
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn port(&self) -> Port {
        self.port
    }
}

impl<B: RegisterBackend> ErrorType for Line<'_, B> {
    type Error = GpioError;
}

impl<B: RegisterBackend> OutputPin for Line<'_, B> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.gpio.set(self.pin, self.port, PinState::Off)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.gpio.set(self.pin, self.port, PinState::On)
    }
}

impl<B: RegisterBackend> StatefulOutputPin for Line<'_, B> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.gpio.backend().read_output(self.port, self.pin).is_on())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        self.is_set_high().map(|high| !high)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        self.gpio.toggle(self.pin, self.port)
    }
}

impl<B: RegisterBackend> InputPin for Line<'_, B> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.gpio.read(self.pin, self.port).is_on())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
