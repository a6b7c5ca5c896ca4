//! Clock and timing provider contract

/// Board bring-up and blocking delays
///
/// `board_init` must run once before the first GPIO operation. The GPIO
/// layer itself never delays; `delay_ms` is for application debounce and
/// settle timing.
pub trait ClockProvider {
    /// Enable peripheral clocks
    ///
    /// Only the first call has an effect.
    fn board_init(&mut self);

    /// Block for at least `ms` milliseconds
    fn delay_ms(&self, ms: u32);
}
