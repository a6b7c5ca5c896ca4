//! Pinboard demo firmware
//!
//! Blue Pill (STM32F103C8) firmware exercising the board GPIO layer:
//! a heartbeat LED, a debounced push button, and pin locking between the
//! two tasks. Pin assignments come from board.toml.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::{Duration, Ticker, Timer};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pinboard_hal::{ClockProvider, Gpio, GpioConfig, LockStatus, PinMode};
use pinboard_hal_stm32f1::{Stm32f1Clocks, Stm32f1Registers};

mod board {
    use pinboard_hal::{Pin, PinSpec, Port};

    include!(concat!(env!("OUT_DIR"), "/board_pins.rs"));
}

use board::{BUTTON, DEBOUNCE_MS, HEARTBEAT_MS, LED, LOCK_WAIT_MS};

/// Board GPIO, shared by every task
static GPIO: Gpio<Stm32f1Registers> = Gpio::with_config(
    Stm32f1Registers::new(),
    GpioConfig::new().with_lock_wait_ms(LOCK_WAIT_MS),
);

// Clock provider must outlive the tasks that delay on it
static CLOCKS: StaticCell<Stm32f1Clocks> = StaticCell::new();

/// Number of fast flashes per button press
const FLASH_COUNT: u8 = 3;

/// Half-period of a flash
const FLASH_MS: u64 = 80;

/// Button poll interval
const POLL_MS: u64 = 10;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Pinboard firmware starting...");

    let mut clocks = Stm32f1Clocks::default();
    clocks.board_init();
    let clocks = CLOCKS.init(clocks);

    GPIO.init(LED.pin, LED.port, PinMode::Output);
    GPIO.init(BUTTON.pin, BUTTON.port, PinMode::Input);
    if let Err(e) = GPIO.set(LED.pin, LED.port, LED.level_for(false)) {
        error!("LED init failed: {:?}", e);
    }
    info!("LED on {}, button on {}", LED, BUTTON);

    spawner.spawn(heartbeat_task()).unwrap();
    spawner.spawn(button_task(clocks)).unwrap();

    info!("All tasks spawned");
}

/// Toggle the LED at the heartbeat rate unless someone holds it
#[embassy_executor::task]
async fn heartbeat_task() {
    info!("Heartbeat task started");

    let mut ticker = Ticker::every(Duration::from_millis(u64::from(HEARTBEAT_MS)));

    loop {
        ticker.next().await;

        match GPIO.lock(LED.pin, LED.port) {
            Ok(led) => {
                if let Err(e) = led.toggle() {
                    warn!("Heartbeat toggle failed: {:?}", e);
                }
            }
            Err(LockStatus::Busy) => debug!("LED busy, skipping beat"),
            Err(status) => warn!("LED lock failed: {:?}", status),
        }
    }
}

/// Flash the LED while holding its lock whenever the button is pressed
#[embassy_executor::task]
async fn button_task(clocks: &'static Stm32f1Clocks) {
    info!("Button task started");

    let mut was_pressed = false;

    loop {
        Timer::after(Duration::from_millis(POLL_MS)).await;

        let pressed = GPIO.read(BUTTON.pin, BUTTON.port) == BUTTON.level_for(true);
        if pressed == was_pressed {
            continue;
        }

        // Let contacts settle, then confirm
        clocks.delay_ms(DEBOUNCE_MS);
        let confirmed = GPIO.read(BUTTON.pin, BUTTON.port) == BUTTON.level_for(true);
        if confirmed != pressed {
            continue;
        }
        was_pressed = pressed;

        if !pressed {
            continue;
        }

        info!("Button pressed");
        match GPIO.lock(LED.pin, LED.port) {
            Ok(led) => {
                let resting = led.read();
                for _ in 0..FLASH_COUNT * 2 {
                    if let Err(e) = led.toggle() {
                        warn!("Flash toggle failed: {:?}", e);
                        break;
                    }
                    Timer::after(Duration::from_millis(FLASH_MS)).await;
                }
                if let Err(e) = led.set(resting) {
                    warn!("LED restore failed: {:?}", e);
                }
                let status = GPIO.unlock(led);
                debug!("LED released: {}", status);
            }
            Err(status) => warn!("Could not take LED: {:?}", status),
        }
    }
}
