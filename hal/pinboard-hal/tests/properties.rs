//! Property tests over every (pin, port) pair

use pinboard_hal::sim::SimBackend;
use pinboard_hal::{Gpio, GpioConfig, LockStatus, Pin, PinMode, PinState, Port};
use proptest::prelude::*;

fn any_pin() -> impl Strategy<Value = Pin> {
    (0u8..16).prop_map(|i| Pin::new(i).unwrap())
}

fn any_port() -> impl Strategy<Value = Port> {
    prop::sample::select(Port::ALL.to_vec())
}

fn any_state() -> impl Strategy<Value = PinState> {
    any::<bool>().prop_map(PinState::from)
}

proptest! {
    #[test]
    fn set_then_read_round_trips(pin in any_pin(), port in any_port()) {
        let gpio = Gpio::new(SimBackend::new());
        gpio.init(pin, port, PinMode::Output);

        gpio.set(pin, port, PinState::On).unwrap();
        prop_assert_eq!(gpio.read(pin, port), PinState::On);

        gpio.set(pin, port, PinState::Off).unwrap();
        prop_assert_eq!(gpio.read(pin, port), PinState::Off);
    }

    #[test]
    fn double_toggle_restores_level(
        pin in any_pin(),
        port in any_port(),
        start in any_state(),
    ) {
        let gpio = Gpio::new(SimBackend::new());
        gpio.init(pin, port, PinMode::Output);
        gpio.set(pin, port, start).unwrap();

        gpio.toggle(pin, port).unwrap();
        prop_assert_eq!(gpio.read(pin, port), !start);
        gpio.toggle(pin, port).unwrap();
        prop_assert_eq!(gpio.read(pin, port), start);
    }

    #[test]
    fn toggling_one_pin_leaves_siblings(
        pattern in any::<u16>(),
        target in any_pin(),
        port in any_port(),
    ) {
        let gpio = Gpio::new(SimBackend::new());
        for pin in Pin::ALL {
            gpio.init(pin, port, PinMode::Output);
            gpio.set(pin, port, PinState::from(pattern & pin.mask() != 0)).unwrap();
        }
        prop_assert_eq!(gpio.backend().output_word(port), pattern);

        gpio.toggle(target, port).unwrap();

        for pin in Pin::ALL {
            let expected = PinState::from(pattern & pin.mask() != 0);
            if pin == target {
                prop_assert_eq!(gpio.read(pin, port), !expected);
            } else {
                prop_assert_eq!(gpio.read(pin, port), expected);
            }
        }
        prop_assert_eq!(gpio.backend().output_word(port), pattern ^ target.mask());
    }

    #[test]
    fn writes_stay_on_their_port(pin in any_pin(), port in any_port(), state in any_state()) {
        let gpio = Gpio::new(SimBackend::new());
        gpio.init(pin, port, PinMode::Output);
        gpio.set(pin, port, state).unwrap();

        for other in Port::ALL {
            if other != port {
                prop_assert_eq!(gpio.backend().output_word(other), 0);
            }
        }
    }

    #[test]
    fn second_lock_is_busy(pin in any_pin(), port in any_port()) {
        let gpio = Gpio::new(SimBackend::new());
        let held = gpio.lock(pin, port).unwrap();
        prop_assert_eq!(gpio.lock(pin, port).err(), Some(LockStatus::Busy));
        prop_assert_eq!(gpio.unlock(held), LockStatus::Ok);
        prop_assert!(gpio.lock(pin, port).is_ok());
    }

    #[test]
    fn unavailable_lock_times_out(
        pin in any_pin(),
        port in any_port(),
        wait_ms in 0u32..50,
    ) {
        let gpio = Gpio::with_config(
            SimBackend::new(),
            GpioConfig::new().with_lock_wait_ms(wait_ms),
        );
        gpio.backend().set_lock_unavailable(port, pin, true);

        prop_assert_eq!(gpio.lock(pin, port).err(), Some(LockStatus::Timeout));
        prop_assert!(gpio.backend().elapsed_ms() > wait_ms);
        prop_assert!(!gpio.backend().is_locked(port, pin));
    }
}

#[test]
fn concurrent_writers_on_one_port_do_not_collide() {
    use std::sync::Arc;
    use std::thread;

    let gpio = Arc::new(Gpio::new(SimBackend::new()));
    for pin in Pin::ALL {
        gpio.init(pin, Port::B, PinMode::Output);
    }

    // Each thread owns one pin and leaves it high after an even number of toggles
    let handles: Vec<_> = Pin::ALL
        .into_iter()
        .map(|pin| {
            let gpio = Arc::clone(&gpio);
            thread::spawn(move || {
                gpio.set(pin, Port::B, PinState::On).unwrap();
                for _ in 0..1000 {
                    gpio.toggle(pin, Port::B).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(gpio.backend().output_word(Port::B), 0xFFFF);
}
