//! Build script for pinboard-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates board.toml at compile time and generates pin constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use pinboard_hal::{parse_pin_string, Pin, PinSpec, Port};

/// SWD (PA13, PA14) and BOOT1 (PB2) lines on the Blue Pill
const RESERVED: [(Port, Pin); 3] = [
    (Port::A, Pin::P13),
    (Port::A, Pin::P14),
    (Port::B, Pin::P2),
];

fn main() {
    setup_linker();
    generate_board_constants();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate board.toml and write `board_pins.rs` into OUT_DIR
fn generate_board_constants() {
    println!("cargo:rerun-if-changed=board.toml");

    let config_path = Path::new("board.toml");

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read board.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in board.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();

    let led = pin_field(&config, "led", &mut errors);
    let button = pin_field(&config, "button", &mut errors);
    if let (Some(led), Some(button)) = (led, button) {
        if led.port == button.port && led.pin == button.pin {
            errors.push("[pins] led and button must be different pins".to_string());
        }
    }

    let lock_wait_ms = int_field(&config, "gpio", "lock_wait_ms", 0..=1000, &mut errors);
    let heartbeat_ms = int_field(&config, "timing", "heartbeat_ms", 1..=10_000, &mut errors);
    let debounce_ms = int_field(&config, "timing", "debounce_ms", 0..=500, &mut errors);

    if !errors.is_empty() {
        fail("Invalid board.toml", &errors);
    }

    // All fields are present once errors is empty
    let (led, button) = (led.unwrap(), button.unwrap());
    let generated = format!(
        "// Generated from board.toml by build.rs\n\
        pub const LED: PinSpec = {};\n\
        pub const BUTTON: PinSpec = {};\n\
        pub const LOCK_WAIT_MS: u32 = {};\n\
        pub const HEARTBEAT_MS: u32 = {};\n\
        pub const DEBOUNCE_MS: u32 = {};\n",
        spec_literal(&led),
        spec_literal(&button),
        lock_wait_ms.unwrap(),
        heartbeat_ms.unwrap(),
        debounce_ms.unwrap(),
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("board_pins.rs"), generated).unwrap();
}

/// Read and parse one entry of the [pins] table
fn pin_field(config: &toml::Value, key: &str, errors: &mut Vec<String>) -> Option<PinSpec> {
    let value = match config.get("pins").and_then(|t| t.get(key)) {
        Some(toml::Value::String(s)) => s,
        Some(_) => {
            errors.push(format!("[pins] {} must be a string like \"PA0\"", key));
            return None;
        }
        None => {
            errors.push(format!("[pins] missing '{}'", key));
            return None;
        }
    };

    match parse_pin_string(value) {
        Ok(spec) if RESERVED.contains(&(spec.port, spec.pin)) => {
            errors.push(format!("[pins] {} = \"{}\" is reserved by the board", key, value));
            None
        }
        Ok(spec) => Some(spec),
        Err(e) => {
            errors.push(format!("[pins] {} = \"{}\": {}", key, value, e));
            None
        }
    }
}

/// Read an integer field and check its range
fn int_field(
    config: &toml::Value,
    table: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) -> Option<i64> {
    match config.get(table).and_then(|t| t.get(key)) {
        Some(toml::Value::Integer(v)) if range.contains(v) => Some(*v),
        Some(toml::Value::Integer(_)) => {
            errors.push(format!(
                "[{}] {} must be {}-{}",
                table,
                key,
                range.start(),
                range.end()
            ));
            None
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", table, key));
            None
        }
        None => {
            errors.push(format!("[{}] missing '{}'", table, key));
            None
        }
    }
}

fn spec_literal(spec: &PinSpec) -> String {
    format!(
        "PinSpec {{ port: Port::{:?}, pin: Pin::{:?}, inverted: {} }}",
        spec.port, spec.pin, spec.inverted
    )
}

/// Abort the build with a boxed error report
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        format_error_lines(lines)
    );
}

/// Format error message lines with box drawing
fn format_error_lines(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| {
            let truncated = if line.len() > 62 {
                format!("{}...", &line[..59])
            } else {
                line.to_string()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
