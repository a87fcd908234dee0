//! Build script for rpio-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates rpio.toml and compiles it in as a constant

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use rpio_core::{ConfigError, RpioConfig};

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));
    setup_linker(&out_dir);
    generate_config(&out_dir);
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x");
    f.write_all(memory_x).expect("write memory.x");

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate rpio.toml and write it out as `RPIO_CONFIG`
fn generate_config(out_dir: &Path) {
    println!("cargo:rerun-if-changed=rpio.toml");

    let config_path = Path::new("rpio.toml");
    let document = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail(&format!("Failed to read rpio.toml: {}", e)),
    };

    let config = match RpioConfig::from_toml(&document) {
        Ok(config) => config,
        Err(e) => fail(describe(e)),
    };

    let t = &config.transport;
    let l = &config.link;
    let source = format!(
        "/// Configuration compiled in from rpio.toml\n\
         pub const RPIO_CONFIG: rpio_core::RpioConfig = rpio_core::RpioConfig {{\n\
         \x20   transport: rpio_core::TransportConfig {{\n\
         \x20       poll_interval_us: {},\n\
         \x20       min_buffer_size: {},\n\
         \x20       default_buffer_size: {},\n\
         \x20       negotiation_timeout_ms: {},\n\
         \x20       negotiation_settle_us: {},\n\
         \x20       turnaround_us: {},\n\
         \x20       verify_response_crc: {},\n\
         \x20   }},\n\
         \x20   link: rpio_core::LinkConfig {{\n\
         \x20       baudrate: {},\n\
         \x20       rx_buffer: {},\n\
         \x20       tx_buffer: {},\n\
         \x20       passthrough: {},\n\
         \x20   }},\n\
         }};\n",
        t.poll_interval_us,
        t.min_buffer_size,
        t.default_buffer_size,
        t.negotiation_timeout_ms,
        t.negotiation_settle_us,
        t.turnaround_us,
        t.verify_response_crc,
        l.baudrate,
        l.rx_buffer,
        l.tx_buffer,
        l.passthrough,
    );

    fs::write(out_dir.join("rpio_config.rs"), source).expect("write rpio_config.rs");
    println!("cargo:warning=rpio.toml validated successfully");
}

fn describe(error: ConfigError) -> &'static str {
    match error {
        ConfigError::Parse => "rpio.toml is not valid TOML or has a wrongly typed key",
        ConfigError::InvalidPollInterval => "poll_interval_us must be 1-1000000",
        ConfigError::InvalidBufferFloor => "min_buffer_size must be at least 1",
        ConfigError::DefaultBelowFloor => "default_buffer_size must not be below min_buffer_size",
    }
}

/// Abort the build with a boxed error message
fn fail(msg: &str) -> ! {
    let lines = msg
        .lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n");

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: Invalid rpio.toml                                        ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        lines
    );
}
