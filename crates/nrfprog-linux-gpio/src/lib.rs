//! nrfprog-linux-gpio - Linux GPIO bitbang programmer
//!
//! Drives an nRF24LE1 in programming mode from six GPIO lines using the
//! Linux character device GPIO interface (gpiocdev). The SPI bus to the
//! flash controller is bit-banged; PROG and RESET are plain outputs.
//!
//! # Usage with nrfprog CLI
//!
//! ```bash
//! nrfprog info -p linux_gpio:dev=/dev/gpiochip0,prog=24,reset=23,fcsn=8,sck=11,mosi=10,miso=9
//!
//! # gpiochip number instead of a device path, slower clock (kHz)
//! nrfprog read -p linux_gpio:gpiochip=0,prog=24,reset=23,fcsn=8,sck=11,mosi=10,miso=9,spispeed=50 -o fw.bin
//! ```
//!
//! # GPIO Pin Wiring
//!
//! | Target Pin | GPIO Function  | Description |
//! |------------|----------------|-------------|
//! | PROG       | PROG (output)  | High selects programming mode at reset |
//! | RESET      | RESET (output) | Active low reset |
//! | FCSN       | FCSN (output)  | Flash SPI chip select, active low |
//! | FSCK       | SCK (output)   | Serial clock |
//! | FMOSI      | MOSI (output)  | Host to target data |
//! | FMISO      | MISO (input)   | Target to host data |
//! | GND        | GND            | Common ground |
//!
//! # System Requirements
//!
//! - Linux kernel 4.8+ with GPIO character device support (kernel 5.5+ for v2 API)
//! - Access to `/dev/gpiochipN` devices (may require root or udev rules)

pub mod device;
pub mod error;

pub use device::{parse_options, LinuxGpioConfig, LinuxGpioProgrammer};
pub use error::{LinuxGpioError, Result};

/// Open a Linux GPIO programmer and return it boxed
///
/// # Options
///
/// - `dev=/dev/gpiochip0` - GPIO chip device path (or use gpiochip=N)
/// - `gpiochip=0` - GPIO chip number (alternative to dev)
/// - `prog=24`, `reset=23`, `fcsn=8` - control line offsets (required)
/// - `sck=11`, `mosi=10`, `miso=9` - SPI line offsets (required)
/// - `spispeed=100` - SPI speed in kHz (optional, default ~100 kHz)
pub fn open_linux_gpio(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn nrfprog_core::programmer::Programmer>, Box<dyn std::error::Error>>
{
    let config = parse_options(options)?;
    let programmer = LinuxGpioProgrammer::open(&config)?;
    Ok(Box::new(programmer))
}
