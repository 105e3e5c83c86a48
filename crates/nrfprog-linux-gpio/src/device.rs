//! Linux GPIO bitbang programmer implementation
//!
//! This module provides the `LinuxGpioProgrammer` struct that implements
//! the `SpiMaster` and `ControlLines` traits using Linux's GPIO character
//! device interface (gpiocdev). All six lines are held in a single line
//! request for the lifetime of the programmer.

use crate::error::{LinuxGpioError, Result};

use gpiocdev::line::{Offset, Value};
use gpiocdev::request::{Config, Request};

use nrfprog_core::error::{Error as CoreError, Result as CoreResult};
use nrfprog_core::programmer::bitbang::{self, BitbangSpiMaster};
use nrfprog_core::programmer::{ControlLine, ControlLines, Level, SpiMaster};
use nrfprog_core::spi::SpiCommand;

/// GPIO line indices
#[derive(Debug, Clone, Copy)]
enum Line {
    Prog = 0,
    Reset = 1,
    Fcsn = 2,
    Sck = 3,
    Mosi = 4,
    Miso = 5,
}

impl Line {
    fn name(self) -> &'static str {
        match self {
            Line::Prog => "PROG",
            Line::Reset => "RESET",
            Line::Fcsn => "FCSN",
            Line::Sck => "SCK",
            Line::Mosi => "MOSI",
            Line::Miso => "MISO",
        }
    }
}

const LINES: [Line; 6] = [
    Line::Prog,
    Line::Reset,
    Line::Fcsn,
    Line::Sck,
    Line::Mosi,
    Line::Miso,
];

/// Default half-period delay in nanoseconds (for ~100 kHz SPI clock)
const DEFAULT_HALF_PERIOD_NS: u64 = 5000;

/// Configuration for opening a Linux GPIO programmer
#[derive(Debug, Clone)]
pub struct LinuxGpioConfig {
    /// Device path (e.g., "/dev/gpiochip0")
    pub device: String,
    /// PROG GPIO line offset
    pub prog: Offset,
    /// RESET GPIO line offset
    pub reset: Offset,
    /// FCSN (flash chip select) GPIO line offset
    pub fcsn: Offset,
    /// SCK (Clock) GPIO line offset
    pub sck: Offset,
    /// MOSI GPIO line offset
    pub mosi: Offset,
    /// MISO GPIO line offset
    pub miso: Offset,
    /// Half-period delay in nanoseconds
    pub half_period_ns: u64,
}

impl Default for LinuxGpioConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            prog: 0,
            reset: 0,
            fcsn: 0,
            sck: 0,
            mosi: 0,
            miso: 0,
            half_period_ns: DEFAULT_HALF_PERIOD_NS,
        }
    }
}

impl LinuxGpioConfig {
    /// Set SPI speed in Hz (approximate, via half-period calculation)
    pub fn with_speed_hz(mut self, hz: u32) -> Self {
        if hz > 0 {
            self.half_period_ns = 500_000_000 / hz as u64;
        }
        self
    }

    fn offset(&self, line: Line) -> Offset {
        match line {
            Line::Prog => self.prog,
            Line::Reset => self.reset,
            Line::Fcsn => self.fcsn,
            Line::Sck => self.sck,
            Line::Mosi => self.mosi,
            Line::Miso => self.miso,
        }
    }

    /// Reject configurations that wire two signals to one line
    fn check_distinct(&self) -> Result<()> {
        for (i, &a) in LINES.iter().enumerate() {
            for &b in &LINES[i + 1..] {
                if self.offset(a) == self.offset(b) {
                    return Err(LinuxGpioError::DuplicateLine {
                        offset: self.offset(a),
                        first: a.name(),
                        second: b.name(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// nRF24LE1 programmer on bit-banged GPIO lines
pub struct LinuxGpioProgrammer {
    /// GPIO line request handle
    request: Request,
    /// GPIO line offsets indexed by Line enum
    offsets: [Offset; 6],
    /// Half-period delay in nanoseconds
    half_period_ns: u64,
}

impl LinuxGpioProgrammer {
    /// Open the GPIO lines described by `config`
    ///
    /// Lines start with PROG low, RESET high and FCSN high, so the target
    /// keeps running normally until a programming session begins.
    pub fn open(config: &LinuxGpioConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxGpioError::NoDevice);
        }
        config.check_distinct()?;

        log::debug!("linux_gpio: Opening device {}", config.device);

        let mut offsets = [0u32; 6];
        for line in LINES {
            offsets[line as usize] = config.offset(line);
        }

        let mut req_config = Config::default();
        req_config.with_line(config.prog).as_output(Value::Inactive);
        req_config.with_line(config.reset).as_output(Value::Active);
        req_config.with_line(config.fcsn).as_output(Value::Active);
        req_config.with_line(config.sck).as_output(Value::Inactive);
        req_config.with_line(config.mosi).as_output(Value::Inactive);
        req_config.with_line(config.miso).as_input();

        let request = Request::from_config(req_config)
            .on_chip(&config.device)
            .with_consumer("nrfprog")
            .request()
            .map_err(|source| LinuxGpioError::LineRequestFailed {
                path: config.device.clone(),
                source,
            })?;

        log::info!(
            "linux_gpio: Opened {} (prog={}, reset={}, fcsn={}, sck={}, mosi={}, miso={})",
            config.device,
            config.prog,
            config.reset,
            config.fcsn,
            config.sck,
            config.mosi,
            config.miso
        );

        Ok(Self {
            request,
            offsets,
            half_period_ns: config.half_period_ns,
        })
    }

    fn set(&mut self, line: Line, high: bool) -> CoreResult<()> {
        let value = if high { Value::Active } else { Value::Inactive };
        self.request
            .set_value(self.offsets[line as usize], value)
            .map_err(|e| {
                log::error!("Failed to set {}: {}", line.name(), e);
                CoreError::LineControlFailed
            })
    }
}

impl BitbangSpiMaster for LinuxGpioProgrammer {
    fn set_cs(&mut self, active: bool) -> CoreResult<()> {
        self.set(Line::Fcsn, !active)
    }

    fn set_sck(&mut self, high: bool) -> CoreResult<()> {
        self.set(Line::Sck, high)
    }

    fn set_mosi(&mut self, high: bool) -> CoreResult<()> {
        self.set(Line::Mosi, high)
    }

    fn get_miso(&self) -> CoreResult<bool> {
        match self.request.value(self.offsets[Line::Miso as usize]) {
            Ok(Value::Active) => Ok(true),
            Ok(Value::Inactive) => Ok(false),
            Err(e) => {
                log::error!("Failed to get MISO: {}", e);
                Err(CoreError::TransferFailed)
            }
        }
    }

    fn half_period_delay(&self) {
        if self.half_period_ns > 0 {
            std::thread::sleep(std::time::Duration::from_nanos(self.half_period_ns));
        }
    }
}

impl SpiMaster for LinuxGpioProgrammer {
    fn max_read_len(&self) -> usize {
        usize::MAX
    }

    fn max_write_len(&self) -> usize {
        usize::MAX
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> CoreResult<()> {
        log::trace!("{} ({} bytes on the bus)", cmd.opcode, cmd.total_bytes());
        bitbang::execute(self, cmd)
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(us as u64));
    }
}

impl ControlLines for LinuxGpioProgrammer {
    fn set_line(&mut self, line: ControlLine, level: Level) -> CoreResult<()> {
        let line = match line {
            ControlLine::Prog => Line::Prog,
            ControlLine::Reset => Line::Reset,
            ControlLine::Fcsn => Line::Fcsn,
        };
        self.set(line, level.is_high())
    }
}

/// Parse programmer options into a [`LinuxGpioConfig`]
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxGpioConfig> {
    let mut config = LinuxGpioConfig::default();
    let mut have = [false; 6];
    let mut gpiochip: Option<u32> = None;

    for (key, value) in options {
        let line = match *key {
            "dev" => {
                config.device = value.to_string();
                continue;
            }
            "gpiochip" => {
                gpiochip = Some(value.parse().map_err(|_| {
                    LinuxGpioError::InvalidParameter(format!("gpiochip={}", value))
                })?);
                continue;
            }
            "spispeed" => {
                let speed_khz: u32 = value.parse().map_err(|_| {
                    LinuxGpioError::InvalidParameter(format!("spispeed={}", value))
                })?;
                config = config.with_speed_hz(speed_khz.saturating_mul(1000));
                continue;
            }
            "prog" => Line::Prog,
            "reset" => Line::Reset,
            "fcsn" | "cs" => Line::Fcsn,
            "sck" => Line::Sck,
            "mosi" => Line::Mosi,
            "miso" => Line::Miso,
            _ => {
                log::warn!("linux_gpio: Unknown option: {}={}", key, value);
                continue;
            }
        };

        let offset: Offset = value
            .parse()
            .map_err(|_| LinuxGpioError::InvalidLineNumber {
                name: line.name(),
                value: value.to_string(),
            })?;
        match line {
            Line::Prog => config.prog = offset,
            Line::Reset => config.reset = offset,
            Line::Fcsn => config.fcsn = offset,
            Line::Sck => config.sck = offset,
            Line::Mosi => config.mosi = offset,
            Line::Miso => config.miso = offset,
        }
        have[line as usize] = true;
    }

    match (config.device.is_empty(), gpiochip) {
        (true, Some(n)) => config.device = format!("/dev/gpiochip{}", n),
        (true, None) => return Err(LinuxGpioError::NoDevice),
        (false, Some(_)) => return Err(LinuxGpioError::ConflictingDevice),
        (false, None) => {}
    }

    for line in LINES {
        if !have[line as usize] {
            return Err(LinuxGpioError::MissingParameter(match line {
                Line::Prog => "prog",
                Line::Reset => "reset",
                Line::Fcsn => "fcsn",
                Line::Sck => "sck",
                Line::Mosi => "mosi",
                Line::Miso => "miso",
            }));
        }
    }

    config.check_distinct()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PINS: [(&str, &str); 6] = [
        ("prog", "24"),
        ("reset", "23"),
        ("fcsn", "8"),
        ("sck", "11"),
        ("mosi", "10"),
        ("miso", "9"),
    ];

    fn with(extra: &[(&'static str, &'static str)]) -> Vec<(&'static str, &'static str)> {
        let mut options = PINS.to_vec();
        options.extend_from_slice(extra);
        options
    }

    #[test]
    fn test_parse_full_options() {
        let config = parse_options(&with(&[("dev", "/dev/gpiochip1")])).unwrap();
        assert_eq!(config.device, "/dev/gpiochip1");
        assert_eq!(config.prog, 24);
        assert_eq!(config.reset, 23);
        assert_eq!(config.fcsn, 8);
        assert_eq!(config.sck, 11);
        assert_eq!(config.mosi, 10);
        assert_eq!(config.miso, 9);
        assert_eq!(config.half_period_ns, DEFAULT_HALF_PERIOD_NS);
    }

    #[test]
    fn test_parse_gpiochip_number_and_speed() {
        let config = parse_options(&with(&[("gpiochip", "0"), ("spispeed", "50")])).unwrap();
        assert_eq!(config.device, "/dev/gpiochip0");
        assert_eq!(config.half_period_ns, 10_000);
    }

    #[test]
    fn test_parse_requires_device() {
        assert!(matches!(
            parse_options(&PINS),
            Err(LinuxGpioError::NoDevice)
        ));
        assert!(matches!(
            parse_options(&with(&[("dev", "/dev/gpiochip0"), ("gpiochip", "0")])),
            Err(LinuxGpioError::ConflictingDevice)
        ));
    }

    #[test]
    fn test_parse_missing_line() {
        let options = [("dev", "/dev/gpiochip0"), ("prog", "24")];
        assert!(matches!(
            parse_options(&options),
            Err(LinuxGpioError::MissingParameter("reset"))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_and_duplicate_lines() {
        assert!(matches!(
            parse_options(&with(&[("dev", "/dev/gpiochip0"), ("sck", "x")])),
            Err(LinuxGpioError::InvalidLineNumber { name: "SCK", .. })
        ));
        assert!(matches!(
            parse_options(&with(&[("dev", "/dev/gpiochip0"), ("miso", "10")])),
            Err(LinuxGpioError::DuplicateLine { offset: 10, .. })
        ));
    }
}
