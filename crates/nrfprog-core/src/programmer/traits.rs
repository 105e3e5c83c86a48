//! Programmer trait definitions

use crate::error::Result;
use crate::spi::SpiCommand;

/// Logical level of a control line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Driven low
    Low,
    /// Driven high
    High,
}

impl Level {
    /// Whether this is [`Level::High`]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Discrete signal lines between the programmer and the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlLine {
    /// Programming-mode enable (PROG), sampled when RESET is released
    Prog,
    /// Target reset, active low
    Reset,
    /// Flash chip select, active low
    Fcsn,
}

impl ControlLine {
    /// Pin name used in logs and option strings
    pub const fn name(self) -> &'static str {
        match self {
            ControlLine::Prog => "prog",
            ControlLine::Reset => "reset",
            ControlLine::Fcsn => "fcsn",
        }
    }
}

/// SPI Master trait
///
/// This trait represents a programmer that can execute SPI commands
/// against the target's flash controller.
///
/// ## Example
///
/// ```ignore
/// impl SpiMaster for MyProgrammer {
///     fn max_read_len(&self) -> usize { 64 }
///     fn max_write_len(&self) -> usize { 1024 }
///
///     fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
///         let mut header = [0u8; MAX_HEADER_LEN];
///         let len = cmd.encode_header(&mut header);
///         self.transfer(&header[..len], cmd.write_data, cmd.read_buf)
///     }
///
///     fn delay_us(&mut self, us: u32) {
///         std::thread::sleep(std::time::Duration::from_micros(us as u64));
///     }
/// }
/// ```
pub trait SpiMaster {
    /// Get the maximum number of bytes that can be read in a single transaction
    fn max_read_len(&self) -> usize;

    /// Get the maximum number of bytes that can be written in a single transaction
    fn max_write_len(&self) -> usize;

    /// Execute a single SPI command
    ///
    /// Chip select is asserted before the opcode and released only after
    /// the last byte of `read_buf` has been clocked in. A command whose
    /// payload is split across two chip select frames is a different
    /// command to the flash controller.
    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()>;

    /// Delay for the specified number of microseconds
    ///
    /// Every protocol wait goes through here, so simulated programmers can
    /// advance a virtual clock instead of sleeping.
    fn delay_us(&mut self, us: u32);

    /// Delay for the specified number of milliseconds
    fn delay_ms(&mut self, ms: u32) {
        self.delay_us(ms.saturating_mul(1000));
    }
}

/// Control line trait
///
/// Drives the PROG, RESET and FCSN lines to a logical level.
pub trait ControlLines {
    /// Set `line` to `level`
    fn set_line(&mut self, line: ControlLine, level: Level) -> Result<()>;
}

/// A complete programmer: SPI bus plus control lines
///
/// Implemented automatically for everything that provides both halves,
/// including `dyn Programmer`.
pub trait Programmer: SpiMaster + ControlLines {}

impl<T: SpiMaster + ControlLines + ?Sized> Programmer for T {}

/// Information about a programmer
#[derive(Debug, Clone)]
pub struct ProgrammerInfo {
    /// Name of the programmer
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Description
    pub description: &'static str,
    /// Whether this programmer requires elevated privileges
    pub requires_root: bool,
}
