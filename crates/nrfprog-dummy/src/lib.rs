//! nrfprog-dummy - In-memory flash controller emulator for testing
//!
//! This crate provides a dummy programmer with a simulated target attached.
//! It models the parts of the target that the protocol depends on:
//!
//! - programming mode is latched from PROG on the rising edge of RESET,
//!   and only if RESET was held low long enough; outside programming mode
//!   nothing drives MISO and every byte reads as 0xFF
//! - status register writes become visible only after a latch delay
//! - PROGRAM, ERASE_PAGE, ERASE_ALL, RDISMB and ENDEBUG are ignored unless
//!   the write enable latch is set, and clear it again
//! - program and erase cycles keep RDYN set for a time proportional to
//!   the work, on a virtual clock advanced by [`SpiMaster::delay_us`]
//! - programming only clears bits; erasing sets them back to 0xFF
//!
//! Faults can be injected to exercise the error paths.

#![no_std]

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use nrfprog_core::error::{Error, Result};
use nrfprog_core::fsr::FlashStatus;
use nrfprog_core::programmer::{ControlLine, ControlLines, Level, SpiMaster};
use nrfprog_core::spi::{Opcode, SpiCommand, MAX_HEADER_LEN};
use nrfprog_core::FlashGeometry;

/// Value of an erased flash byte
pub const ERASED: u8 = 0xFF;

/// FSR bits that WRSR can change
const WRITABLE_FSR: FlashStatus = FlashStatus::STP.union(FlashStatus::INFEN);

/// Configuration for the simulated target
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Flash region sizes
    pub geometry: FlashGeometry,
    /// Shortest RESET low pulse the target reacts to
    pub min_reset_pulse_us: u64,
    /// Time after RESET release before the flash controller answers
    pub boot_us: u64,
    /// Time for a WRSR to become visible
    pub fsr_latch_us: u64,
    /// Program time per byte
    pub program_us_per_byte: u64,
    /// Single page erase time
    pub erase_page_us: u64,
    /// Full array erase time
    pub erase_all_us: u64,
    /// Largest READ transaction accepted
    pub max_read_len: usize,
    /// Largest PROGRAM transaction accepted
    pub max_write_len: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            geometry: FlashGeometry::NRF24LE1,
            min_reset_pulse_us: 1_000,
            boot_us: 1_000,
            fsr_latch_us: 500,
            program_us_per_byte: 43,
            erase_page_us: 22_500,
            erase_all_us: 22_500,
            max_read_len: 4096,
            max_write_len: 1024,
        }
    }
}

/// Dummy programmer with a simulated nRF24LE1 attached
pub struct DummyNrf {
    config: DummyConfig,
    main: Vec<u8>,
    info_page: Vec<u8>,
    fsr: FlashStatus,
    pending_fsr: Option<(FlashStatus, u64)>,
    fpcr: u8,
    readback_protected: bool,
    debug_enabled: bool,
    now_us: u64,
    busy_until: u64,
    ready_at: u64,
    prog: Level,
    reset: Level,
    fcsn: Level,
    reset_low_since: Option<u64>,
    programming_mode: bool,
    disconnected: bool,
    stuck_busy: bool,
    ignore_status_writes: bool,
    transactions: Vec<Opcode>,
    ignored: usize,
}

impl DummyNrf {
    /// Create a new simulated target with erased flash
    pub fn new(config: DummyConfig) -> Self {
        let main = vec![ERASED; config.geometry.main_size];
        let info_page = vec![ERASED; config.geometry.info_page_size];
        Self {
            config,
            main,
            info_page,
            fsr: FlashStatus::empty(),
            pending_fsr: None,
            fpcr: ERASED,
            readback_protected: false,
            debug_enabled: false,
            now_us: 0,
            busy_until: 0,
            ready_at: 0,
            prog: Level::Low,
            reset: Level::High,
            fcsn: Level::High,
            reset_low_since: None,
            programming_mode: false,
            disconnected: false,
            stuck_busy: false,
            ignore_status_writes: false,
            transactions: Vec::new(),
            ignored: 0,
        }
    }

    /// Create a simulated nRF24LE1 with default timing
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a simulated target with pre-filled main flash and InfoPage
    pub fn with_data(config: DummyConfig, main: &[u8], info_page: &[u8]) -> Self {
        let mut dummy = Self::new(config);
        let len = core::cmp::min(main.len(), dummy.main.len());
        dummy.main[..len].copy_from_slice(&main[..len]);
        let len = core::cmp::min(info_page.len(), dummy.info_page.len());
        dummy.info_page[..len].copy_from_slice(&info_page[..len]);
        dummy
    }

    /// Main flash contents
    pub fn main(&self) -> &[u8] {
        &self.main
    }

    /// Mutable main flash contents, for corrupting data behind the
    /// programmer's back
    pub fn main_mut(&mut self) -> &mut [u8] {
        &mut self.main
    }

    /// InfoPage contents
    pub fn info_page(&self) -> &[u8] {
        &self.info_page
    }

    /// Mutable InfoPage contents
    pub fn info_page_mut(&mut self) -> &mut [u8] {
        &mut self.info_page
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Current FSR as the target would report it
    pub fn fsr(&self) -> FlashStatus {
        let mut fsr = self.fsr;
        if let Some((pending, at)) = self.pending_fsr {
            if self.now_us >= at {
                fsr = (fsr - WRITABLE_FSR) | pending;
            }
        }
        if self.is_busy() {
            fsr |= FlashStatus::RDYN;
        }
        if self.readback_protected {
            fsr |= FlashStatus::RDISMB;
        }
        if self.debug_enabled {
            fsr |= FlashStatus::DBG;
        }
        fsr
    }

    /// Whether the target latched programming mode at its last reset
    pub fn in_programming_mode(&self) -> bool {
        self.programming_mode
    }

    /// Whether RDISMB has been executed since the last ERASE_ALL
    pub fn readback_protected(&self) -> bool {
        self.readback_protected
    }

    /// Set the flash protect configuration register (unprotected pages)
    pub fn set_fpcr(&mut self, fpcr: u8) {
        self.fpcr = fpcr;
    }

    /// Whether ENDEBUG has been executed
    pub fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    /// Virtual time elapsed, in microseconds
    pub fn elapsed_us(&self) -> u64 {
        self.now_us
    }

    /// Last level driven on a control line
    pub fn line(&self, line: ControlLine) -> Level {
        match line {
            ControlLine::Prog => self.prog,
            ControlLine::Reset => self.reset,
            ControlLine::Fcsn => self.fcsn,
        }
    }

    /// Every opcode sent on the bus, in order
    pub fn transactions(&self) -> &[Opcode] {
        &self.transactions
    }

    /// Number of transactions with the given opcode
    pub fn count(&self, opcode: Opcode) -> usize {
        self.transactions.iter().filter(|op| **op == opcode).count()
    }

    /// Forget the transaction log
    pub fn clear_transactions(&mut self) {
        self.transactions.clear();
    }

    /// Number of commands the target ignored (busy, or write latch clear)
    pub fn ignored_commands(&self) -> usize {
        self.ignored
    }

    /// Simulate a broken MISO connection: every byte reads as 0xFF
    pub fn set_disconnected(&mut self, disconnected: bool) {
        self.disconnected = disconnected;
    }

    /// Keep RDYN set forever after the next program or erase
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Silently drop WRSR commands
    pub fn set_ignore_status_writes(&mut self, ignore: bool) {
        self.ignore_status_writes = ignore;
    }

    fn is_busy(&self) -> bool {
        self.now_us < self.busy_until
    }

    fn responding(&self) -> bool {
        self.programming_mode && !self.disconnected && self.now_us >= self.ready_at
    }

    fn latch_pending_fsr(&mut self) {
        if let Some((pending, at)) = self.pending_fsr {
            if self.now_us >= at {
                self.fsr = (self.fsr - WRITABLE_FSR) | pending;
                self.pending_fsr = None;
            }
        }
    }

    fn start_cycle(&mut self, duration_us: u64) {
        self.busy_until = if self.stuck_busy {
            u64::MAX
        } else {
            self.now_us + duration_us
        };
    }

    /// Consume the write enable latch, or report the command as ignored
    fn take_write_enable(&mut self, opcode: Opcode) -> bool {
        if !self.fsr.contains(FlashStatus::WEN) {
            log::warn!("dummy: {} ignored, write enable latch not set", opcode.name());
            self.ignored += 1;
            return false;
        }
        self.fsr.remove(FlashStatus::WEN);
        true
    }

    fn region(&self) -> &[u8] {
        if self.fsr.info_page_enabled() {
            &self.info_page
        } else {
            &self.main
        }
    }

    fn handle_read(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        let addr = cmd.address.map(|a| a.value()).unwrap_or(0) as usize;
        let len = cmd.read_buf.len();
        let protected = self.readback_protected && !self.fsr.info_page_enabled();
        let region = self.region();

        if addr + len > region.len() {
            return Err(Error::AddressOutOfBounds {
                address: addr as u16,
                len,
            });
        }

        if protected {
            cmd.read_buf.fill(0x00);
        } else {
            cmd.read_buf.copy_from_slice(&region[addr..addr + len]);
        }
        Ok(())
    }

    fn handle_program(&mut self, cmd: &SpiCommand<'_>) -> Result<()> {
        let addr = cmd.address.map(|a| a.value()).unwrap_or(0) as usize;
        let data = cmd.write_data;
        let region = if self.fsr.info_page_enabled() {
            &mut self.info_page
        } else {
            &mut self.main
        };

        if addr + data.len() > region.len() {
            return Err(Error::AddressOutOfBounds {
                address: addr as u16,
                len: data.len(),
            });
        }

        // Flash programming: can only change 1 -> 0
        for (cell, &byte) in region[addr..addr + data.len()].iter_mut().zip(data) {
            *cell &= byte;
        }

        self.start_cycle(self.config.program_us_per_byte * data.len() as u64);
        Ok(())
    }

    fn handle_erase_page(&mut self, cmd: &SpiCommand<'_>) -> Result<()> {
        let page = cmd.write_data.first().copied().unwrap_or(0) as usize;
        let size = self.config.geometry.page_size;
        let start = page * size;
        if start + size > self.main.len() {
            return Err(Error::AddressOutOfBounds {
                address: start as u16,
                len: size,
            });
        }

        self.main[start..start + size].fill(ERASED);
        self.start_cycle(self.config.erase_page_us);
        Ok(())
    }

    fn handle_erase_all(&mut self) {
        self.main.fill(ERASED);
        if self.fsr.info_page_enabled() {
            self.info_page.fill(ERASED);
        }
        self.readback_protected = false;
        self.start_cycle(self.config.erase_all_us);
    }
}

impl SpiMaster for DummyNrf {
    fn max_read_len(&self) -> usize {
        self.config.max_read_len
    }

    fn max_write_len(&self) -> usize {
        self.config.max_write_len
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        self.transactions.push(cmd.opcode);
        self.latch_pending_fsr();

        if !self.responding() {
            // Nothing drives MISO
            cmd.read_buf.fill(0xFF);
            return Ok(());
        }

        if cmd.opcode != Opcode::Rdsr && self.is_busy() {
            log::warn!("dummy: {} ignored, flash busy", cmd.opcode.name());
            self.ignored += 1;
            cmd.read_buf.fill(0xFF);
            return Ok(());
        }

        // Decode what the target would see on MOSI
        let mut header = [0u8; MAX_HEADER_LEN];
        let header_len = cmd.encode_header(&mut header);
        let opcode = Opcode::try_from(header[0])?;
        if (header_len > 1) != opcode.has_address() {
            log::warn!("dummy: {} framed with wrong address field", opcode.name());
            return Err(Error::TransferFailed);
        }

        if opcode.needs_write_enable() && !self.take_write_enable(opcode) {
            return Ok(());
        }

        match opcode {
            Opcode::Wren => {
                self.fsr.insert(FlashStatus::WEN);
                Ok(())
            }
            Opcode::Wrdis => {
                self.fsr.remove(FlashStatus::WEN);
                Ok(())
            }
            Opcode::Rdsr => {
                let fsr = self.fsr().bits();
                cmd.read_buf.fill(fsr);
                Ok(())
            }
            Opcode::Wrsr => {
                if let Some(&value) = cmd.write_data.first() {
                    if self.ignore_status_writes {
                        self.ignored += 1;
                    } else {
                        let bits = FlashStatus::from_raw(value) & WRITABLE_FSR;
                        self.pending_fsr = Some((bits, self.now_us + self.config.fsr_latch_us));
                    }
                }
                Ok(())
            }
            Opcode::Read => self.handle_read(cmd),
            Opcode::Program => self.handle_program(cmd),
            Opcode::ErasePage => self.handle_erase_page(cmd),
            Opcode::EraseAll => {
                self.handle_erase_all();
                Ok(())
            }
            Opcode::Rdfpcr => {
                cmd.read_buf.fill(self.fpcr);
                Ok(())
            }
            Opcode::Rdismb => {
                self.readback_protected = true;
                self.start_cycle(self.config.program_us_per_byte);
                Ok(())
            }
            Opcode::Endebug => {
                self.debug_enabled = true;
                self.start_cycle(self.config.program_us_per_byte);
                Ok(())
            }
        }
    }

    fn delay_us(&mut self, us: u32) {
        // Virtual clock, no real sleeping
        self.now_us += us as u64;
    }
}

impl ControlLines for DummyNrf {
    fn set_line(&mut self, line: ControlLine, level: Level) -> Result<()> {
        log::trace!("dummy: {} -> {:?} at {} us", line.name(), level, self.now_us);
        match line {
            ControlLine::Prog => self.prog = level,
            ControlLine::Fcsn => self.fcsn = level,
            ControlLine::Reset => {
                match (self.reset, level) {
                    (Level::High, Level::Low) => {
                        self.reset_low_since = Some(self.now_us);
                        self.programming_mode = false;
                    }
                    (Level::Low, Level::High) => {
                        let held = self
                            .reset_low_since
                            .map(|since| self.now_us - since)
                            .unwrap_or(0);
                        if held >= self.config.min_reset_pulse_us {
                            self.programming_mode = self.prog.is_high();
                            self.fsr = FlashStatus::empty();
                            self.pending_fsr = None;
                            self.busy_until = self.now_us;
                            self.ready_at = self.now_us + self.config.boot_us;
                        } else {
                            log::warn!("dummy: reset pulse of {} us too short, ignored", held);
                        }
                        self.reset_low_since = None;
                    }
                    _ => {}
                }
                self.reset = level;
            }
        }
        Ok(())
    }
}
