//! Programming session

use crate::error::{Error, Result};
use crate::fsr::FlashStatus;
use crate::programmer::{ControlLine, Level, Programmer};
use crate::protocol;
use crate::spi::FlashAddress;
use crate::timing::{FlashGeometry, Timing};

/// Settings for one programming session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Hardware delays
    pub timing: Timing,
    /// Region sizes used for bounds checks
    pub geometry: FlashGeometry,
    /// Read the FSR right after entering programming mode and fail with
    /// [`Error::WiringFault`] if nothing answers
    pub probe_on_entry: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timing: Timing::default(),
            geometry: FlashGeometry::default(),
            probe_on_entry: true,
        }
    }
}

/// The target held in programming mode
///
/// Created by [`ProgrammingSession::begin`], which pulses the target into
/// programming mode, and ended by [`ProgrammingSession::finish`], which
/// returns it to normal mode. Dropping an unfinished session also returns
/// the target to normal mode; failures there can only be logged.
///
/// The session borrows the programmer, so the bus and control lines have
/// exactly one owner for its duration.
pub struct ProgrammingSession<'a, P: Programmer + ?Sized> {
    programmer: &'a mut P,
    config: SessionConfig,
    info_page: bool,
    active: bool,
}

impl<'a, P: Programmer + ?Sized> ProgrammingSession<'a, P> {
    /// Put the target into programming mode
    ///
    /// Releases FCSN, drives PROG high and pulses RESET. With
    /// `probe_on_entry` the FSR is read once; a target that did not enter
    /// programming mode leaves MISO floating and reads as 0xFF, in which
    /// case the target is returned to normal mode and
    /// [`Error::WiringFault`] is returned.
    pub fn begin(programmer: &'a mut P, config: SessionConfig) -> Result<Self> {
        programmer.set_line(ControlLine::Fcsn, Level::High)?;

        let mut session = Self {
            programmer,
            config,
            info_page: false,
            active: true,
        };
        protocol::set_programming_mode(session.programmer, true, &session.config.timing)?;

        if session.config.probe_on_entry {
            let status = protocol::read_status(session.programmer)?;
            log::info!("Target in programming mode (FSR {})", status);
            session.info_page = status.info_page_enabled();
        }

        Ok(session)
    }

    /// Return the target to normal mode
    pub fn finish(mut self) -> Result<()> {
        self.active = false;
        protocol::set_programming_mode(self.programmer, false, &self.config.timing)
    }

    /// Session settings
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether READ/PROGRAM currently address the InfoPage
    pub fn info_page_enabled(&self) -> bool {
        self.info_page
    }

    /// Read the raw flash status register
    pub fn read_fsr(&mut self) -> Result<u8> {
        protocol::read_fsr(self.programmer)
    }

    /// Read and decode the flash status register
    pub fn status(&mut self) -> Result<FlashStatus> {
        protocol::read_status(self.programmer)
    }

    /// Write the flash status register and wait for it to latch
    ///
    /// This is the raw register write; the tracked InfoPage state only
    /// follows [`enable_info_page`](Self::enable_info_page) and
    /// [`disable_info_page`](Self::disable_info_page).
    pub fn write_fsr(&mut self, value: u8) -> Result<()> {
        protocol::write_fsr(self.programmer, value, &self.config.timing)
    }

    /// Set the write enable latch
    pub fn write_enable(&mut self) -> Result<()> {
        protocol::write_enable(self.programmer)
    }

    /// Clear the write enable latch
    pub fn write_disable(&mut self) -> Result<()> {
        protocol::write_disable(self.programmer)
    }

    /// Block until the flash reports ready, polling every `poll_delay_us`
    ///
    /// Returns the number of polls taken.
    pub fn wait_ready(&mut self, poll_delay_us: u32) -> Result<u32> {
        protocol::wait_ready(
            self.programmer,
            poll_delay_us,
            self.config.timing.max_ready_polls,
        )
    }

    /// Map READ/PROGRAM onto the protected InfoPage
    pub fn enable_info_page(&mut self) -> Result<()> {
        protocol::set_info_page(self.programmer, true, &self.config.timing)?;
        self.info_page = true;
        Ok(())
    }

    /// Map READ/PROGRAM back onto the main flash array
    pub fn disable_info_page(&mut self) -> Result<()> {
        protocol::set_info_page(self.programmer, false, &self.config.timing)?;
        self.info_page = false;
        Ok(())
    }

    /// Program `data` at `addr` without waiting for completion or verifying
    pub fn program(&mut self, data: &[u8], addr: FlashAddress) -> Result<()> {
        self.check_range(addr, data.len())?;
        protocol::program(self.programmer, addr, data, &self.config.timing)
    }

    /// Read `buf.len()` bytes starting at `addr`
    pub fn read(&mut self, addr: FlashAddress, buf: &mut [u8]) -> Result<()> {
        self.check_range(addr, buf.len())?;
        protocol::read(self.programmer, addr, buf)
    }

    /// Compare flash contents at `addr` against `expected`
    pub fn verify(&mut self, expected: &[u8], addr: FlashAddress) -> Result<()> {
        self.check_range(addr, expected.len())?;
        protocol::verify(self.programmer, addr, expected)
    }

    /// Program a named payload, wait for each program cycle and verify it
    ///
    /// The payload is sent in PROGRAM transactions no longer than the
    /// programmer's `max_write_len()` that never cross a flash page. The
    /// readiness poll interval scales with each transaction's length so
    /// the read back never races an unfinished program cycle. A mismatch
    /// offset is relative to the start of `data`.
    pub fn program_and_verify(&mut self, name: &str, data: &[u8], addr: FlashAddress) -> Result<()> {
        self.check_range(addr, data.len())?;

        let page_size = self.config.geometry.page_size.max(1);
        let max_len = self.programmer.max_write_len().max(1);

        log::info!("Program {} ({} bytes at {})", name, data.len(), addr);
        let mut offset = 0;
        while offset < data.len() {
            let chunk_addr = addr.checked_add(offset).ok_or(Error::AddressOutOfBounds {
                address: addr.value(),
                len: data.len(),
            })?;
            let to_page_end = page_size - chunk_addr.value() as usize % page_size;
            let len = max_len.min(to_page_end).min(data.len() - offset);
            let chunk = &data[offset..offset + len];

            self.write_enable()?;
            protocol::program(self.programmer, chunk_addr, chunk, &self.config.timing)?;
            let poll_us = self.config.timing.program_poll_us(len);
            self.wait_ready(poll_us)?;
            offset += len;
        }

        log::info!("Verify {}", name);
        protocol::verify(self.programmer, addr, data)
    }

    /// Erase the whole main array
    ///
    /// With the InfoPage enabled the InfoPage is erased as well.
    pub fn erase_all(&mut self) -> Result<()> {
        if self.info_page {
            log::warn!("Erasing with InfoPage enabled: InfoPage contents will be lost");
        }
        protocol::erase_all(self.programmer, &self.config.timing)
    }

    /// Erase one page of the main array
    pub fn erase_page(&mut self, page: u8) -> Result<()> {
        let geometry = self.config.geometry;
        if page as usize >= geometry.page_count() {
            return Err(Error::AddressOutOfBounds {
                address: (page as usize * geometry.page_size) as u16,
                len: geometry.page_size,
            });
        }
        protocol::erase_page(self.programmer, page, &self.config.timing)
    }

    /// Read the flash protect configuration register
    pub fn read_fpcr(&mut self) -> Result<u8> {
        protocol::read_fpcr(self.programmer)
    }

    /// Permanently disable external readback of the main block
    pub fn enable_readback_protection(&mut self) -> Result<()> {
        protocol::enable_readback_protection(self.programmer, &self.config.timing)
    }

    /// Enable the on-chip hardware debug interface
    pub fn enable_debug(&mut self) -> Result<()> {
        protocol::enable_debug(self.programmer, &self.config.timing)
    }

    /// Read the InfoPage into `buf`, restoring main array access afterwards
    pub fn read_info_page(&mut self, buf: &mut [u8]) -> Result<()> {
        self.enable_info_page()?;
        let read = self.read(FlashAddress::ZERO, buf);
        let restore = self.disable_info_page();
        read.and(restore)
    }

    fn check_range(&self, addr: FlashAddress, len: usize) -> Result<()> {
        if len == 0 {
            return Err(Error::EmptyBuffer);
        }
        let region = self.config.geometry.region_size(self.info_page);
        if !addr.range_fits(len, region) {
            return Err(Error::AddressOutOfBounds {
                address: addr.value(),
                len,
            });
        }
        Ok(())
    }
}

impl<P: Programmer + ?Sized> Drop for ProgrammingSession<'_, P> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Err(e) = protocol::set_programming_mode(self.programmer, false, &self.config.timing) {
            log::warn!("Failed to return target to normal mode: {}", e);
        }
    }
}
