//! nRF24LE1 flash controller command sequences
//!
//! Every mutating sequence starts with a status register read so that a
//! disconnected bus (FSR reading as 0xFF) aborts before anything is
//! written. Status register writes are only trusted after the settle delay
//! and a read back.

use crate::error::{Error, Result};
use crate::fsr::FlashStatus;
use crate::programmer::{ControlLine, ControlLines, Level, SpiMaster};
use crate::spi::{FlashAddress, Opcode, SpiCommand};
use crate::timing::Timing;

/// Largest chunk read per READ transaction while verifying
const VERIFY_CHUNK: usize = 256;

/// Switch the target into or out of programming mode
///
/// Drives PROG to the requested level, then pulses RESET low so the target
/// re-initialises and latches PROG on the rising edge. There is no
/// protocol readback of the mode; callers that need confirmation probe
/// the status register afterwards.
pub fn set_programming_mode<P: SpiMaster + ControlLines + ?Sized>(
    programmer: &mut P,
    enable: bool,
    timing: &Timing,
) -> Result<()> {
    log::debug!("PROG set {}", if enable { "HIGH" } else { "LOW" });
    programmer.set_line(ControlLine::Prog, Level::from(enable))?;
    programmer.set_line(ControlLine::Reset, Level::Low)?;
    programmer.delay_ms(timing.reset_low_ms);
    programmer.set_line(ControlLine::Reset, Level::High)?;
    programmer.delay_ms(timing.reset_settle_ms);
    Ok(())
}

/// Read the raw flash status register byte
pub fn read_fsr<M: SpiMaster + ?Sized>(master: &mut M) -> Result<u8> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_reg(Opcode::Rdsr, &mut buf);
    master.execute(&mut cmd)?;
    log::trace!("FSR = 0x{:02X}", buf[0]);
    Ok(buf[0])
}

/// Read the flash status register, rejecting the disconnected sentinel
pub fn read_status<M: SpiMaster + ?Sized>(master: &mut M) -> Result<FlashStatus> {
    let status = FlashStatus::from_raw(read_fsr(master)?);
    if status.is_disconnected() {
        log::error!("FSR read as 0xFF, check your wiring!");
        return Err(Error::WiringFault);
    }
    Ok(status)
}

/// Write the flash status register
///
/// The register does not reflect the new value until `fsr_settle_us`
/// has elapsed, so this always sleeps before returning.
pub fn write_fsr<M: SpiMaster + ?Sized>(master: &mut M, value: u8, timing: &Timing) -> Result<()> {
    log::trace!("FSR <- 0x{:02X}", value);
    let data = [value];
    let mut cmd = SpiCommand::write_reg(Opcode::Wrsr, &data);
    master.execute(&mut cmd)?;
    master.delay_us(timing.fsr_settle_us);
    Ok(())
}

/// Send the Write Enable command
pub fn write_enable<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    let mut cmd = SpiCommand::simple(Opcode::Wren);
    master.execute(&mut cmd)
}

/// Send the Write Disable command
pub fn write_disable<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    let mut cmd = SpiCommand::simple(Opcode::Wrdis);
    master.execute(&mut cmd)
}

/// Wait for the RDYN (busy) bit to clear
///
/// Sleeps `poll_delay_us`, then reads the FSR, until the flash reports
/// ready. Returns the number of polls it took. More than one poll means
/// the flash was slower than its documented worst case and is logged.
///
/// # Arguments
/// * `poll_delay_us` - Delay in microseconds before each status read
/// * `max_polls` - Give up with [`Error::DeviceNotReady`] after this many
///   busy reads; `0` polls without limit
pub fn wait_ready<M: SpiMaster + ?Sized>(
    master: &mut M,
    poll_delay_us: u32,
    max_polls: u32,
) -> Result<u32> {
    let mut polls = 0u32;
    loop {
        master.delay_us(poll_delay_us);
        let status = read_status(master)?;
        polls += 1;

        if !status.is_busy() {
            break;
        }
        if max_polls != 0 && polls >= max_polls {
            log::error!(
                "Flash still busy after {} polls ({} us apart), giving up",
                polls,
                poll_delay_us
            );
            return Err(Error::DeviceNotReady { polls });
        }
    }

    if polls > 1 {
        log::info!("Waited for flash ready {} iterations", polls);
    }
    Ok(polls)
}

/// Set or clear the InfoPage enable bit and confirm it took effect
///
/// Reads the FSR (failing fast on a wiring fault), writes it back with
/// INFEN changed, waits for the register to latch and reads it again.
/// A read back of 0xFF is a wiring fault, not a set INFEN bit. The
/// before/after values are logged and returned on failure.
pub fn set_info_page<M: SpiMaster + ?Sized>(
    master: &mut M,
    enable: bool,
    timing: &Timing,
) -> Result<()> {
    let before = read_status(master)?;
    let wanted = if enable {
        before | FlashStatus::INFEN
    } else {
        before - FlashStatus::INFEN
    };

    write_fsr(master, wanted.bits(), timing)?;

    let after = read_status(master)?;
    if after.info_page_enabled() != enable {
        log::error!(
            "InfoPage {} failed (FSR before = 0x{:02X}, after = 0x{:02X})",
            if enable { "enable" } else { "disable" },
            before.bits(),
            after.bits()
        );
        return Err(Error::RegisterMutationFailed {
            before: before.bits(),
            after: after.bits(),
        });
    }

    log::debug!(
        "InfoPage {} (FSR 0x{:02X} -> 0x{:02X})",
        if enable { "enabled" } else { "disabled" },
        before.bits(),
        after.bits()
    );
    Ok(())
}

/// Program `data` starting at `addr`
///
/// Sets the write enable latch, waits for the flash to be ready and sends
/// the address and the whole payload in one PROGRAM transaction. The
/// caller is responsible for waiting until the program cycle completes.
pub fn program<M: SpiMaster + ?Sized>(
    master: &mut M,
    addr: FlashAddress,
    data: &[u8],
    timing: &Timing,
) -> Result<()> {
    if data.is_empty() {
        return Err(Error::EmptyBuffer);
    }
    if data.len() > master.max_write_len() {
        return Err(Error::TransferTooLarge);
    }

    read_status(master)?;
    write_enable(master)?;
    wait_ready(master, timing.ready_poll_us, timing.max_ready_polls)?;

    log::debug!("PROGRAM {} bytes at {}", data.len(), addr);
    let mut cmd = SpiCommand::program(addr, data);
    master.execute(&mut cmd)?;
    master.delay_us(timing.program_settle_us);
    Ok(())
}

/// Read flash contents starting at `addr` into `buf`
pub fn read<M: SpiMaster + ?Sized>(
    master: &mut M,
    addr: FlashAddress,
    buf: &mut [u8],
) -> Result<()> {
    let max_len = master.max_read_len().max(1);
    let mut offset = 0;

    while offset < buf.len() {
        let chunk_len = core::cmp::min(max_len, buf.len() - offset);
        let chunk_addr = chunk_address(addr, offset, buf.len())?;
        let chunk = &mut buf[offset..offset + chunk_len];
        let mut cmd = SpiCommand::read(chunk_addr, chunk);
        master.execute(&mut cmd)?;
        offset += chunk_len;
    }

    Ok(())
}

/// Compare flash contents starting at `addr` against `expected`
///
/// Stops at the first differing byte and reports its offset together with
/// the written and read values. Chunks after the mismatch are not read.
pub fn verify<M: SpiMaster + ?Sized>(
    master: &mut M,
    addr: FlashAddress,
    expected: &[u8],
) -> Result<()> {
    let max_len = core::cmp::min(master.max_read_len(), VERIFY_CHUNK).max(1);
    let mut buf = [0u8; VERIFY_CHUNK];
    let mut offset = 0;

    while offset < expected.len() {
        let chunk_len = core::cmp::min(max_len, expected.len() - offset);
        let chunk_addr = chunk_address(addr, offset, expected.len())?;
        let chunk = &mut buf[..chunk_len];
        let mut cmd = SpiCommand::read(chunk_addr, chunk);
        master.execute(&mut cmd)?;

        let wanted = &expected[offset..offset + chunk_len];
        if let Some(i) = chunk.iter().zip(wanted).position(|(got, want)| got != want) {
            let mismatch = Error::VerifyMismatch {
                offset: offset + i,
                expected: wanted[i],
                actual: chunk[i],
            };
            log::error!(
                "Verify failed {}: wrote 0x{:02X} read 0x{:02X}",
                offset + i,
                wanted[i],
                chunk[i]
            );
            return Err(mismatch);
        }
        offset += chunk_len;
    }

    Ok(())
}

/// Erase all pages of the main block
///
/// While the InfoPage is enabled this also erases the InfoPage, which
/// holds the factory tuning data. Back it up first.
pub fn erase_all<M: SpiMaster + ?Sized>(master: &mut M, timing: &Timing) -> Result<()> {
    read_status(master)?;
    write_enable(master)?;
    let mut cmd = SpiCommand::simple(Opcode::EraseAll);
    master.execute(&mut cmd)?;
    wait_ready(master, timing.erase_poll_us, timing.max_ready_polls)?;
    Ok(())
}

/// Erase a single page of the main block
pub fn erase_page<M: SpiMaster + ?Sized>(master: &mut M, page: u8, timing: &Timing) -> Result<()> {
    read_status(master)?;
    write_enable(master)?;
    let data = [page];
    let mut cmd = SpiCommand::write_reg(Opcode::ErasePage, &data);
    master.execute(&mut cmd)?;
    wait_ready(master, timing.erase_poll_us, timing.max_ready_polls)?;
    Ok(())
}

/// Read the flash protect configuration register (FPCR)
pub fn read_fpcr<M: SpiMaster + ?Sized>(master: &mut M) -> Result<u8> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_reg(Opcode::Rdfpcr, &mut buf);
    master.execute(&mut cmd)?;
    Ok(buf[0])
}

/// Enable readback protection of the main block
///
/// Only ERASE_ALL clears this again.
pub fn enable_readback_protection<M: SpiMaster + ?Sized>(
    master: &mut M,
    timing: &Timing,
) -> Result<()> {
    protect_command(master, Opcode::Rdismb, timing)
}

/// Enable the on-chip hardware debug interface
pub fn enable_debug<M: SpiMaster + ?Sized>(master: &mut M, timing: &Timing) -> Result<()> {
    protect_command(master, Opcode::Endebug, timing)
}

fn protect_command<M: SpiMaster + ?Sized>(
    master: &mut M,
    opcode: Opcode,
    timing: &Timing,
) -> Result<()> {
    read_status(master)?;
    write_enable(master)?;
    let mut cmd = SpiCommand::simple(opcode);
    master.execute(&mut cmd)?;
    wait_ready(master, timing.ready_poll_us, timing.max_ready_polls)?;
    Ok(())
}

fn chunk_address(start: FlashAddress, offset: usize, len: usize) -> Result<FlashAddress> {
    start.checked_add(offset).ok_or(Error::AddressOutOfBounds {
        address: start.value(),
        len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Answers RDSR from a script and records every opcode
    struct Scripted {
        statuses: [u8; 8],
        next: usize,
        log: [Option<Opcode>; 16],
        count: usize,
        slept_us: u64,
    }

    impl Scripted {
        fn new(statuses: &[u8]) -> Self {
            let mut s = [0u8; 8];
            s[..statuses.len()].copy_from_slice(statuses);
            Self {
                statuses: s,
                next: 0,
                log: [None; 16],
                count: 0,
                slept_us: 0,
            }
        }

        fn issued(&self, opcode: Opcode) -> usize {
            self.log[..self.count]
                .iter()
                .filter(|op| **op == Some(opcode))
                .count()
        }
    }

    impl SpiMaster for Scripted {
        fn max_read_len(&self) -> usize {
            64
        }

        fn max_write_len(&self) -> usize {
            64
        }

        fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
            self.log[self.count] = Some(cmd.opcode);
            self.count += 1;
            if cmd.opcode == Opcode::Rdsr {
                let idx = core::cmp::min(self.next, self.statuses.len() - 1);
                cmd.read_buf[0] = self.statuses[idx];
                self.next += 1;
            }
            Ok(())
        }

        fn delay_us(&mut self, us: u32) {
            self.slept_us += us as u64;
        }
    }

    #[test]
    fn test_wait_ready_counts_polls() {
        let mut m = Scripted::new(&[0x10, 0x10, 0x00]);
        assert_eq!(wait_ready(&mut m, 500, 10), Ok(3));
        assert_eq!(m.slept_us, 1500);
    }

    #[test]
    fn test_wait_ready_ceiling() {
        let mut m = Scripted::new(&[0x10; 8]);
        assert_eq!(
            wait_ready(&mut m, 1, 5),
            Err(Error::DeviceNotReady { polls: 5 })
        );
        assert_eq!(m.issued(Opcode::Rdsr), 5);
    }

    #[test]
    fn test_wait_ready_detects_sentinel() {
        let mut m = Scripted::new(&[0xFF]);
        assert_eq!(wait_ready(&mut m, 1, 0), Err(Error::WiringFault));
    }

    #[test]
    fn test_info_page_enable_rejects_sentinel_before_write() {
        let mut m = Scripted::new(&[0xFF]);
        let timing = Timing::default();
        assert_eq!(set_info_page(&mut m, true, &timing), Err(Error::WiringFault));
        assert_eq!(m.issued(Opcode::Wrsr), 0);
    }

    #[test]
    fn test_info_page_disable_rejects_sentinel_before_write() {
        let mut m = Scripted::new(&[0xFF]);
        let timing = Timing::default();
        assert_eq!(set_info_page(&mut m, false, &timing), Err(Error::WiringFault));
        assert_eq!(m.issued(Opcode::Wrsr), 0);
    }

    #[test]
    fn test_info_page_reports_before_and_after() {
        // The write is ignored: INFEN never shows up
        let mut m = Scripted::new(&[0x00, 0x00]);
        let timing = Timing::default();
        assert_eq!(
            set_info_page(&mut m, true, &timing),
            Err(Error::RegisterMutationFailed {
                before: 0x00,
                after: 0x00
            })
        );
        assert_eq!(m.slept_us, timing.fsr_settle_us as u64);
    }

    #[test]
    fn test_info_page_rejects_sentinel_after_write() {
        let mut m = Scripted::new(&[0x00, 0xFF]);
        let timing = Timing::default();
        assert_eq!(set_info_page(&mut m, true, &timing), Err(Error::WiringFault));
        assert_eq!(m.issued(Opcode::Wrsr), 1);
        assert_eq!(m.issued(Opcode::Rdsr), 2);
    }

    #[test]
    fn test_erase_all_refuses_on_wiring_fault() {
        let mut m = Scripted::new(&[0xFF]);
        assert_eq!(erase_all(&mut m, &Timing::default()), Err(Error::WiringFault));
        assert_eq!(m.count, 1);
        assert_eq!(m.issued(Opcode::EraseAll), 0);
    }

    #[test]
    fn test_program_rejects_oversized_payload() {
        let mut m = Scripted::new(&[0x00]);
        let data = [0u8; 65];
        assert_eq!(
            program(&mut m, FlashAddress::ZERO, &data, &Timing::default()),
            Err(Error::TransferTooLarge)
        );
        assert_eq!(m.count, 0);
    }
}
