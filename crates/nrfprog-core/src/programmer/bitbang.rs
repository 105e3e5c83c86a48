//! Bitbang SPI master support
//!
//! This module provides a trait for implementing **bitbang-style** SPI
//! masters, where the clock and data lines are plain GPIOs toggled in
//! software. The flash controller samples MOSI on the rising edge of SCK
//! and shifts MISO out on the falling edge, most significant bit first
//! (SPI mode 0).
//!
//! Implementors provide the pin operations; [`execute`] turns a
//! [`SpiCommand`] into one chip-select-framed transaction.

use crate::error::Result;
use crate::spi::{SpiCommand, MAX_HEADER_LEN};

/// Trait for low-level bitbang SPI operations
pub trait BitbangSpiMaster {
    /// Set chip select (CS is active low, so `active=true` means CS=0)
    fn set_cs(&mut self, active: bool) -> Result<()>;

    /// Set clock line value
    fn set_sck(&mut self, high: bool) -> Result<()>;

    /// Set MOSI line value
    fn set_mosi(&mut self, high: bool) -> Result<()>;

    /// Get MISO line value
    fn get_miso(&self) -> Result<bool>;

    /// Delay for half a clock period
    fn half_period_delay(&self);

    /// Optional: Set SCK and MOSI atomically (optimization)
    ///
    /// Default implementation calls `set_sck` then `set_mosi`.
    fn set_sck_set_mosi(&mut self, sck: bool, mosi: bool) -> Result<()> {
        self.set_sck(sck)?;
        self.set_mosi(mosi)
    }

    /// Optional: Set SCK and get MISO atomically (optimization)
    ///
    /// Default implementation calls `set_sck` then `get_miso`.
    fn set_sck_get_miso(&mut self, sck: bool) -> Result<bool> {
        self.set_sck(sck)?;
        self.get_miso()
    }
}

/// Write a byte (MSB first)
pub fn write_byte<M: BitbangSpiMaster + ?Sized>(master: &mut M, byte: u8) -> Result<()> {
    for i in (0..8).rev() {
        let bit = (byte >> i) & 1 != 0;
        master.set_sck_set_mosi(false, bit)?;
        master.half_period_delay();
        master.set_sck(true)?;
        master.half_period_delay();
    }
    Ok(())
}

/// Read a byte (MSB first), holding MOSI low
pub fn read_byte<M: BitbangSpiMaster + ?Sized>(master: &mut M) -> Result<u8> {
    let mut byte = 0u8;
    for _ in 0..8 {
        master.set_sck_set_mosi(false, false)?;
        master.half_period_delay();
        byte <<= 1;
        if master.set_sck_get_miso(true)? {
            byte |= 1;
        }
        master.half_period_delay();
    }
    Ok(byte)
}

/// Write multiple bytes
pub fn write_bytes<M: BitbangSpiMaster + ?Sized>(master: &mut M, bytes: &[u8]) -> Result<()> {
    for &byte in bytes {
        write_byte(master, byte)?;
    }
    Ok(())
}

/// Read multiple bytes
pub fn read_bytes<M: BitbangSpiMaster + ?Sized>(master: &mut M, buf: &mut [u8]) -> Result<()> {
    for byte in buf.iter_mut() {
        *byte = read_byte(master)?;
    }
    Ok(())
}

/// Run one complete command: assert CS, clock header, payload and read
/// phase, then return SCK low and release CS
///
/// Chip select is released even when a pin operation fails part way.
pub fn execute<M: BitbangSpiMaster + ?Sized>(
    master: &mut M,
    cmd: &mut SpiCommand<'_>,
) -> Result<()> {
    let mut header = [0u8; MAX_HEADER_LEN];
    let header_len = cmd.encode_header(&mut header);

    master.set_cs(true)?;
    let result = write_bytes(master, &header[..header_len])
        .and_then(|_| write_bytes(master, cmd.write_data))
        .and_then(|_| read_bytes(master, cmd.read_buf));

    let release = master.set_sck(false).and_then(|_| {
        master.half_period_delay();
        master.set_cs(false)
    });
    master.half_period_delay();

    result.and(release)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::{FlashAddress, Opcode};

    /// Records MOSI on every rising edge and answers MISO from a fixed byte
    struct Recorder {
        cs_active: bool,
        sck: bool,
        mosi: bool,
        miso_byte: u8,
        miso_bit: u8,
        sampled: [u8; 8],
        bits: usize,
        cs_edges: usize,
    }

    impl Recorder {
        fn new(miso_byte: u8) -> Self {
            Self {
                cs_active: false,
                sck: false,
                mosi: false,
                miso_byte,
                miso_bit: 0,
                sampled: [0; 8],
                bits: 0,
                cs_edges: 0,
            }
        }
    }

    impl BitbangSpiMaster for Recorder {
        fn set_cs(&mut self, active: bool) -> Result<()> {
            if active != self.cs_active {
                self.cs_edges += 1;
            }
            self.cs_active = active;
            Ok(())
        }

        fn set_sck(&mut self, high: bool) -> Result<()> {
            if high && !self.sck && self.cs_active {
                let byte = self.bits / 8;
                if byte < self.sampled.len() {
                    self.sampled[byte] = (self.sampled[byte] << 1) | self.mosi as u8;
                }
                self.bits += 1;
            }
            self.sck = high;
            Ok(())
        }

        fn set_mosi(&mut self, high: bool) -> Result<()> {
            self.mosi = high;
            Ok(())
        }

        fn get_miso(&self) -> Result<bool> {
            Ok((self.miso_byte >> (7 - (self.miso_bit % 8))) & 1 != 0)
        }

        fn half_period_delay(&self) {}

        fn set_sck_get_miso(&mut self, sck: bool) -> Result<bool> {
            self.set_sck(sck)?;
            let bit = self.get_miso()?;
            self.miso_bit += 1;
            Ok(bit)
        }
    }

    #[test]
    fn test_header_is_msb_first() {
        let mut rec = Recorder::new(0);
        let data = [0xA5];
        let mut cmd = SpiCommand::program(FlashAddress::new(0x1234), &data);
        execute(&mut rec, &mut cmd).unwrap();

        assert_eq!(rec.bits, 32);
        assert_eq!(&rec.sampled[..4], &[0x02, 0x12, 0x34, 0xA5]);
        // one assert and one release
        assert_eq!(rec.cs_edges, 2);
        assert!(!rec.cs_active);
    }

    #[test]
    fn test_read_phase() {
        let mut rec = Recorder::new(0x5A);
        let mut buf = [0u8; 1];
        let mut cmd = SpiCommand::read_reg(Opcode::Rdsr, &mut buf);
        execute(&mut rec, &mut cmd).unwrap();
        assert_eq!(buf[0], 0x5A);
        assert_eq!(rec.sampled[0], 0x05);
    }
}
