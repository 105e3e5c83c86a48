//! SPI command structure

use super::{FlashAddress, Opcode};

/// Maximum header length: opcode plus a two-byte address
pub const MAX_HEADER_LEN: usize = 3;

/// A single chip-select-framed SPI transaction
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the command to the buffers it references.
/// Bytes are clocked out in the order opcode, address (high then low),
/// `write_data`; then `read_buf.len()` bytes are clocked in, all without
/// releasing chip select.
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: Opcode,

    /// Address (if any)
    pub address: Option<FlashAddress>,

    /// Data to write after opcode/address
    pub write_data: &'a [u8],

    /// Buffer to read into (mutable)
    pub read_buf: &'a mut [u8],
}

impl<'a> SpiCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN, ERASE_ALL)
    pub fn simple(opcode: Opcode) -> Self {
        Self {
            opcode,
            address: None,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a read register command with no address (e.g., RDSR, RDFPCR)
    pub fn read_reg(opcode: Opcode, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: None,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a write register command with no address (e.g., WRSR, ERASE_PAGE)
    pub fn write_reg(opcode: Opcode, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: None,
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Create an addressed read command (READ)
    pub fn read(addr: FlashAddress, buf: &'a mut [u8]) -> Self {
        Self {
            opcode: Opcode::Read,
            address: Some(addr),
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create an addressed program command (PROGRAM)
    pub fn program(addr: FlashAddress, data: &'a [u8]) -> Self {
        Self {
            opcode: Opcode::Program,
            address: Some(addr),
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Number of opcode and address bytes
    pub fn header_len(&self) -> usize {
        if self.address.is_some() {
            3
        } else {
            1
        }
    }

    /// Encode opcode and address into `buf`, returning the header length
    ///
    /// `buf` must hold at least [`MAX_HEADER_LEN`] bytes.
    pub fn encode_header(&self, buf: &mut [u8]) -> usize {
        buf[0] = self.opcode.byte();
        if let Some(addr) = self.address {
            buf[1] = addr.high();
            buf[2] = addr.low();
        }
        self.header_len()
    }

    /// Calculate the total number of bytes to transfer (for timing/buffer allocation)
    pub fn total_bytes(&self) -> usize {
        self.header_len() + self.write_data.len() + self.read_buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_header() {
        let data = [0xAA, 0xBB];
        let cmd = SpiCommand::program(FlashAddress::new(0x1234), &data);
        let mut header = [0u8; MAX_HEADER_LEN];
        let len = cmd.encode_header(&mut header);
        assert_eq!(len, 3);
        assert_eq!(header, [0x02, 0x12, 0x34]);
        assert_eq!(cmd.total_bytes(), 5);
    }

    #[test]
    fn test_register_header() {
        let mut buf = [0u8; 1];
        let cmd = SpiCommand::read_reg(Opcode::Rdsr, &mut buf);
        let mut header = [0u8; MAX_HEADER_LEN];
        assert_eq!(cmd.encode_header(&mut header), 1);
        assert_eq!(header[0], 0x05);
        assert_eq!(cmd.total_bytes(), 2);
    }
}
