//! Flash controller command opcodes
//!
//! The command set is fixed by the target's flash controller and is not
//! extensible at runtime, so it is modelled as a closed enum.

use crate::error::Error;

/// One-byte command opcodes understood by the flash controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Set the flash write enable latch
    Wren = 0x06,
    /// Reset the flash write enable latch
    Wrdis = 0x04,
    /// Read the flash status register (FSR)
    Rdsr = 0x05,
    /// Write the flash status register (FSR)
    Wrsr = 0x01,
    /// Read data from flash
    Read = 0x03,
    /// Write data to flash
    Program = 0x02,
    /// Erase the addressed page
    ErasePage = 0x52,
    /// Erase all pages of the main block (and the InfoPage when INFEN is set)
    EraseAll = 0x62,
    /// Read the flash protect configuration register (FPCR)
    Rdfpcr = 0x89,
    /// Enable flash readback protection
    Rdismb = 0x85,
    /// Enable hardware debug features
    Endebug = 0x86,
}

impl Opcode {
    /// Every opcode, in datasheet order
    pub const ALL: [Opcode; 11] = [
        Opcode::Wren,
        Opcode::Wrdis,
        Opcode::Rdsr,
        Opcode::Wrsr,
        Opcode::Read,
        Opcode::Program,
        Opcode::ErasePage,
        Opcode::EraseAll,
        Opcode::Rdfpcr,
        Opcode::Rdismb,
        Opcode::Endebug,
    ];

    /// The byte sent on the wire
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Whether the command carries a 16-bit address after the opcode
    pub const fn has_address(self) -> bool {
        matches!(self, Opcode::Read | Opcode::Program)
    }

    /// Whether the command changes flash contents or protection state
    ///
    /// The device ignores these unless the write enable latch is set.
    pub const fn needs_write_enable(self) -> bool {
        matches!(
            self,
            Opcode::Program
                | Opcode::ErasePage
                | Opcode::EraseAll
                | Opcode::Rdismb
                | Opcode::Endebug
        )
    }

    /// Mnemonic used in logs
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Wren => "WREN",
            Opcode::Wrdis => "WRDIS",
            Opcode::Rdsr => "RDSR",
            Opcode::Wrsr => "WRSR",
            Opcode::Read => "READ",
            Opcode::Program => "PROGRAM",
            Opcode::ErasePage => "ERASE_PAGE",
            Opcode::EraseAll => "ERASE_ALL",
            Opcode::Rdfpcr => "RDFPCR",
            Opcode::Rdismb => "RDISMB",
            Opcode::Endebug => "ENDEBUG",
        }
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> u8 {
        op as u8
    }
}

impl TryFrom<u8> for Opcode {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        Opcode::ALL
            .iter()
            .copied()
            .find(|op| op.byte() == byte)
            .ok_or(Error::UnknownOpcode(byte))
    }
}

impl core::fmt::Display for Opcode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.byte())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_bytes() {
        assert_eq!(Opcode::Wren.byte(), 0x06);
        assert_eq!(Opcode::Wrdis.byte(), 0x04);
        assert_eq!(Opcode::Rdsr.byte(), 0x05);
        assert_eq!(Opcode::Wrsr.byte(), 0x01);
        assert_eq!(Opcode::Read.byte(), 0x03);
        assert_eq!(Opcode::Program.byte(), 0x02);
        assert_eq!(Opcode::ErasePage.byte(), 0x52);
        assert_eq!(Opcode::EraseAll.byte(), 0x62);
        assert_eq!(Opcode::Rdfpcr.byte(), 0x89);
        assert_eq!(Opcode::Rdismb.byte(), 0x85);
        assert_eq!(Opcode::Endebug.byte(), 0x86);
    }

    #[test]
    fn test_try_from_rejects_unknown() {
        assert_eq!(Opcode::try_from(0x62), Ok(Opcode::EraseAll));
        assert_eq!(Opcode::try_from(0x9F), Err(Error::UnknownOpcode(0x9F)));
    }

    #[test]
    fn test_write_enable_requirements() {
        assert!(Opcode::Program.needs_write_enable());
        assert!(Opcode::EraseAll.needs_write_enable());
        assert!(!Opcode::Wrsr.needs_write_enable());
        assert!(!Opcode::Read.needs_write_enable());
    }
}
