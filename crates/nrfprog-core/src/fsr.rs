//! Flash Status Register (FSR) bit definitions

use bitflags::bitflags;

/// Raw FSR value seen when MISO floats high: no target is answering
pub const DISCONNECTED: u8 = 0xFF;

bitflags! {
    /// Flash Status Register contents
    ///
    /// Bits not named here are retained as-is so a value can be written
    /// back unchanged apart from the bit being toggled.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FlashStatus: u8 {
        /// Hardware debug interface enabled
        const DBG   = 0b1000_0000;
        /// Enable code execution start from the protected flash area
        const STP   = 0b0100_0000;
        /// Write enable latch
        const WEN   = 0b0010_0000;
        /// Flash busy flag (active low ready)
        const RDYN  = 0b0001_0000;
        /// Flash InfoPage enable
        const INFEN = 0b0000_1000;
        /// Main block readback from the SPI interface disabled
        const RDISMB = 0b0000_0100;
    }
}

impl FlashStatus {
    /// Interpret a raw register byte, keeping unnamed bits
    pub const fn from_raw(raw: u8) -> Self {
        Self::from_bits_retain(raw)
    }

    /// Whether this value is the all-ones sentinel of an unconnected bus
    pub const fn is_disconnected(self) -> bool {
        self.bits() == DISCONNECTED
    }

    /// Whether the flash is busy with a program or erase operation
    pub const fn is_busy(self) -> bool {
        self.contains(Self::RDYN)
    }

    /// Whether the write enable latch is set
    pub const fn write_enabled(self) -> bool {
        self.contains(Self::WEN)
    }

    /// Whether READ/PROGRAM currently address the InfoPage
    pub const fn info_page_enabled(self) -> bool {
        self.contains(Self::INFEN)
    }

    /// Whether main block readback protection is active
    pub const fn readback_disabled(self) -> bool {
        self.contains(Self::RDISMB)
    }

    /// Whether the on-chip debug interface is enabled
    pub const fn debug_enabled(self) -> bool {
        self.contains(Self::DBG)
    }
}

impl Default for FlashStatus {
    fn default() -> Self {
        FlashStatus::empty()
    }
}

impl core::fmt::Display for FlashStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:02X} [", self.bits())?;
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", name)?;
            first = false;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_positions() {
        assert_eq!(FlashStatus::STP.bits(), 0x40);
        assert_eq!(FlashStatus::WEN.bits(), 0x20);
        assert_eq!(FlashStatus::RDYN.bits(), 0x10);
        assert_eq!(FlashStatus::INFEN.bits(), 0x08);
        assert_eq!(FlashStatus::RDISMB.bits(), 0x04);
        assert_eq!(FlashStatus::DBG.bits(), 0x80);
    }

    #[test]
    fn test_sentinel() {
        assert!(FlashStatus::from_raw(0xFF).is_disconnected());
        assert!(!FlashStatus::from_raw(0x7F).is_disconnected());
        assert!(!FlashStatus::empty().is_disconnected());
    }

    #[test]
    fn test_unnamed_bits_are_retained() {
        let fsr = FlashStatus::from_raw(0x03);
        assert_eq!((fsr | FlashStatus::INFEN).bits(), 0x0B);
        assert_eq!((fsr - FlashStatus::INFEN).bits(), 0x03);
    }

    #[test]
    fn test_flags() {
        let fsr = FlashStatus::from_raw(0x38);
        assert!(fsr.is_busy());
        assert!(fsr.write_enabled());
        assert!(fsr.info_page_enabled());
        assert!(!FlashStatus::from_raw(0x08).is_busy());
        assert!(FlashStatus::from_raw(0x84).readback_disabled());
        assert!(FlashStatus::from_raw(0x84).debug_enabled());
    }

    #[test]
    fn test_display_lists_set_bits() {
        extern crate std;
        use std::string::ToString;
        assert_eq!(FlashStatus::from_raw(0x28).to_string(), "0x28 [WEN INFEN]");
        assert_eq!(FlashStatus::empty().to_string(), "0x00 []");
    }
}
