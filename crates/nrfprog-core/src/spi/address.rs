//! Flash address type

/// A 16-bit flash address
///
/// The same address range selects the main flash array or, while the
/// InfoPage is enabled in the FSR, the protected information page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlashAddress(u16);

impl FlashAddress {
    /// Address 0x0000
    pub const ZERO: FlashAddress = FlashAddress(0);

    /// Create an address from its 16-bit value
    pub const fn new(addr: u16) -> Self {
        Self(addr)
    }

    /// Create an address from high and low bytes
    pub const fn from_bytes(high: u8, low: u8) -> Self {
        Self(u16::from_be_bytes([high, low]))
    }

    /// The raw 16-bit value
    pub const fn value(self) -> u16 {
        self.0
    }

    /// High address byte (sent first)
    pub const fn high(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Low address byte (sent second)
    pub const fn low(self) -> u8 {
        self.0 as u8
    }

    /// Wire encoding: high byte, then low byte
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Address `offset` bytes further on, or `None` past 0xFFFF
    pub fn checked_add(self, offset: usize) -> Option<Self> {
        let offset = u16::try_from(offset).ok()?;
        self.0.checked_add(offset).map(Self)
    }

    /// Whether `len` bytes starting here fit inside a region of `region_size`
    /// bytes starting at address zero
    pub fn range_fits(self, len: usize, region_size: usize) -> bool {
        (self.0 as usize)
            .checked_add(len)
            .is_some_and(|end| end <= region_size)
    }
}

impl From<u16> for FlashAddress {
    fn from(addr: u16) -> Self {
        Self(addr)
    }
}

impl From<FlashAddress> for u16 {
    fn from(addr: FlashAddress) -> u16 {
        addr.0
    }
}

impl core::fmt::Display for FlashAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_split() {
        let addr = FlashAddress::new(0x3A5C);
        assert_eq!(addr.high(), 0x3A);
        assert_eq!(addr.low(), 0x5C);
        assert_eq!(addr.to_be_bytes(), [0x3A, 0x5C]);
        assert_eq!(FlashAddress::from_bytes(0x3A, 0x5C), addr);
    }

    #[test]
    fn test_range_fits() {
        assert!(FlashAddress::new(0).range_fits(16384, 16384));
        assert!(FlashAddress::new(0x3FFF).range_fits(1, 16384));
        assert!(!FlashAddress::new(0x3FFF).range_fits(2, 16384));
        assert!(!FlashAddress::new(0x0200).range_fits(1, 512));
    }

    #[test]
    fn test_checked_add() {
        assert_eq!(
            FlashAddress::new(0x00FE).checked_add(4),
            Some(FlashAddress::new(0x0102))
        );
        assert_eq!(FlashAddress::new(0xFFFF).checked_add(1), None);
        assert_eq!(FlashAddress::ZERO.checked_add(0x1_0000), None);
    }
}
