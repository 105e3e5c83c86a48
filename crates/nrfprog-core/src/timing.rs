//! Timing contract and flash geometry of the target
//!
//! Defaults follow the nRF24LE1 flash controller: a 10 ms reset pulse,
//! a 1 ms settle after status register and program transactions, a
//! worst-case program time of about 1 ms per byte and a full-array erase
//! that is polled every 60 ms.

/// Hardware delays used by the protocol engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Timing {
    /// How long RESET is held low when switching modes
    pub reset_low_ms: u32,
    /// How long the target is given to boot after RESET is released
    pub reset_settle_ms: u32,
    /// Delay after WRSR before the FSR reflects the new value
    pub fsr_settle_us: u32,
    /// Delay after the PROGRAM transaction
    pub program_settle_us: u32,
    /// Readiness poll interval used before a PROGRAM transaction
    pub ready_poll_us: u32,
    /// Worst-case program time per byte; the post-program poll interval is
    /// this multiplied by the payload length
    pub per_byte_program_us: u32,
    /// Readiness poll interval for erase operations
    pub erase_poll_us: u32,
    /// Maximum number of status polls before giving up on a busy device
    pub max_ready_polls: u32,
}

impl Timing {
    /// Poll interval after programming `len` bytes
    pub fn program_poll_us(&self, len: usize) -> u32 {
        let len = u32::try_from(len).unwrap_or(u32::MAX);
        self.per_byte_program_us.saturating_mul(len)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            reset_low_ms: 10,
            reset_settle_ms: 10,
            fsr_settle_us: 1_000,
            program_settle_us: 1_000,
            ready_poll_us: 1_000,
            per_byte_program_us: 1_000,
            erase_poll_us: 60_000,
            max_ready_polls: 100,
        }
    }
}

/// Sizes of the target's flash regions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct FlashGeometry {
    /// Size of the main flash array in bytes
    pub main_size: usize,
    /// Size of the protected information page in bytes
    pub info_page_size: usize,
    /// Erase page size in bytes
    pub page_size: usize,
}

impl FlashGeometry {
    /// nRF24LE1: 32 pages of 512 bytes plus a 512 byte InfoPage
    pub const NRF24LE1: FlashGeometry = FlashGeometry {
        main_size: 16 * 1024,
        info_page_size: 512,
        page_size: 512,
    };

    /// Size of the region currently selected by the InfoPage switch
    pub fn region_size(&self, info_page: bool) -> usize {
        if info_page {
            self.info_page_size
        } else {
            self.main_size
        }
    }

    /// Number of erase pages in the main array
    pub fn page_count(&self) -> usize {
        if self.page_size == 0 {
            0
        } else {
            self.main_size / self.page_size
        }
    }
}

impl Default for FlashGeometry {
    fn default() -> Self {
        Self::NRF24LE1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_poll_scales_with_length() {
        let timing = Timing::default();
        assert_eq!(timing.program_poll_us(1), 1_000);
        assert_eq!(timing.program_poll_us(512), 512_000);
        assert_eq!(timing.program_poll_us(usize::MAX), u32::MAX);
    }

    #[test]
    fn test_geometry() {
        let geo = FlashGeometry::default();
        assert_eq!(geo.page_count(), 32);
        assert_eq!(geo.region_size(true), 512);
        assert_eq!(geo.region_size(false), 16384);
    }
}
