//! Error types for nrfprog-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate. Every variant carries the register values or
//! offsets needed to tell wiring faults, timing faults and logic faults
//! apart without re-instrumenting the programmer.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Target errors
    /// The flash status register read as 0xFF; the bus is not connected
    /// to a target in programming mode
    WiringFault,
    /// A status register write did not produce the expected bit state
    RegisterMutationFailed {
        /// FSR value read before the write
        before: u8,
        /// FSR value read back after the settle delay
        after: u8,
    },
    /// A programmed byte did not read back as written
    VerifyMismatch {
        /// Offset of the first mismatching byte within the payload
        offset: usize,
        /// Byte that was written
        expected: u8,
        /// Byte that was read back
        actual: u8,
    },
    /// The target kept RDYN set for longer than the polling ceiling
    DeviceNotReady {
        /// Number of status polls issued before giving up
        polls: u32,
    },

    // Address/size errors
    /// Address range is beyond the selected flash region
    AddressOutOfBounds {
        /// First address of the access
        address: u16,
        /// Length of the access in bytes
        len: usize,
    },
    /// Operation was called with an empty payload
    EmptyBuffer,
    /// Payload does not fit in a single bus transaction
    TransferTooLarge,

    // Programmer errors
    /// SPI transfer failed
    TransferFailed,
    /// Driving a control line failed
    LineControlFailed,
    /// A byte on the wire is not one of the protocol's opcodes
    UnknownOpcode(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WiringFault => write!(f, "flash status register read as 0xFF, check wiring"),
            Self::RegisterMutationFailed { before, after } => write!(
                f,
                "status register write failed (FSR before = 0x{:02X}, after = 0x{:02X})",
                before, after
            ),
            Self::VerifyMismatch {
                offset,
                expected,
                actual,
            } => write!(
                f,
                "verify failed at offset {}: wrote 0x{:02X}, read 0x{:02X}",
                offset, expected, actual
            ),
            Self::DeviceNotReady { polls } => {
                write!(f, "flash not ready after {} status polls", polls)
            }
            Self::AddressOutOfBounds { address, len } => write!(
                f,
                "access of {} bytes at 0x{:04X} is outside the flash region",
                len, address
            ),
            Self::EmptyBuffer => write!(f, "empty buffer"),
            Self::TransferTooLarge => write!(f, "payload exceeds programmer transaction size"),
            Self::TransferFailed => write!(f, "SPI transfer failed"),
            Self::LineControlFailed => write!(f, "failed to drive control line"),
            Self::UnknownOpcode(op) => write!(f, "unknown flash command opcode 0x{:02X}", op),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
