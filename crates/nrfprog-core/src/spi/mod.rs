//! SPI types and command structures
//!
//! This module provides the command opcodes of the flash controller, the
//! 16-bit address type and the transaction description handed to a
//! [`SpiMaster`](crate::programmer::SpiMaster).

mod address;
mod command;
pub mod opcodes;

pub use address::FlashAddress;
pub use command::{SpiCommand, MAX_HEADER_LEN};
pub use opcodes::Opcode;
