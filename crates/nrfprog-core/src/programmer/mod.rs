//! Programmer traits and abstractions
//!
//! This module defines the hardware capabilities the protocol engine needs:
//! one chip-select-framed SPI transaction at a time, a blocking delay, and
//! the PROG/RESET/FCSN control lines.

pub mod bitbang;
mod traits;

pub use bitbang::BitbangSpiMaster;
pub use traits::*;
