//! nrfprog-core - Flash controller protocol engine
//!
//! This crate implements the command protocol spoken by the on-chip flash
//! controller of nRF24LE1-class microcontrollers while they are held in
//! programming mode. It is `no_std` compatible; all hardware access goes
//! through the [`programmer::SpiMaster`] and [`programmer::ControlLines`]
//! traits so the same engine drives real GPIO hardware and the in-memory
//! simulator used by the tests.
//!
//! # Features
//!
//! - `std` - Enable standard library support (implies `serde`)
//! - `serde` - Deserialize [`Timing`] and [`FlashGeometry`] from config files
//!
//! # Example
//!
//! ```ignore
//! use nrfprog_core::flash::{ProgrammingSession, SessionConfig};
//! use nrfprog_core::spi::FlashAddress;
//!
//! fn flash_firmware<P: nrfprog_core::programmer::Programmer>(
//!     programmer: &mut P,
//!     image: &[u8],
//! ) -> nrfprog_core::Result<()> {
//!     let mut session = ProgrammingSession::begin(programmer, SessionConfig::default())?;
//!     session.erase_all()?;
//!     session.program_and_verify("firmware", image, FlashAddress::ZERO)?;
//!     session.finish()
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "std")]
extern crate std;

pub mod error;
pub mod flash;
pub mod fsr;
pub mod programmer;
pub mod protocol;
pub mod spi;
pub mod timing;

pub use error::{Error, Result};
pub use fsr::FlashStatus;
pub use timing::{FlashGeometry, Timing};
