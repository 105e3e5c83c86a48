//! Protocol implementations
//!
//! This module contains the command sequences of the target's flash
//! controller as free functions over any [`SpiMaster`](crate::programmer::SpiMaster).
//! They assume the target is already in programming mode; the
//! [`flash`](crate::flash) module adds the session, bounds checks and the
//! composed program/verify flow on top.

mod nrf24le1;

pub use nrf24le1::*;
