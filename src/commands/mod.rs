//! CLI command implementations
//!
//! Every command except `list-programmers` runs inside a
//! [`ProgrammingSession`](nrfprog_core::flash::ProgrammingSession) opened
//! by `main`, which also ends the session.

pub mod erase;
pub mod info;
mod list;
pub mod protect;
pub mod read;
pub mod verify;
pub mod write;

pub use list::list_programmers;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner for operations without measurable progress
pub(crate) fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
