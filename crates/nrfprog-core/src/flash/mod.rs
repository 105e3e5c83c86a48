//! Programming sessions and composed flash operations
//!
//! A [`ProgrammingSession`] exists exactly while the target is held in
//! programming mode. All flash operations are methods on it, so a mutating
//! command cannot be issued to a target that is not in programming mode.

mod session;

pub use session::{ProgrammingSession, SessionConfig};
