//! Error types for the Linux GPIO programmer

use thiserror::Error;

/// Linux GPIO programmer errors
#[derive(Debug, Error)]
pub enum LinuxGpioError {
    /// Failed to request GPIO lines
    #[error("Failed to request GPIO lines on '{path}': {source}")]
    LineRequestFailed {
        path: String,
        #[source]
        source: gpiocdev::Error,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Missing required parameter
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// GPIO chip or device not specified
    #[error("No GPIO chip specified. Use dev=/dev/gpiochipN or gpiochip=N")]
    NoDevice,

    /// Both dev and gpiochip given
    #[error("Only one of 'dev' or 'gpiochip' can be specified")]
    ConflictingDevice,

    /// Invalid GPIO line number
    #[error("Invalid GPIO line number for {name}: {value}")]
    InvalidLineNumber { name: &'static str, value: String },

    /// The same GPIO line was assigned to two signals
    #[error("GPIO line {offset} assigned to both {first} and {second}")]
    DuplicateLine {
        offset: u32,
        first: &'static str,
        second: &'static str,
    },
}

/// Result type for Linux GPIO programmer operations
pub type Result<T> = std::result::Result<T, LinuxGpioError>;
