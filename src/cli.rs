//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal byte count
fn parse_size(s: &str) -> Result<usize, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<usize>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "nrfprog")]
#[command(author, version, about = "In-system flash programmer for nRF24LE1 microcontrollers", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (TOML). Defaults to ./nrfprog.toml if present
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Programmer to use, as name[:key=value,...] (see list-programmers)
    #[arg(short, long, global = true)]
    pub programmer: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log filter for the requested verbosity; `RUST_LOG` overrides it
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show flash status and protection state
    Info,

    /// Read flash contents to file
    Read {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Read the InfoPage instead of the main array
        #[arg(long)]
        infopage: bool,

        /// Number of bytes to read (hex or decimal, default: whole region)
        #[arg(short, long, value_parser = parse_size)]
        length: Option<usize>,
    },

    /// Erase, program and verify a firmware image
    Write {
        /// Firmware image, programmed at address 0
        #[arg(short, long)]
        input: PathBuf,

        /// Also replace the InfoPage with this image (erases the InfoPage)
        #[arg(long, conflicts_with = "no_erase")]
        infopage_image: Option<PathBuf>,

        /// Don't erase before writing
        #[arg(long)]
        no_erase: bool,
    },

    /// Verify flash contents against a file
    Verify {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Compare against the InfoPage instead of the main array
        #[arg(long)]
        infopage: bool,
    },

    /// Erase the main flash array
    Erase {
        /// Save the InfoPage to this file before erasing
        #[arg(long)]
        backup_infopage: Option<PathBuf>,
    },

    /// Enable the on-chip hardware debug interface
    EnableDebug,

    /// Disable readback of the main array (only a full erase undoes this)
    ReadbackProtect {
        /// Confirm the operation
        #[arg(long, required = true)]
        confirm: bool,
    },

    /// List available programmers
    ListProgrammers,
}

impl Commands {
    /// Whether the command talks to a target
    pub fn needs_programmer(&self) -> bool {
        !matches!(self, Commands::ListProgrammers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_sets_log_filter() {
        let cli = Cli::try_parse_from(["nrfprog", "info"]).unwrap();
        assert_eq!(cli.log_filter(), "info");
        let cli = Cli::try_parse_from(["nrfprog", "-v", "info"]).unwrap();
        assert_eq!(cli.log_filter(), "debug");
        let cli = Cli::try_parse_from(["nrfprog", "info", "-vv"]).unwrap();
        assert_eq!(cli.log_filter(), "trace");
    }

    #[test]
    fn test_readback_protect_needs_confirm_flag() {
        assert!(Cli::try_parse_from(["nrfprog", "-p", "dummy", "readback-protect"]).is_err());

        let cli =
            Cli::try_parse_from(["nrfprog", "-p", "dummy", "readback-protect", "--confirm"]).unwrap();
        assert!(matches!(cli.command, Commands::ReadbackProtect { confirm: true }));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0x200"), Ok(512));
        assert_eq!(parse_size("100"), Ok(100));
        assert!(parse_size("0xZZ").is_err());
    }
}
