//! nrfprog - In-system flash programmer for nRF24LE1 microcontrollers
//!
//! The target is put into programming mode through its PROG and RESET
//! pins and its flash controller is driven over SPI. Every command that
//! touches the target runs inside one programming session, which always
//! returns the target to normal mode when the command ends.

mod cli;
mod commands;
mod config;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use nrfprog_core::flash::ProgrammingSession;
use nrfprog_core::programmer::Programmer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger, -v/-vv raise the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    if !cli.command.needs_programmer() {
        commands::list_programmers();
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref())?;
    let descriptor = cli
        .programmer
        .as_deref()
        .or(config.programmer.as_deref())
        .ok_or("No programmer specified; use -p or set 'programmer' in the config file")?;

    let mut programmer = programmers::open_programmer(descriptor)?;
    let mut session = ProgrammingSession::begin(programmer.as_mut(), config.session_config())?;

    run_command(&mut session, &cli.command)?;
    session.finish()?;

    Ok(())
}

fn run_command<P: Programmer + ?Sized>(
    session: &mut ProgrammingSession<'_, P>,
    command: &Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Info => commands::info::run_info(session),
        Commands::Read {
            output,
            infopage,
            length,
        } => commands::read::run_read(session, output, *infopage, *length),
        Commands::Write {
            input,
            infopage_image,
            no_erase,
        } => commands::write::run_write(session, input, infopage_image.as_deref(), *no_erase),
        Commands::Verify { input, infopage } => {
            commands::verify::run_verify(session, input, *infopage)
        }
        Commands::Erase { backup_infopage } => {
            commands::erase::run_erase(session, backup_infopage.as_deref())
        }
        Commands::EnableDebug => commands::protect::run_enable_debug(session),
        Commands::ReadbackProtect { confirm } => {
            commands::protect::run_readback_protect(session, *confirm)
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
    }
}
