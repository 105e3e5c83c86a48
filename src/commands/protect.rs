//! Protection and debug commands

use super::spinner;
use nrfprog_core::flash::ProgrammingSession;
use nrfprog_core::programmer::Programmer;

/// Run the enable-debug command
pub fn run_enable_debug<P: Programmer + ?Sized>(
    session: &mut ProgrammingSession<'_, P>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = spinner("Enabling debug interface");
    session.enable_debug()?;
    pb.finish_with_message("Debug interface enabled");
    Ok(())
}

/// Run the readback-protect command
///
/// Refuses to run without `confirm`; once set, only erasing the whole
/// chip restores readback.
pub fn run_readback_protect<P: Programmer + ?Sized>(
    session: &mut ProgrammingSession<'_, P>,
    confirm: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !confirm {
        return Err("Readback protection can only be removed by a full erase; \
                    pass --confirm to proceed"
            .into());
    }

    let pb = spinner("Enabling readback protection");
    session.enable_readback_protection()?;
    let status = session.status()?;
    if !status.readback_disabled() {
        pb.abandon_with_message("Readback protection failed");
        return Err(format!("Readback protection not reported by FSR ({})", status).into());
    }
    pb.finish_with_message("Readback protection enabled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nrfprog_core::flash::SessionConfig;
    use nrfprog_core::spi::Opcode;
    use nrfprog_dummy::DummyNrf;

    #[test]
    fn test_readback_protect_requires_confirmation() {
        let mut dummy = DummyNrf::new_default();
        let mut session = ProgrammingSession::begin(&mut dummy, SessionConfig::default()).unwrap();

        assert!(run_readback_protect(&mut session, false).is_err());
        session.finish().unwrap();
        assert_eq!(dummy.count(Opcode::Rdismb), 0);
        assert!(!dummy.readback_protected());
    }

    #[test]
    fn test_readback_protect_confirmed() {
        let mut dummy = DummyNrf::new_default();
        let mut session = ProgrammingSession::begin(&mut dummy, SessionConfig::default()).unwrap();

        run_readback_protect(&mut session, true).unwrap();
        session.finish().unwrap();
        assert!(dummy.readback_protected());
    }
}
