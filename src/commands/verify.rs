//! Verify command implementation

use super::spinner;
use nrfprog_core::flash::ProgrammingSession;
use nrfprog_core::programmer::Programmer;
use nrfprog_core::spi::FlashAddress;
use std::path::Path;

/// Run the verify command
pub fn run_verify<P: Programmer + ?Sized>(
    session: &mut ProgrammingSession<'_, P>,
    input: &Path,
    info_page: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let expected = std::fs::read(input)?;
    println!("Read {} bytes from {:?}", expected.len(), input);

    let region = session.config().geometry.region_size(info_page);
    if expected.is_empty() || expected.len() > region {
        return Err(format!(
            "File size ({} bytes) must be 1..={} bytes",
            expected.len(),
            region
        )
        .into());
    }

    let pb = spinner("Verifying");
    let result = verify_region(session, &expected, info_page);
    match &result {
        Ok(()) => pb.finish_with_message("Verification passed"),
        Err(_) => pb.abandon_with_message("Verification failed"),
    }
    result?;

    if expected.len() < region {
        println!(
            "Note: Remaining {} bytes not verified.",
            region - expected.len()
        );
    }

    Ok(())
}

/// Compare the start of the main array or the InfoPage against `expected`
pub fn verify_region<P: Programmer + ?Sized>(
    session: &mut ProgrammingSession<'_, P>,
    expected: &[u8],
    info_page: bool,
) -> nrfprog_core::Result<()> {
    if !info_page {
        return session.verify(expected, FlashAddress::ZERO);
    }

    session.enable_info_page()?;
    let result = session.verify(expected, FlashAddress::ZERO);
    let restore = session.disable_info_page();
    result.and(restore)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nrfprog_core::flash::SessionConfig;
    use nrfprog_core::Error;
    use nrfprog_dummy::{DummyConfig, DummyNrf};

    #[test]
    fn test_verify_info_page() {
        let mut dummy = DummyNrf::with_data(DummyConfig::default(), &[1, 2], &[7, 8, 9]);
        let mut session = ProgrammingSession::begin(&mut dummy, SessionConfig::default()).unwrap();

        verify_region(&mut session, &[7, 8, 9], true).unwrap();
        verify_region(&mut session, &[1, 2], false).unwrap();
        assert_eq!(
            verify_region(&mut session, &[7, 8, 0], true),
            Err(Error::VerifyMismatch {
                offset: 2,
                expected: 0,
                actual: 9,
            })
        );
        assert!(!session.info_page_enabled());
    }
}
