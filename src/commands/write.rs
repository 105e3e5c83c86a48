//! Write command implementation

use super::spinner;
use indicatif::ProgressBar;
use nrfprog_core::flash::ProgrammingSession;
use nrfprog_core::programmer::Programmer;
use nrfprog_core::spi::FlashAddress;
use std::path::Path;

/// Run the write command
pub fn run_write<P: Programmer + ?Sized>(
    session: &mut ProgrammingSession<'_, P>,
    input: &Path,
    info_page_image: Option<&Path>,
    no_erase: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let firmware = std::fs::read(input)?;
    println!("Read {} bytes from {:?}", firmware.len(), input);
    if firmware.is_empty() {
        return Err(format!("{:?} is empty", input).into());
    }

    let info_page = match info_page_image {
        Some(path) => {
            let image = std::fs::read(path)?;
            println!("Read {} bytes of InfoPage from {:?}", image.len(), path);
            Some(image)
        }
        None => None,
    };

    let geometry = session.config().geometry;
    if firmware.len() > geometry.main_size {
        return Err(format!(
            "Firmware ({} bytes) exceeds flash size ({} bytes)",
            firmware.len(),
            geometry.main_size
        )
        .into());
    }

    let pb = spinner("Writing");
    let result = write_image(session, &firmware, info_page.as_deref(), !no_erase, &pb);
    match &result {
        Ok(()) => pb.finish_with_message("Write complete, verified"),
        Err(_) => pb.abandon_with_message("Write failed"),
    }
    result?;

    Ok(())
}

/// Erase and program the target
///
/// With an InfoPage image, the InfoPage is enabled for the erase so it is
/// wiped along with the main array, then programmed and verified, and
/// disabled again before the firmware is written. Without one only the
/// main array is erased and the InfoPage is left untouched.
pub fn write_image<P: Programmer + ?Sized>(
    session: &mut ProgrammingSession<'_, P>,
    firmware: &[u8],
    info_page: Option<&[u8]>,
    erase: bool,
    pb: &ProgressBar,
) -> nrfprog_core::Result<()> {
    if let Some(image) = info_page {
        session.enable_info_page()?;
        let erased = if erase {
            pb.set_message("Erasing main array and InfoPage");
            session.erase_all()
        } else {
            Ok(())
        };
        let result = erased.and_then(|_| {
            pb.set_message("Programming InfoPage");
            session.program_and_verify("InfoPage", image, FlashAddress::ZERO)
        });
        let restore = session.disable_info_page();
        result.and(restore)?;
    } else if erase {
        pb.set_message("Erasing main array");
        session.erase_all()?;
    }

    pb.set_message("Programming firmware");
    session.program_and_verify("firmware", firmware, FlashAddress::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nrfprog_core::flash::SessionConfig;
    use nrfprog_core::spi::Opcode;
    use nrfprog_core::Error;
    use nrfprog_dummy::{DummyConfig, DummyNrf, ERASED};

    fn write(
        dummy: &mut DummyNrf,
        firmware: &[u8],
        info_page: Option<&[u8]>,
        erase: bool,
    ) -> nrfprog_core::Result<()> {
        let mut session = ProgrammingSession::begin(dummy, SessionConfig::default())?;
        write_image(&mut session, firmware, info_page, erase, &ProgressBar::hidden())?;
        session.finish()
    }

    #[test]
    fn test_write_keeps_info_page() {
        let mut dummy = DummyNrf::with_data(DummyConfig::default(), &[0x00; 64], &[0x5A; 32]);

        write(&mut dummy, &[0x01, 0x02, 0x03], None, true).unwrap();

        assert_eq!(&dummy.main()[..3], &[0x01, 0x02, 0x03]);
        assert!(dummy.main()[3..].iter().all(|&b| b == ERASED));
        assert!(dummy.info_page()[..32].iter().all(|&b| b == 0x5A));
        assert_eq!(dummy.count(Opcode::EraseAll), 1);
    }

    #[test]
    fn test_write_replaces_info_page() {
        let mut dummy = DummyNrf::with_data(DummyConfig::default(), &[], &[0x00; 512]);
        let info: Vec<u8> = (0..512u32).map(|i| (i % 251) as u8).collect();

        write(&mut dummy, &[0xAA; 100], Some(&info), true).unwrap();

        assert_eq!(dummy.info_page(), &info[..]);
        assert_eq!(&dummy.main()[..100], &[0xAA; 100][..]);
        assert_eq!(dummy.count(Opcode::Program), 2);
    }

    #[test]
    fn test_write_full_size_image() {
        let mut dummy = DummyNrf::with_data(DummyConfig::default(), &[0x00; 0x4000], &[0x5A; 512]);
        let firmware: Vec<u8> = (0..0x4000u32).map(|i| (i * 13 + (i >> 8)) as u8).collect();

        write(&mut dummy, &firmware, None, true).unwrap();

        assert_eq!(dummy.main(), &firmware[..]);
        assert_eq!(dummy.count(Opcode::Program), 32);
        assert!(dummy.info_page().iter().all(|&b| b == 0x5A));
    }

    #[test]
    fn test_write_without_erase_reports_stale_bits() {
        let mut dummy = DummyNrf::with_data(DummyConfig::default(), &[0x0F], &[]);

        let err = write(&mut dummy, &[0xF0], None, false).unwrap_err();
        assert_eq!(
            err,
            Error::VerifyMismatch {
                offset: 0,
                expected: 0xF0,
                actual: 0x00,
            }
        );
        assert_eq!(dummy.count(Opcode::EraseAll), 0);
    }

    #[test]
    fn test_info_page_disabled_after_failure() {
        let mut dummy = DummyNrf::new_default();
        let oversized = [0u8; 513];

        let mut session = ProgrammingSession::begin(&mut dummy, SessionConfig::default()).unwrap();
        let err = write_image(&mut session, &[1], Some(&oversized), true, &ProgressBar::hidden())
            .unwrap_err();
        assert!(matches!(err, Error::AddressOutOfBounds { .. }));
        assert!(!session.info_page_enabled());
        assert!(!session.status().unwrap().info_page_enabled());
    }
}
