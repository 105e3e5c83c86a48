//! Erase command implementation

use super::spinner;
use nrfprog_core::flash::ProgrammingSession;
use nrfprog_core::programmer::Programmer;
use std::path::Path;

/// Run the erase command
///
/// Only the main array is erased; the InfoPage stays disabled throughout.
/// With `backup_info_page` the InfoPage is saved to a file first.
pub fn run_erase<P: Programmer + ?Sized>(
    session: &mut ProgrammingSession<'_, P>,
    backup_info_page: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = backup_info_page {
        let info_page = backup(session)?;
        std::fs::write(path, &info_page)?;
        println!("Saved {} bytes of InfoPage to {:?}", info_page.len(), path);
    }

    let pb = spinner("Erasing main array");
    let result = session.erase_all();
    match &result {
        Ok(()) => pb.finish_with_message("Erase complete"),
        Err(_) => pb.abandon_with_message("Erase failed"),
    }
    result?;

    Ok(())
}

/// Read the whole InfoPage
pub fn backup<P: Programmer + ?Sized>(
    session: &mut ProgrammingSession<'_, P>,
) -> nrfprog_core::Result<Vec<u8>> {
    let mut info_page = vec![0u8; session.config().geometry.info_page_size];
    session.read_info_page(&mut info_page)?;
    Ok(info_page)
}
