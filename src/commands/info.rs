//! Info command implementation

use nrfprog_core::flash::ProgrammingSession;
use nrfprog_core::programmer::Programmer;

/// Print the decoded status and protection registers
pub fn run_info<P: Programmer + ?Sized>(
    session: &mut ProgrammingSession<'_, P>,
) -> Result<(), Box<dyn std::error::Error>> {
    let status = session.status()?;
    let fpcr = session.read_fpcr()?;
    let geometry = session.config().geometry;

    println!("Flash status:      {}", status);
    println!("{}", field("InfoPage:", enabled(status.info_page_enabled())));
    println!("{}", field("Start from prot:", enabled(status.contains(nrfprog_core::FlashStatus::STP))));
    println!("{}", field("Readback prot:", enabled(status.readback_disabled())));
    println!("{}", field("Debug interface:", enabled(status.debug_enabled())));
    println!("Protect config:    0x{:02X}", fpcr);
    println!(
        "Geometry:          {} bytes main ({} pages of {}), {} bytes InfoPage",
        geometry.main_size,
        geometry.page_count(),
        geometry.page_size,
        geometry.info_page_size
    );

    Ok(())
}

/// One indented status line, values aligned with the top-level lines
fn field(label: &str, value: &str) -> String {
    format!("  {:<17}{}", label, value)
}

fn enabled(on: bool) -> &'static str {
    if on {
        "enabled"
    } else {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lines_align() {
        let top = format!("Flash status:      {}", "x");
        let column = top.find('x').unwrap();
        for label in ["InfoPage:", "Start from prot:", "Readback prot:", "Debug interface:"] {
            let line = field(label, "enabled");
            assert_eq!(line.find("enabled"), Some(column), "{}", line);
        }
    }
}
