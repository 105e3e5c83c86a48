//! Read command implementation

use indicatif::{ProgressBar, ProgressStyle};
use nrfprog_core::flash::ProgrammingSession;
use nrfprog_core::programmer::Programmer;
use nrfprog_core::spi::FlashAddress;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Chunk size for reading (one flash page)
const READ_CHUNK_SIZE: usize = 512;

/// Run the read command
pub fn run_read<P: Programmer + ?Sized>(
    session: &mut ProgrammingSession<'_, P>,
    output: &Path,
    info_page: bool,
    length: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let region = session.config().geometry.region_size(info_page);
    let length = length.unwrap_or(region);
    if length == 0 || length > region {
        return Err(format!(
            "Read length {} outside 1..={} bytes of the {}",
            length,
            region,
            if info_page { "InfoPage" } else { "main array" }
        )
        .into());
    }

    if info_page {
        session.enable_info_page()?;
    }
    let data = read_with_progress(session, length);
    let restore = if info_page {
        session.disable_info_page()
    } else {
        Ok(())
    };
    let data = data?;
    restore?;

    let mut file = File::create(output)?;
    file.write_all(&data)?;

    println!("Wrote {} bytes to {:?}", data.len(), output);

    Ok(())
}

/// Read `length` bytes from address 0 of the current region with a
/// progress bar
pub fn read_with_progress<P: Programmer + ?Sized>(
    session: &mut ProgrammingSession<'_, P>,
    length: usize,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut data = vec![0u8; length];

    let pb = ProgressBar::new(length as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
            .progress_chars("#>-"),
    );

    let mut offset = 0usize;
    while offset < length {
        let chunk_size = std::cmp::min(READ_CHUNK_SIZE, length - offset);
        let addr = FlashAddress::ZERO
            .checked_add(offset)
            .ok_or("Read offset beyond the 16-bit address space")?;
        session.read(addr, &mut data[offset..offset + chunk_size])?;

        offset += chunk_size;
        pb.set_position(offset as u64);
    }

    pb.finish_with_message("Read complete");
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nrfprog_core::flash::SessionConfig;
    use nrfprog_dummy::{DummyConfig, DummyNrf};

    #[test]
    fn test_read_spans_chunks() {
        let image: Vec<u8> = (0..1500u32).map(|i| i as u8).collect();
        let mut dummy = DummyNrf::with_data(DummyConfig::default(), &image, &[]);
        let mut session = ProgrammingSession::begin(&mut dummy, SessionConfig::default()).unwrap();

        let data = read_with_progress(&mut session, 1500).unwrap();
        assert_eq!(data, image);
    }
}
