//! Archive extraction utilities.
//!
//! This module unpacks the tar.gz archive downloaded from MaxMind. Entry paths
//! are flattened: only the final path component is kept, so
//! `GeoLite2-City_20240101/GeoLite2-City.mmdb` lands directly in the
//! destination directory.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;

use crate::config::EXTRACT_BUFFER_SIZE;
use crate::error_handling::ProvisionError;

/// Extracts every entry of a tar.gz archive into `destination`, flattening paths.
///
/// This is blocking I/O; call it from `spawn_blocking`.
///
/// Directory entries are created as `destination/<name>`; failing to create
/// one is logged and skipped. File entries are streamed to
/// `destination/<name>` through a fixed-size buffer, replacing any existing
/// file with the same name.
///
/// # Returns
///
/// The paths of the files written, in archive order.
pub fn extract_archive(archive: &Path, destination: &Path) -> Result<Vec<PathBuf>, ProvisionError> {
    log::info!("Unpacking {} into {}", archive.display(), destination.display());

    if !archive.exists() {
        log::error!("Archive {} doesn't exist", archive.display());
        return Err(ProvisionError::ArchiveMissing(archive.to_path_buf()));
    }
    let file = File::open(archive).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ProvisionError::ArchiveMissing(archive.to_path_buf()),
        _ => ProvisionError::io(format!("Failed to open archive {:?}", archive), e),
    })?;

    let mut tar_archive = Archive::new(GzDecoder::new(file));
    let entries = tar_archive
        .entries()
        .map_err(|e| ProvisionError::io("Failed to read tar archive entries", e))?;

    let mut written = Vec::new();
    for entry_result in entries {
        let mut entry =
            entry_result.map_err(|e| ProvisionError::io("Failed to read tar entry", e))?;
        let entry_path = entry
            .path()
            .map_err(|e| ProvisionError::io("Failed to get entry path", e))?
            .into_owned();

        let Some(name) = entry_path.file_name() else {
            log::debug!("Skipping archive entry without a file name: {:?}", entry_path);
            continue;
        };
        let target = destination.join(name);

        if entry.header().entry_type().is_dir() {
            if let Err(e) = std::fs::create_dir(&target) {
                log::debug!(
                    "Unable to create directory {:?} during extraction: {}",
                    target,
                    e
                );
            }
            continue;
        }

        let bytes = copy_entry(&mut entry, &target)?;
        log::debug!("Extracted {:?} -> {:?} ({} bytes)", entry_path, target, bytes);
        written.push(target);
    }

    log::info!("Untar completed: {} file(s) extracted", written.len());
    Ok(written)
}

fn copy_entry<R: Read>(entry: &mut R, target: &Path) -> Result<u64, ProvisionError> {
    let file = File::create(target)
        .map_err(|e| ProvisionError::io(format!("Failed to create {:?}", target), e))?;
    let mut out = BufWriter::with_capacity(EXTRACT_BUFFER_SIZE, file);
    let mut buffer = vec![0u8; EXTRACT_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let count = entry
            .read(&mut buffer)
            .map_err(|e| ProvisionError::io(format!("Failed to read entry for {:?}", target), e))?;
        if count == 0 {
            break;
        }
        out.write_all(&buffer[..count])
            .map_err(|e| ProvisionError::io(format!("Failed to write {:?}", target), e))?;
        total += count as u64;
    }
    out.flush()
        .map_err(|e| ProvisionError::io(format!("Failed to flush {:?}", target), e))?;

    Ok(total)
}
