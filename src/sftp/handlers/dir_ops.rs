use std::path::Path;

use log::{info, warn};
use russh_sftp::protocol::{File, FileAttributes, Name, StatusCode};
use tokio::fs;

use crate::sftp::SftpSession;
use crate::sftp::utils::metadata::MetadataConverter;

/// Scans a directory and captures the full entry list for a new handle.
///
/// The snapshot is taken in one pass at OPENDIR time; later mutations of the
/// directory are invisible to the handle. An entry whose metadata cannot be
/// read still appears in the listing with default attributes rather than
/// aborting the whole scan.
pub async fn snapshot_dir(path: &Path) -> std::io::Result<Vec<File>> {
    let mut read_dir = fs::read_dir(path).await?;
    let mut entries = Vec::new();

    while let Some(entry) = read_dir.next_entry().await? {
        let filename = entry.file_name().to_string_lossy().to_string();
        match entry.metadata().await {
            Ok(metadata) => {
                let attrs = MetadataConverter::to_file_attributes(&metadata);
                let longname = MetadataConverter::format_longname(&filename, &metadata);
                entries.push(File {
                    filename,
                    longname,
                    attrs,
                });
            }
            Err(e) => {
                warn!("Failed to get metadata for {}: {}", filename, e);
                let attrs = FileAttributes {
                    permissions: Some(0o100644),
                    ..Default::default()
                };
                entries.push(File {
                    longname: format!("-rw-r--r-- 1 root root 0 Jan  1 00:00 {}", filename),
                    filename,
                    attrs,
                });
            }
        }
    }

    Ok(entries)
}

/// Returns the next snapshot entry for a directory handle, EOF once the
/// cursor is exhausted, or FAILURE for an unknown or non-directory handle.
pub async fn handle_readdir(
    session: &SftpSession,
    id: u32,
    handle: String,
) -> Result<Name, StatusCode> {
    info!("readdir handle: {}", handle);

    let Some(cursor) = session.handles.get_dir(&handle) else {
        warn!("Invalid directory handle for readdir: {}", handle);
        return Err(StatusCode::Failure);
    };

    match cursor.next_entry() {
        Some(entry) => Ok(Name {
            id,
            files: vec![entry],
        }),
        None => Err(StatusCode::Eof),
    }
}
