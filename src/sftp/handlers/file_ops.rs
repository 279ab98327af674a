use log::{error, info, warn};
use russh_sftp::protocol::{Data, Status, StatusCode};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::sftp::SftpSession;
use crate::sftp::session::ok_status;

/// Reads up to `len` bytes at `offset` from an open file handle.
///
/// Zero bytes available at the offset is EOF, a normal terminal condition,
/// not a failure. The response is clamped to the configured maximum read
/// size.
pub async fn handle_read(
    session: &SftpSession,
    id: u32,
    handle: String,
    offset: u64,
    len: u32,
) -> Result<Data, StatusCode> {
    info!(
        "read handle: {}, offset: {}, requested len: {}",
        handle, offset, len
    );

    let Some(open_file) = session.handles.get_file(&handle) else {
        warn!("Invalid file handle for read: {}", handle);
        return Err(StatusCode::Failure);
    };

    let actual_len = std::cmp::min(len, session.max_read_size);
    let mut file = open_file.file.lock().await;

    if let Err(e) = file.seek(std::io::SeekFrom::Start(offset)).await {
        error!("Failed to seek in file handle {}: {}", handle, e);
        return Err(StatusCode::Failure);
    }

    let mut buffer = vec![0u8; actual_len as usize];
    match file.read(&mut buffer).await {
        Ok(0) => {
            info!("End of file reached for handle: {}", handle);
            Err(StatusCode::Eof)
        }
        Ok(bytes_read) => {
            buffer.truncate(bytes_read);
            info!(
                "Read {} bytes from handle: {} at offset: {}",
                bytes_read, handle, offset
            );
            Ok(Data { id, data: buffer })
        }
        Err(e) => {
            error!("Failed to read from file handle {}: {}", handle, e);
            Err(StatusCode::Failure)
        }
    }
}

/// Writes `data` at `offset` through an open file handle.
///
/// Concurrent writes on the same handle queue on the handle's lock; no
/// ordering is promised between overlapping offsets beyond what the OS gives.
pub async fn handle_write(
    session: &SftpSession,
    id: u32,
    handle: String,
    offset: u64,
    data: Vec<u8>,
) -> Result<Status, StatusCode> {
    info!(
        "write handle: {}, offset: {}, data len: {}",
        handle,
        offset,
        data.len()
    );

    let Some(open_file) = session.handles.get_file(&handle) else {
        warn!("Invalid file handle for write: {}", handle);
        return Err(StatusCode::Failure);
    };

    let mut file = open_file.file.lock().await;

    if let Err(e) = file.seek(std::io::SeekFrom::Start(offset)).await {
        error!("Failed to seek in file handle {}: {}", handle, e);
        return Err(StatusCode::Failure);
    }

    if let Err(e) = file.write_all(&data).await {
        error!("Failed to write to file handle {}: {}", handle, e);
        return Err(StatusCode::Failure);
    }

    if let Err(e) = file.flush().await {
        warn!("Failed to flush file handle {}: {}", handle, e);
        return Err(StatusCode::Failure);
    }

    info!(
        "Wrote {} bytes to handle: {} at offset: {}",
        data.len(),
        handle,
        offset
    );
    Ok(ok_status(id))
}
