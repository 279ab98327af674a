use std::{collections::HashMap, sync::Arc};

use log::{error, info, warn};
use russh_sftp::protocol::{
    Attrs, Data, File, FileAttributes, Handle, Name, OpenFlags, Status, StatusCode, Version,
};
use tokio::fs;

use crate::server::ServerConfig;

use super::{
    handles::{FileHandle, HandleTable, Resource},
    handlers::{dir_ops, file_ops},
    utils::{metadata::MetadataConverter, path_resolver::PathResolver},
};

pub(crate) fn ok_status(id: u32) -> Status {
    Status {
        id,
        status_code: StatusCode::Ok,
        error_message: "Ok".to_string(),
        language_tag: "en-US".to_string(),
    }
}

/// One SFTP session: the request dispatcher plus the state it owns.
///
/// Every operation validates its arguments, resolves a path or looks up a
/// handle, performs the filesystem action, and maps the outcome onto exactly
/// one response carrying the caller's request id. Filesystem errors of any
/// kind collapse to a FAILURE status; the OS-level cause is only logged.
/// Nothing here is fatal to the session except transport loss itself.
pub struct SftpSession {
    version: Option<u32>,
    pub(crate) handles: HandleTable,
    pub(crate) path_resolver: PathResolver,
    pub(crate) max_read_size: u32,
}

impl SftpSession {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self {
            version: None,
            handles: HandleTable::new(),
            path_resolver: PathResolver::new(config.root_dir.clone()),
            max_read_size: config.max_read_size,
        }
    }

    fn issue_file_handle(&self, id: u32, handle: FileHandle) -> Result<Handle, StatusCode> {
        match self.handles.allocate_file(handle) {
            Some(handle) => Ok(Handle { id, handle }),
            None => {
                error!("handle counter exhausted");
                Err(StatusCode::ConnectionLost)
            }
        }
    }
}

impl russh_sftp::server::Handler for SftpSession {
    type Error = StatusCode;

    fn unimplemented(&self) -> Self::Error {
        StatusCode::OpUnsupported
    }

    async fn init(
        &mut self,
        version: u32,
        extensions: HashMap<String, String>,
    ) -> Result<Version, Self::Error> {
        if self.version.is_some() {
            error!("duplicate SSH_FXP_INIT packet");
            return Err(StatusCode::ConnectionLost);
        }

        self.version = Some(version);
        info!("version: {:?}, extensions: {:?}", self.version, extensions);
        Ok(Version::new())
    }

    async fn close(&mut self, id: u32, handle: String) -> Result<Status, Self::Error> {
        info!("close handle: {}", handle);

        match self.handles.release(&handle) {
            Some(Resource::File(open_file)) => {
                // The entry is already gone; a close error still surfaces as
                // a failure without leaking the handle.
                let file = open_file.file.lock().await;
                if let Err(e) = file.sync_all().await {
                    error!("Failed to close file {:?}: {}", open_file.path, e);
                    return Err(StatusCode::Failure);
                }
                info!("Closed file handle: {} (path: {:?})", handle, open_file.path);
                Ok(ok_status(id))
            }
            Some(Resource::Dir(_)) => {
                info!("Closed directory handle: {}", handle);
                Ok(ok_status(id))
            }
            None => {
                warn!("close on unknown handle: {}", handle);
                Err(StatusCode::Failure)
            }
        }
    }

    async fn opendir(&mut self, id: u32, path: String) -> Result<Handle, Self::Error> {
        info!("opendir: {}", path);

        let resolved_path = self.path_resolver.resolve(&path);

        match dir_ops::snapshot_dir(&resolved_path).await {
            Ok(entries) => match self.handles.allocate_dir(super::cursor::DirCursor::new(entries))
            {
                Some(handle) => Ok(Handle { id, handle }),
                None => {
                    error!("handle counter exhausted");
                    Err(StatusCode::ConnectionLost)
                }
            },
            Err(e) => {
                warn!("Failed to open directory {:?}: {}", resolved_path, e);
                Err(StatusCode::Failure)
            }
        }
    }

    async fn readdir(&mut self, id: u32, handle: String) -> Result<Name, Self::Error> {
        dir_ops::handle_readdir(self, id, handle).await
    }

    async fn realpath(&mut self, id: u32, path: String) -> Result<Name, Self::Error> {
        info!("realpath: {}", path);

        // Lexical resolution cannot fail; the echo is always root-relative.
        let resolved_path = self.path_resolver.resolve(&path);
        let client_path = self.path_resolver.client_view(&resolved_path);

        Ok(Name {
            id,
            files: vec![File::dummy(&client_path)],
        })
    }

    async fn open(
        &mut self,
        id: u32,
        path: String,
        pflags: OpenFlags,
        _attrs: FileAttributes,
    ) -> Result<Handle, Self::Error> {
        info!("open file: {} with flags: {:?}", path, pflags);

        let resolved_path = self.path_resolver.resolve(&path);

        let mut options = fs::OpenOptions::new();
        options
            .read(pflags.contains(OpenFlags::READ))
            .write(pflags.contains(OpenFlags::WRITE))
            .create(pflags.contains(OpenFlags::CREATE))
            .truncate(pflags.contains(OpenFlags::TRUNCATE))
            .append(pflags.contains(OpenFlags::APPEND));
        if !pflags.intersects(OpenFlags::READ | OpenFlags::WRITE | OpenFlags::APPEND) {
            options.read(true);
        }

        match options.open(&resolved_path).await {
            Ok(file) => {
                let handle = self.issue_file_handle(id, FileHandle::new(file, resolved_path))?;
                info!("Opened file with handle: {}", handle.handle);
                Ok(handle)
            }
            Err(e) => {
                warn!("Failed to open file {:?}: {}", resolved_path, e);
                Err(StatusCode::Failure)
            }
        }
    }

    async fn read(
        &mut self,
        id: u32,
        handle: String,
        offset: u64,
        len: u32,
    ) -> Result<Data, Self::Error> {
        file_ops::handle_read(self, id, handle, offset, len).await
    }

    async fn write(
        &mut self,
        id: u32,
        handle: String,
        offset: u64,
        data: Vec<u8>,
    ) -> Result<Status, Self::Error> {
        file_ops::handle_write(self, id, handle, offset, data).await
    }

    async fn remove(&mut self, id: u32, filename: String) -> Result<Status, Self::Error> {
        info!("remove: {}", filename);

        let resolved_path = self.path_resolver.resolve(&filename);

        match fs::remove_file(&resolved_path).await {
            Ok(()) => Ok(ok_status(id)),
            Err(e) => {
                warn!("Failed to remove {:?}: {}", resolved_path, e);
                Err(StatusCode::Failure)
            }
        }
    }

    async fn rename(
        &mut self,
        id: u32,
        oldpath: String,
        newpath: String,
    ) -> Result<Status, Self::Error> {
        info!("rename: {} -> {}", oldpath, newpath);

        let old_resolved = self.path_resolver.resolve(&oldpath);
        let new_resolved = self.path_resolver.resolve(&newpath);

        match fs::rename(&old_resolved, &new_resolved).await {
            Ok(()) => Ok(ok_status(id)),
            Err(e) => {
                warn!(
                    "Failed to rename {:?} -> {:?}: {}",
                    old_resolved, new_resolved, e
                );
                Err(StatusCode::Failure)
            }
        }
    }

    async fn mkdir(
        &mut self,
        id: u32,
        path: String,
        _attrs: FileAttributes,
    ) -> Result<Status, Self::Error> {
        info!("mkdir: {}", path);

        let resolved_path = self.path_resolver.resolve(&path);

        // Recursive creation; an already existing directory counts as
        // success.
        match fs::create_dir_all(&resolved_path).await {
            Ok(()) => Ok(ok_status(id)),
            Err(e) => {
                warn!("Failed to mkdir {:?}: {}", resolved_path, e);
                Err(StatusCode::Failure)
            }
        }
    }

    async fn rmdir(&mut self, id: u32, path: String) -> Result<Status, Self::Error> {
        info!("rmdir: {}", path);

        let resolved_path = self.path_resolver.resolve(&path);

        match fs::remove_dir(&resolved_path).await {
            Ok(()) => Ok(ok_status(id)),
            Err(e) => {
                warn!("Failed to rmdir {:?}: {}", resolved_path, e);
                Err(StatusCode::Failure)
            }
        }
    }

    async fn stat(&mut self, id: u32, path: String) -> Result<Attrs, Self::Error> {
        info!("stat: {}", path);

        let resolved_path = self.path_resolver.resolve(&path);

        match fs::metadata(&resolved_path).await {
            Ok(metadata) => Ok(Attrs {
                id,
                attrs: MetadataConverter::to_file_attributes(&metadata),
            }),
            Err(e) => {
                warn!("Failed to stat {:?}: {}", resolved_path, e);
                Err(StatusCode::Failure)
            }
        }
    }

    async fn lstat(&mut self, id: u32, path: String) -> Result<Attrs, Self::Error> {
        info!("lstat: {}", path);

        let resolved_path = self.path_resolver.resolve(&path);

        match fs::symlink_metadata(&resolved_path).await {
            Ok(metadata) => Ok(Attrs {
                id,
                attrs: MetadataConverter::to_file_attributes(&metadata),
            }),
            Err(e) => {
                warn!("Failed to lstat {:?}: {}", resolved_path, e);
                Err(StatusCode::Failure)
            }
        }
    }

    async fn fstat(&mut self, id: u32, handle: String) -> Result<Attrs, Self::Error> {
        info!("fstat handle: {}", handle);

        let Some(open_file) = self.handles.get_file(&handle) else {
            warn!("Invalid file handle for fstat: {}", handle);
            return Err(StatusCode::Failure);
        };

        let file = open_file.file.lock().await;
        match file.metadata().await {
            Ok(metadata) => Ok(Attrs {
                id,
                attrs: MetadataConverter::to_file_attributes(&metadata),
            }),
            Err(e) => {
                error!("Failed to get metadata for handle {}: {}", handle, e);
                Err(StatusCode::Failure)
            }
        }
    }
}
