use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::fs;
use tokio::sync::Mutex as AsyncMutex;

use crate::sftp::cursor::DirCursor;

/// An open file bound to a handle. The async mutex makes each seek+read or
/// seek+write pair atomic per request; concurrent requests on the same handle
/// queue on it instead of interleaving mid-seek.
pub struct FileHandle {
    pub file: AsyncMutex<fs::File>,
    pub path: PathBuf,
}

impl FileHandle {
    pub fn new(file: fs::File, path: PathBuf) -> Self {
        Self {
            file: AsyncMutex::new(file),
            path,
        }
    }
}

/// A resource bound to an issued handle. File and directory handles are
/// disjoint kinds; a lookup for the wrong kind fails.
pub enum Resource {
    File(Arc<FileHandle>),
    Dir(Arc<DirCursor>),
}

/// Session-scoped table of open resources keyed by opaque handle tokens.
///
/// Handle values come from a monotonically increasing per-session counter and
/// are never reused while the session lives. The wire token is the 4-byte
/// big-endian value rendered as 8 hex digits (the subprotocol library carries
/// handles as strings). Allocation, lookup and release are atomic with
/// respect to each other; the map lock is never held across an await.
pub struct HandleTable {
    next_id: AtomicU32,
    entries: Mutex<HashMap<u32, Resource>>,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU32::new(0),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a fresh handle for an open file. `None` only on counter
    /// exhaustion, which ends the session rather than recycling tokens.
    pub fn allocate_file(&self, handle: FileHandle) -> Option<String> {
        self.allocate(Resource::File(Arc::new(handle)))
    }

    /// Issues a fresh handle for a directory listing snapshot.
    pub fn allocate_dir(&self, cursor: DirCursor) -> Option<String> {
        self.allocate(Resource::Dir(Arc::new(cursor)))
    }

    fn allocate(&self, resource: Resource) -> Option<String> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if id == u32::MAX {
            // Counter exhausted; refuse rather than reissue a live token.
            return None;
        }
        let token = Self::encode(id);
        self.entries
            .lock()
            .expect("handle table lock poisoned")
            .insert(id, resource);
        Some(token)
    }

    /// Looks up a file handle. `None` if the token is unknown, already
    /// closed, or bound to a directory.
    pub fn get_file(&self, token: &str) -> Option<Arc<FileHandle>> {
        let id = Self::decode(token)?;
        match self
            .entries
            .lock()
            .expect("handle table lock poisoned")
            .get(&id)
        {
            Some(Resource::File(file)) => Some(Arc::clone(file)),
            _ => None,
        }
    }

    /// Looks up a directory handle. `None` if the token is unknown, already
    /// closed, or bound to a file.
    pub fn get_dir(&self, token: &str) -> Option<Arc<DirCursor>> {
        let id = Self::decode(token)?;
        match self
            .entries
            .lock()
            .expect("handle table lock poisoned")
            .get(&id)
        {
            Some(Resource::Dir(cursor)) => Some(Arc::clone(cursor)),
            _ => None,
        }
    }

    /// Removes a handle, returning the resource so the caller can finish
    /// closing it. A second release of the same token finds nothing.
    pub fn release(&self, token: &str) -> Option<Resource> {
        let id = Self::decode(token)?;
        self.entries
            .lock()
            .expect("handle table lock poisoned")
            .remove(&id)
    }

    fn encode(id: u32) -> String {
        format!("{id:08x}")
    }

    fn decode(token: &str) -> Option<u32> {
        if token.len() != 8 {
            return None;
        }
        u32::from_str_radix(token, 16).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use russh_sftp::protocol::File;
    use std::collections::HashSet;

    fn dir_cursor() -> DirCursor {
        DirCursor::new(vec![File::dummy("x")])
    }

    async fn file_handle(dir: &std::path::Path) -> FileHandle {
        let path = dir.join("f");
        let file = fs::File::create(&path).await.unwrap();
        FileHandle::new(file, path)
    }

    #[test]
    fn handles_are_unique_and_fixed_width() {
        let table = HandleTable::new();
        let mut seen = HashSet::new();
        for _ in 0..100 {
            let token = table.allocate_dir(dir_cursor()).unwrap();
            assert_eq!(token.len(), 8);
            assert!(seen.insert(token));
        }
    }

    #[test]
    fn lookup_enforces_resource_kind() {
        let table = HandleTable::new();
        let token = table.allocate_dir(dir_cursor()).unwrap();

        assert!(table.get_dir(&token).is_some());
        assert!(table.get_file(&token).is_none());
    }

    #[tokio::test]
    async fn file_handle_is_not_a_dir_handle() {
        let dir = tempfile::tempdir().unwrap();
        let table = HandleTable::new();
        let token = table.allocate_file(file_handle(dir.path()).await).unwrap();

        assert!(table.get_file(&token).is_some());
        assert!(table.get_dir(&token).is_none());
    }

    #[test]
    fn second_release_finds_nothing() {
        let table = HandleTable::new();
        let token = table.allocate_dir(dir_cursor()).unwrap();
        let other = table.allocate_dir(dir_cursor()).unwrap();

        assert!(table.release(&token).is_some());
        assert!(table.release(&token).is_none());
        // Other live handles are unaffected.
        assert!(table.get_dir(&other).is_some());
    }

    #[test]
    fn released_tokens_are_not_reissued() {
        let table = HandleTable::new();
        let first = table.allocate_dir(dir_cursor()).unwrap();
        table.release(&first);
        let second = table.allocate_dir(dir_cursor()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_tokens_never_match() {
        let table = HandleTable::new();
        table.allocate_dir(dir_cursor()).unwrap();

        assert!(table.get_dir("bogus").is_none());
        assert!(table.get_dir("zzzzzzzz").is_none());
        assert!(table.release("0").is_none());
    }
}
