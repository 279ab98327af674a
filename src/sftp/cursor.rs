use std::sync::atomic::{AtomicUsize, Ordering};

use russh_sftp::protocol::File;

/// Snapshot of a directory taken at OPENDIR time, read one entry per call.
///
/// The entry list is immutable after capture; later filesystem changes are
/// invisible to an open handle. The read index only moves forward, and a
/// compare-and-swap advance keeps concurrent READDIRs on the same handle
/// from ever yielding the same entry twice or skipping one.
pub struct DirCursor {
    entries: Vec<File>,
    index: AtomicUsize,
}

impl DirCursor {
    pub fn new(entries: Vec<File>) -> Self {
        Self {
            entries,
            index: AtomicUsize::new(0),
        }
    }

    /// Returns the next entry and advances the cursor, or `None` once the
    /// snapshot is exhausted. The index never advances past the entry count.
    pub fn next_entry(&self) -> Option<File> {
        let mut current = self.index.load(Ordering::Acquire);
        loop {
            if current >= self.entries.len() {
                return None;
            }
            match self.index.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(self.entries[current].clone()),
                Err(observed) => current = observed,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
