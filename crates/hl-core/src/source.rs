//! Data sources backing the viewer.
//!
//! The viewer never blocks on a source. It asks `has_data` first and, if the
//! bytes are not there yet, falls back to placeholder rendering and polls
//! again later (see `render::RetryPoll`).

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{HexViewError, Result};
use crate::types::ByteRange;

/// Capability the viewer consumes to read and write bytes.
///
/// Offsets are relative to the start of the source. Reads and writes are
/// synchronous; a source that needs time to produce bytes reports them as
/// missing through `has_data` instead of blocking.
pub trait DataSource {
    /// Total number of bytes addressable through this source.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if `[offset, offset + len)` can be read right now.
    /// Lazy sources may start fetching the missing part as a side effect.
    fn has_data(&mut self, offset: u64, len: u64) -> bool;

    /// Read `len` bytes at `offset`.
    fn get_data(&mut self, offset: u64, len: u64) -> Result<Vec<u8>>;

    /// Overwrite bytes at `offset`. Fails with `ReadOnly` when the source is
    /// not editable.
    fn set_data(&mut self, offset: u64, bytes: &[u8]) -> Result<()>;

    fn is_editable(&self) -> bool;

    /// Whether missing data may still arrive. Once this returns false the
    /// viewer stops polling.
    fn keep_trying(&self) -> bool {
        true
    }

    /// Reports (and clears) an out-of-band content change.
    fn take_changed(&mut self) -> bool {
        false
    }
}

pub(crate) fn check_bounds(offset: u64, len: u64, total: u64) -> Result<()> {
    let region = ByteRange::new(offset, len);
    if region.end() > total || offset > total {
        return Err(HexViewError::OutOfRange { offset: region.end(), len: total });
    }
    Ok(())
}

/// An in-memory byte buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    data: Vec<u8>,
    editable: bool,
    changed: bool,
}

impl MemorySource {
    /// A read-only buffer.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, editable: false, changed: false }
    }

    /// A buffer that accepts edits.
    pub fn editable(data: Vec<u8>) -> Self {
        Self { data, editable: true, changed: false }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    /// Replace the whole buffer, as a debugger would after the target ran.
    pub fn replace(&mut self, data: Vec<u8>) {
        self.data = data;
        self.changed = true;
    }
}

impl DataSource for MemorySource {
    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn has_data(&mut self, offset: u64, len: u64) -> bool {
        check_bounds(offset, len, self.len()).is_ok()
    }

    fn get_data(&mut self, offset: u64, len: u64) -> Result<Vec<u8>> {
        check_bounds(offset, len, self.len())?;
        let start = offset as usize;
        Ok(self.data[start..start + len as usize].to_vec())
    }

    fn set_data(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        if !self.editable {
            return Err(HexViewError::ReadOnly);
        }
        check_bounds(offset, bytes.len() as u64, self.len())?;
        let start = offset as usize;
        self.data[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn is_editable(&self) -> bool {
        self.editable
    }

    fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}

/// Page granularity of [`LazySource`].
pub const LAZY_PAGE_SIZE: u64 = 256;

/// Wraps a source and only exposes pages that have been "fetched".
///
/// Models a remote target: asking for a missing page queues a request, and
/// the page becomes readable either after `latency` further `has_data` calls
/// or when the owner calls [`LazySource::fetch_pending`].
pub struct LazySource<S: DataSource> {
    inner: S,
    fetched: BTreeSet<u64>,
    /// Requested page -> remaining `has_data` calls before it arrives.
    pending: BTreeMap<u64, u32>,
    latency: Option<u32>,
    detached: bool,
    changed: bool,
}

impl<S: DataSource> LazySource<S> {
    /// Pages only arrive through `fetch_pending`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            fetched: BTreeSet::new(),
            pending: BTreeMap::new(),
            latency: None,
            detached: false,
            changed: false,
        }
    }

    /// Pages arrive on their own after `polls` additional `has_data` calls.
    pub fn with_latency(inner: S, polls: u32) -> Self {
        Self { latency: Some(polls), ..Self::new(inner) }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn pending_pages(&self) -> usize {
        self.pending.len()
    }

    /// Deliver every requested page.
    pub fn fetch_pending(&mut self) {
        if self.detached {
            return;
        }
        let pages: Vec<u64> = self.pending.keys().copied().collect();
        self.pending.clear();
        self.fetched.extend(pages);
        self.changed = true;
    }

    /// Deliver a byte range immediately, whether requested or not.
    pub fn prefetch(&mut self, offset: u64, len: u64) {
        for page in Self::pages(offset, len) {
            self.pending.remove(&page);
            self.fetched.insert(page);
        }
    }

    /// The target went away: missing pages will never arrive.
    pub fn detach(&mut self) {
        self.detached = true;
        self.pending.clear();
    }

    fn pages(offset: u64, len: u64) -> std::ops::Range<u64> {
        if len == 0 {
            return 0..0;
        }
        let end = ByteRange::new(offset, len).end();
        (offset / LAZY_PAGE_SIZE)..end.div_ceil(LAZY_PAGE_SIZE)
    }

    fn is_fetched(&self, offset: u64, len: u64) -> bool {
        Self::pages(offset, len).all(|p| self.fetched.contains(&p))
    }
}

impl<S: DataSource> DataSource for LazySource<S> {
    fn len(&self) -> u64 {
        self.inner.len()
    }

    fn has_data(&mut self, offset: u64, len: u64) -> bool {
        if check_bounds(offset, len, self.len()).is_err() {
            return false;
        }
        if self.detached {
            return self.is_fetched(offset, len);
        }

        for page in Self::pages(offset, len) {
            if self.fetched.contains(&page) {
                continue;
            }
            match self.pending.entry(page) {
                Entry::Vacant(slot) => {
                    slot.insert(self.latency.unwrap_or(u32::MAX));
                }
                Entry::Occupied(mut slot) => {
                    if self.latency.is_some() {
                        let remaining = slot.get_mut();
                        *remaining = remaining.saturating_sub(1);
                        if *remaining == 0 {
                            slot.remove();
                            self.fetched.insert(page);
                        }
                    }
                }
            }
        }

        self.is_fetched(offset, len) && self.inner.has_data(offset, len)
    }

    fn get_data(&mut self, offset: u64, len: u64) -> Result<Vec<u8>> {
        if !self.is_fetched(offset, len) {
            return Err(HexViewError::Source(format!(
                "bytes 0x{:X}..0x{:X} have not been fetched",
                offset,
                ByteRange::new(offset, len).end()
            )));
        }
        self.inner.get_data(offset, len)
    }

    fn set_data(&mut self, offset: u64, bytes: &[u8]) -> Result<()> {
        self.inner.set_data(offset, bytes)
    }

    fn is_editable(&self) -> bool {
        self.inner.is_editable()
    }

    fn keep_trying(&self) -> bool {
        !self.detached && self.inner.keep_trying()
    }

    fn take_changed(&mut self) -> bool {
        let inner = self.inner.take_changed();
        std::mem::take(&mut self.changed) || inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_reads_and_bounds() {
        let mut src = MemorySource::new(b"ABCDEFGH".to_vec());
        assert_eq!(src.len(), 8);
        assert!(src.has_data(0, 8));
        assert!(!src.has_data(4, 5));
        assert_eq!(src.get_data(2, 3).unwrap(), b"CDE");
        assert!(matches!(src.get_data(6, 4), Err(HexViewError::OutOfRange { .. })));
    }

    #[test]
    fn memory_source_rejects_writes_when_read_only() {
        let mut src = MemorySource::new(vec![0; 4]);
        assert_eq!(src.set_data(0, &[1]), Err(HexViewError::ReadOnly));

        src.set_editable(true);
        src.set_data(1, &[0xAA, 0xBB]).unwrap();
        assert_eq!(src.bytes(), &[0, 0xAA, 0xBB, 0]);
        assert!(src.set_data(3, &[1, 2]).is_err());
    }

    #[test]
    fn memory_source_reports_replacement_once() {
        let mut src = MemorySource::new(vec![0; 4]);
        assert!(!src.take_changed());
        src.replace(vec![1; 8]);
        assert!(src.take_changed());
        assert!(!src.take_changed());
        assert_eq!(src.len(), 8);
    }

    #[test]
    fn lazy_source_manual_fetch() {
        let mut src = LazySource::new(MemorySource::new(vec![7; 1024]));
        assert!(!src.has_data(0, 16));
        assert_eq!(src.pending_pages(), 1);
        assert!(src.get_data(0, 16).is_err());

        src.fetch_pending();
        assert!(src.take_changed());
        assert!(src.has_data(0, 16));
        assert_eq!(src.get_data(0, 16).unwrap(), vec![7; 16]);
        // Spanning into page 1 is still missing.
        assert!(!src.has_data(250, 16));
    }

    #[test]
    fn lazy_source_latency_arrives_on_second_call() {
        let mut src = LazySource::with_latency(MemorySource::new(vec![1; 512]), 1);
        assert!(!src.has_data(0, 300));
        assert!(src.has_data(0, 300));
    }

    #[test]
    fn lazy_source_detach_stops_trying() {
        let mut src = LazySource::new(MemorySource::new(vec![0; 512]));
        src.prefetch(0, 10);
        assert!(!src.has_data(256, 1));
        src.detach();
        assert!(!src.keep_trying());
        src.fetch_pending();
        assert!(!src.has_data(256, 1));
        assert!(src.has_data(0, 10));
    }
}
